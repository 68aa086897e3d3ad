//! Error types for the deduplication engine

use bstr::BString;
use thiserror::Error;

/// Errors surfaced by a deduplication run
///
/// Every variant terminates the run. Whatever was flushed to the sink before
/// the error is valid output.
#[derive(Debug, Error)]
pub enum DedupError {
    /// Invalid configuration, detected before any record is read
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A composite key references a field the record does not have
    #[error("record {record_number} has {field_count} fields, key column {index} is out of range: {record}")]
    IndexOutOfRange {
        index: usize,
        field_count: usize,
        record_number: u64,
        record: BString,
    },

    /// Input could not be read (only fatal in strict-input mode)
    #[error("failed to read input after record {after_record}")]
    Read {
        after_record: u64,
        #[source]
        source: SourceError,
    },

    /// Accepted records could not be handed to the sink
    #[error("failed to write output")]
    Write(#[from] std::io::Error),

    /// Encoding an accepted CSV row failed
    #[error("failed to encode CSV output")]
    Csv(#[source] csv::Error),
}

// I/O failures inside the CSV writer are write errors like any other sink's
impl From<csv::Error> for DedupError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io_err) => {
                DedupError::Write(std::io::Error::new(io_err.kind(), io_err.to_string()))
            }
            _ => DedupError::Csv(err),
        }
    }
}

/// Failure reported by an input source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DedupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_csv_io_error_is_write_error() {
        let err = DedupError::from(csv::Error::from(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));

        match err {
            DedupError::Write(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected write error, got {:?}", other),
        }
    }
}

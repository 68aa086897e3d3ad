//! Output sinks
//!
//! Sinks restore each accepted record's framing and buffer the bytes until the
//! pump asks for a flush.

use crate::error::{DedupError, Result};
use crate::record::Line;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Accepts records in the same framing they were read in
pub trait RecordSink<R> {
    fn write_record(&mut self, record: &R) -> Result<()>;

    /// Hand every buffered byte to the underlying writer
    fn flush(&mut self) -> Result<()>;

    fn records_written(&self) -> u64;
}

/// Writes lines terminated by `\n`
pub struct LineSink<W: Write> {
    writer: BufWriter<W>,
    lines_written: u64,
    bytes_written: u64,
}

impl<W: Write> LineSink<W> {
    pub fn new(inner: W, buffer_size: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(buffer_size, inner),
            lines_written: 0,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| DedupError::Write(e.into_error()))
    }
}

impl<W: Write> RecordSink<Line> for LineSink<W> {
    fn write_record(&mut self, line: &Line) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        self.bytes_written += line.as_bytes().len() as u64 + 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.lines_written
    }
}

/// Writes rows re-encoded as CSV, quoting fields only where needed
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, delimiter: u8, buffer_size: usize) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .buffer_capacity(buffer_size)
            .from_writer(inner);

        Self {
            writer,
            rows_written: 0,
        }
    }

    /// Write a row that does not count as deduplicated output
    pub fn write_header(&mut self, header: &csv::ByteRecord) -> Result<()> {
        self.writer.write_byte_record(header)?;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            let err = e.error();
            DedupError::Write(io::Error::new(err.kind(), err.to_string()))
        })
    }
}

impl<W: Write> RecordSink<csv::ByteRecord> for CsvSink<W> {
    fn write_record(&mut self, row: &csv::ByteRecord) -> Result<()> {
        self.writer.write_byte_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.rows_written
    }
}

/// Open the output: a created/truncated file when a path is given, stdout
/// otherwise
pub fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            ensure_parent_dir(path)?;
            let file: File = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Create the output file's parent directory if it is missing
fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_sink() {
        let mut sink = LineSink::new(Vec::new(), 1024);
        sink.write_record(&Line::from(&b"hello"[..])).unwrap();
        sink.write_record(&Line::from(&b""[..])).unwrap();
        sink.write_record(&Line::from(&b"world"[..])).unwrap();

        assert_eq!(sink.records_written(), 3);
        assert_eq!(sink.bytes_written(), 13);
        assert_eq!(sink.into_inner().unwrap(), b"hello\n\nworld\n");
    }

    #[test]
    fn test_line_sink_buffers_until_flush() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");

        let mut sink = LineSink::new(open_output(Some(&path)).unwrap(), 1024);
        sink.write_record(&Line::from(&b"buffered"[..])).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        sink.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "buffered\n");
    }

    #[test]
    fn test_csv_sink_quotes_when_needed() {
        let mut sink = CsvSink::new(Vec::new(), b',', 1024);
        sink.write_header(&csv::ByteRecord::from(vec!["id", "name"]))
            .unwrap();
        sink.write_record(&csv::ByteRecord::from(vec!["1", "a,b"]))
            .unwrap();
        sink.write_record(&csv::ByteRecord::from(vec!["2", "plain"]))
            .unwrap();

        assert_eq!(sink.records_written(), 2);
        assert_eq!(
            String::from_utf8(sink.into_inner().unwrap()).unwrap(),
            "id,name\n1,\"a,b\"\n2,plain\n"
        );
    }

    /// Rejects every write the way a closed pipe does
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_csv_sink_reports_closed_pipe_as_write_error() {
        // a one-byte buffer forces the row through to the writer
        let mut sink = CsvSink::new(ClosedPipe, b',', 1);
        let err = sink
            .write_record(&csv::ByteRecord::from(vec!["1", "a"]))
            .unwrap_err();

        match err {
            DedupError::Write(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected write error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_output_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/out.csv");

        let mut out = open_output(Some(&path)).unwrap();
        out.write_all(b"x\n").unwrap();
        drop(out);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }
}

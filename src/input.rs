//! Input sources
//!
//! Sources hand records to the pump one at a time, refilling a buffer the pump
//! owns so nothing is allocated per record once buffers have grown.

use crate::error::SourceError;
use crate::record::{Line, Record};
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

/// Produces records until the stream ends
pub trait RecordSource {
    type Record: Record + Default;

    /// Fill `record` with the next record.
    ///
    /// Returns `Ok(false)` at a clean end of stream.
    fn read_into(&mut self, record: &mut Self::Record) -> Result<bool, SourceError>;

    /// Leading record that bypasses deduplication, if the format has one
    fn header(&mut self) -> Result<Option<Self::Record>, SourceError> {
        Ok(None)
    }
}

/// Newline-delimited text.
///
/// The `\n` terminator and a `\r` directly before it are stripped. A final
/// line without a terminator is still a record. Lines of any length are read
/// whole.
pub struct LineSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> RecordSource for LineSource<R> {
    type Record = Line;

    fn read_into(&mut self, line: &mut Line) -> Result<bool, SourceError> {
        let buf = line.buffer_mut();
        buf.clear();

        let mut read_any = false;
        loop {
            let (terminated, used) = {
                let available = match self.reader.fill_buf() {
                    Ok(available) => available,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                };
                if available.is_empty() {
                    break;
                }
                read_any = true;

                match memchr::memchr(b'\n', available) {
                    Some(i) => {
                        buf.extend_from_slice(&available[..i]);
                        (true, i + 1)
                    }
                    None => {
                        buf.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.reader.consume(used);

            if terminated {
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                return Ok(true);
            }
        }

        Ok(read_any)
    }
}

/// CSV rows parsed with the `csv` crate.
///
/// Every row must have as many fields as the first one; a row that does not is
/// reported as a read error.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    has_header: bool,
}

impl<R: Read> CsvSource<R> {
    pub fn new(reader: R, delimiter: u8, has_header: bool) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_header)
            .flexible(false)
            .from_reader(reader);

        Self { reader, has_header }
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    type Record = csv::ByteRecord;

    fn read_into(&mut self, record: &mut csv::ByteRecord) -> Result<bool, SourceError> {
        Ok(self.reader.read_byte_record(record)?)
    }

    fn header(&mut self) -> Result<Option<csv::ByteRecord>, SourceError> {
        if !self.has_header {
            return Ok(None);
        }
        let header = self.reader.byte_headers()?;
        Ok((!header.is_empty()).then(|| header.clone()))
    }
}

/// Open the input: a file when a path is given, stdin otherwise
pub fn open_input(path: Option<&Path>, buffer_size: usize) -> io::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(Box::new(BufReader::with_capacity(buffer_size, file)))
        }
        None => Ok(Box::new(BufReader::with_capacity(
            buffer_size,
            io::stdin().lock(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn read_lines<R: BufRead>(source: &mut LineSource<R>) -> Vec<Vec<u8>> {
        let mut line = Line::new();
        let mut lines = Vec::new();
        while source.read_into(&mut line).unwrap() {
            lines.push(line.as_bytes().to_vec());
        }
        lines
    }

    #[test]
    fn test_line_source() {
        let mut source = LineSource::new(Cursor::new("line1\nline2\r\n\nline3"));

        assert_eq!(
            read_lines(&mut source),
            vec![
                b"line1".to_vec(),
                b"line2".to_vec(),
                b"".to_vec(),
                b"line3".to_vec()
            ]
        );
    }

    #[test]
    fn test_line_source_empty() {
        let mut source = LineSource::new(Cursor::new(""));
        assert!(read_lines(&mut source).is_empty());
    }

    #[test]
    fn test_line_longer_than_buffer() {
        let long = "x".repeat(10_000);
        let input = format!("{long}\nshort\n");
        let mut source = LineSource::new(BufReader::with_capacity(16, Cursor::new(input)));

        let lines = read_lines(&mut source);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 10_000);
        assert_eq!(lines[1], b"short");
    }

    #[test]
    fn test_lone_carriage_return_kept_at_eof() {
        let mut source = LineSource::new(Cursor::new("a\r"));
        assert_eq!(read_lines(&mut source), vec![b"a\r".to_vec()]);
    }

    #[test]
    fn test_csv_source() {
        let mut source = CsvSource::new(Cursor::new("1,a\n2,\"b,c\"\n"), b',', false);
        let mut row = csv::ByteRecord::new();

        assert!(source.header().unwrap().is_none());
        assert!(source.read_into(&mut row).unwrap());
        assert_eq!(row, csv::ByteRecord::from(vec!["1", "a"]));
        assert!(source.read_into(&mut row).unwrap());
        assert_eq!(row, csv::ByteRecord::from(vec!["2", "b,c"]));
        assert!(!source.read_into(&mut row).unwrap());
    }

    #[test]
    fn test_csv_header() {
        let mut source = CsvSource::new(Cursor::new("id;name\n1;a\n"), b';', true);
        let mut row = csv::ByteRecord::new();

        assert_eq!(
            source.header().unwrap(),
            Some(csv::ByteRecord::from(vec!["id", "name"]))
        );
        assert!(source.read_into(&mut row).unwrap());
        assert_eq!(row, csv::ByteRecord::from(vec!["1", "a"]));
        assert!(!source.read_into(&mut row).unwrap());
    }

    #[test]
    fn test_csv_ragged_row_is_error() {
        let mut source = CsvSource::new(Cursor::new("1,a\n2\n"), b',', false);
        let mut row = csv::ByteRecord::new();

        assert!(source.read_into(&mut row).unwrap());
        assert!(matches!(
            source.read_into(&mut row),
            Err(SourceError::Csv(_))
        ));
    }

    #[test]
    fn test_open_input_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alpha").unwrap();
        writeln!(file, "beta").unwrap();

        let reader = open_input(Some(file.path()), 1024).unwrap();
        let mut source = LineSource::new(reader);

        assert_eq!(read_lines(&mut source), vec![b"alpha".to_vec(), b"beta".to_vec()]);
    }
}

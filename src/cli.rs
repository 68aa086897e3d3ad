//! Command-line interface definition for dedup-stream
//!
//! Provides argument parsing for the line and CSV deduplication commands.

use crate::error::{DedupError, Result};
use crate::fingerprint::DigestKind;
use crate::key::DEFAULT_SEPARATOR;
use crate::progress::DEFAULT_PROGRESS_EVERY;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Streaming deduplication for text lines and CSV rows
///
/// Emits every record whose key has not been seen before, in input order.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dedup-stream",
    author = "m0h1nd4",
    version,
    about = "Streaming deduplication for text lines and CSV rows",
    long_about = r#"
Reads records from stdin (or --input), writes the first occurrence of each
distinct key to stdout (or --output) and drops the rest. Input order is
preserved. Memory grows with the number of unique keys: one 16-byte digest
per unique record with the default md5 fingerprint.

EXAMPLES:
    # Unique lines, eager output when watching a terminal
    cat words.txt | dedup-stream lines

    # Unique CSV rows keyed on columns 0 and 2, with statistics
    dedup-stream -v csv 0 2 < events.csv > unique.csv

    # Keep the header row, semicolon-delimited input
    dedup-stream -i data.csv -o out.csv csv --header -d ';' 1

    # No false positives at all, at the cost of storing whole keys
    dedup-stream --digest exact lines < huge.txt
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Input file (default: stdin)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print counts, duration and throughput to stderr when done
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Show a running record count on stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub progress: bool,

    /// Records between progress updates
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: u64,

    /// Fingerprint stored per unique key
    #[arg(long, global = true, value_enum, default_value_t = DigestKind::Md5)]
    pub digest: DigestKind,

    /// Fail on input read errors instead of treating them as end of input
    #[arg(long, global = true, default_value_t = false)]
    pub strict_input: bool,

    /// Buffer size for reading and writing (e.g. "64KB", "8MB")
    #[arg(long, global = true, value_name = "SIZE", default_value = "8MB")]
    pub buffer_size: String,

    /// When to flush output
    #[arg(long, global = true, value_enum, default_value_t = FlushMode::Auto)]
    pub flush: FlushMode,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Deduplicate newline-delimited lines
    Lines,
    /// Deduplicate CSV rows on a key built from selected columns
    Csv(CsvArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CsvArgs {
    /// 0-based column numbers forming the key, in key order
    #[arg(required = true, value_name = "COLUMN")]
    pub columns: Vec<usize>,

    /// Separator placed between columns in the key
    #[arg(short, long, value_name = "SEP", default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Field delimiter of the input and output
    #[arg(short, long, value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,

    /// Copy the first row through without deduplicating it
    #[arg(long, default_value_t = false)]
    pub header: bool,
}

/// Output flushing behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlushMode {
    /// Flush every record on a terminal, buffer otherwise
    Auto,
    /// Flush after every unique record
    Always,
    /// Flush only at the end (and on the progress cadence)
    End,
}

impl Args {
    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> Result<usize> {
        parse_size(&self.buffer_size)
    }
}

impl CsvArgs {
    /// The delimiter as a single byte
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(DedupError::Config(format!(
                "CSV delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size_str: &str) -> Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(num) = size_str.strip_suffix("GB") {
        (num, 1024 * 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("MB") {
        (num, 1024 * 1024)
    } else if let Some(num) = size_str.strip_suffix("KB") {
        (num, 1024)
    } else if let Some(num) = size_str.strip_suffix('B') {
        (num, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| DedupError::Config(format!("Invalid size format: '{}'", size_str)))?;

    if num == 0 {
        return Err(DedupError::Config("Buffer size must be greater than zero".to_string()));
    }

    num.checked_mul(multiplier)
        .ok_or_else(|| DedupError::Config(format!("Size too large: '{}'", size_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_command() {
        let args = Args::try_parse_from(["dedup-stream", "-v", "lines"]).unwrap();

        assert!(matches!(args.command, Command::Lines));
        assert!(args.verbose);
        assert!(!args.progress);
        assert_eq!(args.digest, DigestKind::Md5);
        assert_eq!(args.flush, FlushMode::Auto);
        assert_eq!(args.progress_every, 100_000);
    }

    #[test]
    fn test_parse_csv_command() {
        let args = Args::try_parse_from([
            "dedup-stream",
            "csv",
            "2",
            "0",
            "2",
            "-s",
            "::",
            "-p",
            "--digest",
            "blake3",
        ])
        .unwrap();

        let Command::Csv(csv) = args.command else {
            panic!("expected csv command");
        };
        assert_eq!(csv.columns, vec![2, 0, 2]);
        assert_eq!(csv.separator, "::");
        assert_eq!(csv.delimiter_byte().unwrap(), b',');
        assert!(!csv.header);
        assert!(args.progress);
        assert_eq!(args.digest, DigestKind::Blake3);
    }

    #[test]
    fn test_csv_requires_columns() {
        assert!(Args::try_parse_from(["dedup-stream", "csv"]).is_err());
        assert!(Args::try_parse_from(["dedup-stream", "csv", "-1"]).is_err());
        assert!(Args::try_parse_from(["dedup-stream", "csv", "one"]).is_err());
    }

    #[test]
    fn test_csv_defaults() {
        let args = Args::try_parse_from(["dedup-stream", "csv", "1"]).unwrap();
        let Command::Csv(csv) = args.command else {
            panic!("expected csv command");
        };

        assert_eq!(csv.separator, "|||");
        assert_eq!(csv.delimiter, ',');
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let args = Args::try_parse_from(["dedup-stream", "csv", "-d", "§", "0"]).unwrap();
        let Command::Csv(csv) = args.command else {
            panic!("expected csv command");
        };

        assert!(matches!(csv.delimiter_byte(), Err(DedupError::Config(_))));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64MB").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("8GB").unwrap(), 8 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1024KB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert!(parse_size("0KB").is_err());
        assert!(parse_size("lots").is_err());
        assert!(matches!(
            parse_size("99999999999999GB"),
            Err(DedupError::Config(_))
        ));
    }
}

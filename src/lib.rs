//! # dedup-stream
//!
//! Streaming deduplication of text lines and CSV rows.
//!
//! ## Features
//!
//! - **First occurrence wins**: every distinct key is emitted once, in input order
//! - **Composite keys**: CSV rows keyed on any ordered selection of columns
//! - **Compact memory**: one fixed-size fingerprint per unique key (MD5 or BLAKE3),
//!   or whole keys when false positives are unacceptable
//! - **Interactive or batch**: eager flushing on a terminal, buffered output in pipes
//!
//! Memory grows with the number of unique keys for the whole run. Nothing is
//! evicted or spilled to disk.
//!
//! ## Usage
//!
//! ```bash
//! # Unique lines
//! dedup-stream lines < words.txt > unique.txt
//!
//! # Unique CSV rows keyed on columns 0 and 2
//! dedup-stream -v csv 0 2 < events.csv > unique.csv
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dedup_stream::dedup::create_deduplicator;
//! use dedup_stream::fingerprint::DigestKind;
//! use dedup_stream::input::LineSource;
//! use dedup_stream::key::{KeyExtractor, KeyMode};
//! use dedup_stream::output::LineSink;
//! use dedup_stream::progress::Reporter;
//! use dedup_stream::pump::{FlushPolicy, StreamPump};
//! use std::io::Cursor;
//!
//! let mut source = LineSource::new(Cursor::new("x\ny\nx\nz\ny\n"));
//! let mut sink = LineSink::new(Vec::new(), 4096);
//! let mut reporter = Reporter::silent("lines");
//!
//! let pump = StreamPump::new(
//!     KeyExtractor::new(KeyMode::Identity).unwrap(),
//!     create_deduplicator(DigestKind::Md5, 0),
//!     FlushPolicy::Batched { every: None },
//! );
//! let stats = pump.run(&mut source, &mut sink, &mut reporter).unwrap();
//!
//! assert_eq!(sink.into_inner().unwrap(), b"x\ny\nz\n");
//! assert_eq!((stats.total, stats.unique), (5, 3));
//! ```

pub mod cli;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod input;
pub mod key;
pub mod output;
pub mod processor;
pub mod progress;
pub mod pump;
pub mod record;

pub use cli::Args;
pub use error::{DedupError, Result};
pub use processor::{DedupConfig, Processor};

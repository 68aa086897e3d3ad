//! Stream pump
//!
//! Reads one record at a time, derives its key, checks the membership set and
//! forwards first occurrences to the sink. Single-threaded: the membership set
//! is owned by the pump and mutated from this loop only, so checking and
//! inserting a fingerprint is one step.

use crate::dedup::Deduplicator;
use crate::error::{DedupError, Result};
use crate::input::RecordSource;
use crate::key::KeyExtractor;
use crate::output::RecordSink;
use crate::progress::{Reporter, RunStats};
use crate::record::Record;
use log::{debug, warn};

/// When the sink is flushed during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// After every accepted record, for a human watching a terminal
    Eager,
    /// At end of stream, and every `every` records read if set
    Batched { every: Option<u64> },
}

/// Drives one deduplication run
///
/// A pump is consumed by [`StreamPump::run`], so its membership set lives for
/// exactly one run.
pub struct StreamPump {
    extractor: KeyExtractor,
    dedup: Box<dyn Deduplicator>,
    flush: FlushPolicy,
    strict_input: bool,
}

impl StreamPump {
    pub fn new(extractor: KeyExtractor, dedup: Box<dyn Deduplicator>, flush: FlushPolicy) -> Self {
        Self {
            extractor,
            dedup,
            flush,
            strict_input: false,
        }
    }

    /// Treat a failed read as fatal instead of as end of stream
    pub fn strict_input(mut self, strict: bool) -> Self {
        self.strict_input = strict;
        self
    }

    pub fn run<S, K>(mut self, source: &mut S, sink: &mut K, reporter: &mut Reporter) -> Result<RunStats>
    where
        S: RecordSource,
        K: RecordSink<S::Record> + ?Sized,
    {
        debug!(
            "Starting run: key {:?}, flush {:?}, strict input {}",
            self.extractor.mode(),
            self.flush,
            self.strict_input
        );

        let flush_every = match self.flush {
            FlushPolicy::Batched { every: Some(n) } if n > 0 => Some(n),
            _ => None,
        };
        let mut record = S::Record::default();

        loop {
            match source.read_into(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source_err) => {
                    let after_record = reporter.total();
                    if self.strict_input {
                        sink.flush()?;
                        return Err(DedupError::Read {
                            after_record,
                            source: source_err,
                        });
                    }
                    warn!(
                        "Input error after record {}, treating as end of stream: {}",
                        after_record, source_err
                    );
                    break;
                }
            }

            let seen = reporter.record_read();

            let key = match self.extractor.extract(&record) {
                Ok(key) => key,
                Err(missing) => {
                    sink.flush()?;
                    return Err(DedupError::IndexOutOfRange {
                        index: missing.index,
                        field_count: missing.field_count,
                        record_number: seen,
                        record: record.describe(),
                    });
                }
            };

            if !self.dedup.check_and_insert(key) {
                sink.write_record(&record)?;
                reporter.record_unique();
                if self.flush == FlushPolicy::Eager {
                    sink.flush()?;
                }
            }

            if let Some(n) = flush_every {
                if seen % n == 0 {
                    sink.flush()?;
                }
            }
        }

        sink.flush()?;

        let stats = reporter.finish(self.dedup.memory_usage());
        debug!(
            "Run finished: {} read, {} unique, {} written, {} in set",
            stats.total,
            stats.unique,
            sink.records_written(),
            self.dedup.len()
        );
        Ok(stats)
    }
}

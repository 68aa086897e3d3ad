//! Run orchestration
//!
//! Turns validated configuration into a source, a sink and a stream pump, and
//! runs them to completion.

use crate::cli::{Args, Command, FlushMode};
use crate::dedup::create_deduplicator;
use crate::error::{DedupError, Result};
use crate::fingerprint::DigestKind;
use crate::input::{open_input, CsvSource, LineSource, RecordSource};
use crate::key::{KeyExtractor, KeyMode};
use crate::output::{open_output, CsvSink, LineSink, RecordSink};
use crate::progress::{Reporter, RunStats};
use crate::pump::{FlushPolicy, StreamPump};

use log::{debug, info, warn};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

/// How input is split into records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Lines,
    Csv { delimiter: u8, header: bool },
}

impl RecordFormat {
    fn unit(&self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::Csv { .. } => "records",
        }
    }
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub format: RecordFormat,
    pub key_mode: KeyMode,
    pub digest: DigestKind,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub progress: bool,
    pub progress_every: u64,
    pub strict_input: bool,
    pub buffer_size: usize,
    pub flush: FlushMode,
}

impl DedupConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (format, key_mode) = match &args.command {
            Command::Lines => (RecordFormat::Lines, KeyMode::Identity),
            Command::Csv(csv) => (
                RecordFormat::Csv {
                    delimiter: csv.delimiter_byte()?,
                    header: csv.header,
                },
                KeyMode::composite(csv.columns.clone(), csv.separator.as_bytes()),
            ),
        };

        let config = Self {
            format,
            key_mode,
            digest: args.digest,
            input: args.input.clone(),
            output: args.output.clone(),
            verbose: args.verbose,
            progress: args.progress,
            progress_every: args.progress_every,
            strict_input: args.strict_input,
            buffer_size: args.parse_buffer_size()?,
            flush: args.flush,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that must pass before any input is read
    pub fn validate(&self) -> Result<()> {
        self.key_mode.validate()?;
        if self.progress_every == 0 {
            return Err(DedupError::Config(
                "progress interval must be at least 1".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(DedupError::Config("buffer size must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Resolve the flush mode against the actual terminals
    pub fn flush_policy(&self) -> FlushPolicy {
        let interactive = (self.output.is_none() && io::stdout().is_terminal())
            || (self.input.is_none() && io::stdin().is_terminal());
        self.flush_policy_for(interactive)
    }

    fn flush_policy_for(&self, interactive: bool) -> FlushPolicy {
        let eager = match self.flush {
            FlushMode::Always => true,
            FlushMode::End => false,
            FlushMode::Auto => interactive,
        };

        if eager {
            FlushPolicy::Eager
        } else {
            FlushPolicy::Batched {
                every: self.progress.then_some(self.progress_every),
            }
        }
    }
}

/// Main processor
pub struct Processor {
    config: DedupConfig,
}

impl Processor {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Run deduplication from the configured input to the configured output
    pub fn process(&self) -> anyhow::Result<RunStats> {
        let config = &self.config;

        let input = open_input(config.input.as_deref(), config.buffer_size).map_err(|e| {
            DedupError::Config(format!("cannot open input {:?}: {}", config.input, e))
        })?;
        let output = open_output(config.output.as_deref()).map_err(|e| {
            DedupError::Config(format!("cannot open output {:?}: {}", config.output, e))
        })?;

        let stats = match config.format {
            RecordFormat::Lines => {
                let mut source = LineSource::new(input);
                let mut sink = LineSink::new(output, config.buffer_size);
                self.run(&mut source, &mut sink)?
            }
            RecordFormat::Csv { delimiter, header } => {
                let mut source = CsvSource::new(input, delimiter, header);
                let mut sink = CsvSink::new(output, delimiter, config.buffer_size);
                match source.header() {
                    Ok(Some(header)) => {
                        debug!("Passing {}-column header through", header.len());
                        sink.write_header(&header)?;
                        self.run(&mut source, &mut sink)?
                    }
                    Ok(None) => self.run(&mut source, &mut sink)?,
                    Err(e) if config.strict_input => {
                        return Err(DedupError::Read {
                            after_record: 0,
                            source: e,
                        }
                        .into());
                    }
                    Err(e) => {
                        warn!("Input error reading header, treating as end of stream: {}", e);
                        sink.flush()?;
                        self.finish_empty()
                    }
                }
            }
        };

        Ok(stats)
    }

    fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<RunStats>
    where
        S: RecordSource,
        K: RecordSink<S::Record>,
    {
        let config = &self.config;
        let flush = config.flush_policy();

        info!(
            "Deduplicating {} with {} fingerprints",
            config.format.unit(),
            config.digest
        );

        let pump = StreamPump::new(
            KeyExtractor::new(config.key_mode.clone())?,
            create_deduplicator(config.digest, 0),
            flush,
        )
        .strict_input(config.strict_input);

        let mut reporter = Reporter::new(config.progress, config.progress_every, config.format.unit());
        let stats = pump.run(source, sink, &mut reporter)?;

        if config.verbose {
            reporter.print_summary(&stats);
        }

        Ok(stats)
    }

    /// Statistics for a run that ended before its first record
    fn finish_empty(&self) -> RunStats {
        let config = &self.config;
        let reporter = Reporter::new(false, config.progress_every, config.format.unit());
        let stats = reporter.finish(0);

        if config.verbose {
            reporter.print_summary(&stats);
        }

        stats
    }
}

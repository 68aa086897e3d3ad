//! Progress display and run statistics
//!
//! Everything here writes to stderr. stdout carries deduplicated output only.

use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Records between progress updates unless configured otherwise
pub const DEFAULT_PROGRESS_EVERY: u64 = 100_000;

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Final counters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Records read from the source
    pub total: u64,
    /// Records written to the sink
    pub unique: u64,
    pub elapsed: Duration,
    /// Approximate bytes held by the membership set at the end of the run
    pub memory_usage: usize,
}

impl RunStats {
    pub fn duplicates(&self) -> u64 {
        self.total - self.unique
    }

    /// Records per second, `None` when no measurable time has passed
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            Some(self.total as f64 / secs)
        } else {
            None
        }
    }
}

/// Observes the pump: counts records, draws progress, prints the summary
pub struct Reporter {
    bar: ProgressBar,
    every: u64,
    unit: &'static str,
    total: u64,
    unique: u64,
    start_time: Instant,
}

impl Reporter {
    /// `unit` names the records in messages ("lines", "records")
    pub fn new(show_progress: bool, every: u64, unit: &'static str) -> Self {
        let bar = if show_progress {
            create_counter_spinner()
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            every: every.max(1),
            unit,
            total: 0,
            unique: 0,
            start_time: Instant::now(),
        }
    }

    /// Reporter that never draws, for library use and tests
    pub fn silent(unit: &'static str) -> Self {
        Self::new(false, DEFAULT_PROGRESS_EVERY, unit)
    }

    /// Count a record read from the source; returns the running total
    #[inline]
    pub fn record_read(&mut self) -> u64 {
        self.total += 1;
        if self.total % self.every == 0 {
            self.bar
                .set_message(format!("Read {} {}", format_number(self.total), self.unit));
        }
        self.total
    }

    /// Count a record accepted as unique
    #[inline]
    pub fn record_unique(&mut self) {
        self.unique += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Close the progress line and freeze the counters
    pub fn finish(&self, memory_usage: usize) -> RunStats {
        if !self.bar.is_hidden() {
            self.bar.finish_with_message(format!(
                "Read {} {}",
                format_number(self.total),
                self.unit
            ));
        }

        RunStats {
            total: self.total,
            unique: self.unique,
            elapsed: self.start_time.elapsed(),
            memory_usage,
        }
    }

    /// Print final statistics
    pub fn print_summary(&self, stats: &RunStats) {
        let throughput = format_throughput(stats, self.unit);

        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("  {} {}", "Records read:   ".green(), format_number(stats.total));
        eprintln!(
            "  {} {}",
            "Unique output:  ".green().bold(),
            format_number(stats.unique).green().bold()
        );
        eprintln!(
            "  {} {}",
            "Duplicates:     ".yellow(),
            format_number(stats.duplicates())
        );
        eprintln!();
        eprintln!("  {} {}", "Duration:       ".green(), format_duration(stats.elapsed));
        eprintln!("  {} {}", "Throughput:     ".green(), throughput);
        eprintln!(
            "  {} {}",
            "Seen-set memory:".green(),
            ByteSize(stats.memory_usage as u64)
        );
        eprintln!("{}", "═".repeat(60).green());
    }
}

/// Spinner on stderr showing the running record count
fn create_counter_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();

    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );

    pb
}

/// Format records per second, `inf` when no measurable time has passed
pub fn format_throughput(stats: &RunStats, unit: &str) -> String {
    match stats.throughput() {
        Some(rate) => format!("{:.2} {}/sec", rate, unit),
        None => format!("inf {}/sec", unit),
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.3}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_reporter_counts() {
        let mut reporter = Reporter::silent("lines");

        assert_eq!(reporter.record_read(), 1);
        reporter.record_unique();
        assert_eq!(reporter.record_read(), 2);

        let stats = reporter.finish(0);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unique, 1);
        assert_eq!(stats.duplicates(), 1);
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let stats = RunStats {
            total: 0,
            unique: 0,
            elapsed: Duration::ZERO,
            memory_usage: 0,
        };

        assert_eq!(stats.throughput(), None);
        assert_eq!(format_throughput(&stats, "lines"), "inf lines/sec");
        Reporter::silent("lines").print_summary(&stats);
    }

    #[test]
    fn test_throughput() {
        let stats = RunStats {
            total: 500,
            unique: 100,
            elapsed: Duration::from_secs(2),
            memory_usage: 0,
        };

        assert_eq!(stats.throughput(), Some(250.0));
        assert_eq!(format_throughput(&stats, "records"), "250.00 records/sec");
    }

    #[test]
    fn test_zero_cadence_clamped() {
        let mut reporter = Reporter::new(false, 0, "records");
        assert_eq!(reporter.record_read(), 1);
    }
}

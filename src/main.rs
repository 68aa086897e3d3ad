//! dedup-stream - streaming deduplication of lines and CSV rows
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use dedup_stream::cli::{Args, Command};
use dedup_stream::processor::{DedupConfig, Processor, RecordFormat};
use dedup_stream::progress::{print_error, print_header, print_info};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging, RUST_LOG still wins when set
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // Validate arguments and build the run configuration
    let config = DedupConfig::from_args(&args)?;

    // Show configuration
    if args.verbose && !args.quiet {
        print_config(&args, &config);
    }

    Processor::new(config).process()?;

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &DedupConfig) {
    print_header("Configuration");

    print_info(&format!(
        "Input:        {}",
        config
            .input
            .as_ref()
            .map_or("stdin".to_string(), |p| format!("{:?}", p))
    ));
    print_info(&format!(
        "Output:       {}",
        config
            .output
            .as_ref()
            .map_or("stdout".to_string(), |p| format!("{:?}", p))
    ));

    match (&args.command, config.format) {
        (Command::Csv(csv), RecordFormat::Csv { header, .. }) => {
            print_info(&format!("Key columns:  {:?}", csv.columns));
            print_info(&format!("Separator:    {:?}", csv.separator));
            print_info(&format!("Delimiter:    {:?}", csv.delimiter));
            print_info(&format!("Header:       {}", header));
        }
        _ => print_info("Key:          whole line"),
    }

    print_info(&format!("Fingerprint:  {}", config.digest));
    print_info(&format!("Flush:        {:?}", config.flush_policy()));
    print_info(&format!("Strict input: {}", config.strict_input));
    print_info(&format!("Buffer size:  {} KB", config.buffer_size / 1024));
}

//! CAN Log Extractor CLI Application
//!
//! Command-line front end for the can-log-extractor library:
//! - Parses an ASC-style text log in any supported dialect
//! - Prints summary statistics and the dictionary cross-reference
//! - Decodes frames whose IDs the DBC file knows
//! - Exports the normalized frame table as CSV

use anyhow::{Context, Result};
use can_log_extractor::Session;
use clap::Parser;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};
use report::Report;

/// CAN Log Extractor - Normalize, summarize and decode text CAN logs
#[derive(Parser, Debug)]
#[command(name = "can-log-cli")]
#[command(about = "Normalize, summarize and decode ASC-style CAN logs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the text log file (.asc/.txt)
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to a DBC file used for cross-reference and decoding
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Write the normalized frame table to this CSV file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print per-ID frame counts
    #[arg(long)]
    frequency: bool,

    /// Number of decoded rows to print
    #[arg(long, value_name = "COUNT")]
    decoded: Option<usize>,

    /// Maximum number of frames to parse
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Log Extractor CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using extractor library v{}", can_log_extractor::VERSION);

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    let config = merge_args(config, &args);

    let Some(log_path) = config.input.log.clone() else {
        println!("CAN Log Extractor - No input specified");
        println!("\nQuick Start:");
        println!("  can-log-cli --log trace.asc");
        println!("  can-log-cli --log trace.asc --dbc powertrain.dbc --csv frames.csv");
        println!("\nUse --help for more options");
        return Ok(());
    };

    run(&config, &log_path)
}

/// Command-line flags override the configuration file
fn merge_args(mut config: AppConfig, args: &Args) -> AppConfig {
    if args.log.is_some() {
        config.input.log = args.log.clone();
    }
    if args.dbc.is_some() {
        config.input.dbc = args.dbc.clone();
    }
    if args.csv.is_some() {
        config.output.csv = args.csv.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.frequency {
        config.output.frequency = true;
    }
    if let Some(n) = args.decoded {
        config.output.decoded_rows = n;
    }
    if args.max_frames.is_some() {
        config.parser.max_frames = args.max_frames;
    }
    config
}

fn run(config: &AppConfig, log_path: &Path) -> Result<()> {
    let mut session = Session::with_config(config.parser.clone());

    session
        .load_log(log_path)
        .with_context(|| format!("Cannot analyze {:?}", log_path))?;

    // A broken dictionary disables decoding, it does not stop the run
    if let Some(dbc_path) = &config.input.dbc {
        if let Err(e) = session.load_dictionary(dbc_path) {
            log::debug!("Decoding disabled for {:?}: {}", dbc_path, e);
        }
    }

    let report = Report::collect(&session, config.output.decoded_rows, config.output.frequency);
    match config.output.format {
        OutputFormat::Txt => print!("{}", report.render_txt()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }

    if let Some(csv_path) = &config.output.csv {
        session
            .export_csv(csv_path)
            .with_context(|| format!("Failed to write {:?}", csv_path))?;
        log::info!("Frame table written to {:?}", csv_path);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

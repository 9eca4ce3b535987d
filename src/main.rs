use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use debugstrip::logging::init_tracing;
use debugstrip::{strip_file, StripConfig, StripError, StripOutcome};
use tracing::debug;

/// Zero out the debug directory of a PE image.
///
/// The result is written next to the input as `<name>_stripped<.ext>`.
#[derive(Parser, Debug)]
#[command(name = "debugstrip")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// PE image to strip
    binary: PathBuf,
}

fn run(cli: &Cli) -> Result<StripOutcome> {
    let outcome = strip_file(&cli.binary, &StripConfig::default())
        .with_context(|| format!("Failed to strip {}", cli.binary.display()))?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        let report = serde_json::to_string(&outcome.plan)?;
        debug!(report = %report, "Redaction report");
    }
    Ok(outcome)
}

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            debug!(error = %e, "Invalid command line");
            eprintln!("{}", StripError::Usage);
            return ExitCode::from(2);
        }
    };

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

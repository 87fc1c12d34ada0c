use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// classlint CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "classlint",
    version,
    about = "Scan compiled-class corpora for API-misuse bugs",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan class documents or directories of them.
    Scan(ScanArgs),

    /// List available detectors.
    ListDetectors,

    /// Explain a detector.
    Explain {
        /// Detector name.
        detector: String,
    },
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ScanArgs {
    /// Class documents or directories to scan.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Explicit config file (default: nearest classlint.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only run these detectors (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip these detectors (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Exit with code 1 if any diagnostics are emitted.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dupescout")]
#[command(about = "Find probable duplicate media files by filename pattern", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree and write a duplicate-candidate report
    Scan(ScanArgs),
    /// Print a stored scan report
    Show(ShowArgs),
    /// Record a keep/delete decision for one group in a report
    Decide(DecideArgs),
    /// Remove old scan reports
    Prune(PruneArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored group summary
    Human,
    /// The ScanReport document on stdout
    Json,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory to scan
    pub root: PathBuf,

    /// Only consider direct children of the root
    #[arg(long)]
    pub no_recursive: bool,

    /// Extension allow-list override, e.g. --extensions jpg,png,heic
    #[arg(long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Report destination (default: <report_dir>/scan-<timestamp>.json)
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// List every member of every group
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Path to a stored scan report
    pub report: PathBuf,

    /// List every member of every group
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Debug, Args)]
pub struct DecideArgs {
    /// Path to a stored scan report
    pub report: PathBuf,

    /// Group id the decision applies to
    #[arg(long)]
    pub group: String,

    /// Member path to keep
    #[arg(long)]
    pub keep: PathBuf,

    /// Member paths to mark for deletion (repeatable; omit to keep all)
    #[arg(long = "delete")]
    pub delete: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Directory holding scan reports (default: configured report_dir)
    pub dir: Option<PathBuf>,

    /// Age threshold in days
    #[arg(long, default_value_t = 30)]
    pub older_than_days: i64,

    /// Also remove reports with unresolved decisions
    #[arg(long)]
    pub force: bool,
}

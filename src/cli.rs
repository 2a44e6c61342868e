use clap::Parser;
use std::path::PathBuf;

/// Split a web request log into per-client sessions
#[derive(Parser, Debug)]
#[command(
    name = "sessionize",
    about = "Split a web request log into per-client sessions"
)]
pub struct Cli {
    /// Path to the comma-separated request log (header row first).
    pub input: PathBuf,

    /// Path to a file whose first line is the inactivity period in seconds.
    pub inactivity_period: PathBuf,

    /// Where to write the closed sessions.
    /// Default: ./output/sessionization.txt
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log each closing batch to stderr.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

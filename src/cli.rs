use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hooklens", about = "Transcript hook analysis service", version)]
pub struct Cli {
    /// Address to listen on (host:port)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Chat model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Record token counts and estimated cost to the usage log
    #[arg(long)]
    pub log_usage: bool,

    /// Write usage records to this file instead of token-usage.md
    #[arg(long)]
    pub usage_log: Option<PathBuf>,

    /// Show configuration details on startup
    #[arg(short, long)]
    pub verbose: bool,
}

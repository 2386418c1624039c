//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Narrate scripts with synchronized captions.
#[derive(Debug, Parser)]
#[command(name = "narrator")]
#[command(about = "Narrate scripts with synchronized captions", version)]
pub struct Cli {
    /// Settings file (JSON); defaults apply when omitted
    #[arg(short, long, global = true, env = "NARRATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

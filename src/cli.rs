use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvwatch")]
#[command(author, version, about = "Watch a directory and import new CSV files")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the watch directory and import new CSV files until interrupted
    Watch {
        /// Directory to watch (overrides config)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Delay between poll cycles in milliseconds (overrides config)
        #[arg(short, long)]
        delay_ms: Option<u64>,
    },

    /// Convert a single CSV file to JSON
    Import {
        /// CSV file to convert
        #[arg(required = true)]
        file: PathBuf,

        /// Write <name>.json next to the input instead of printing
        #[arg(long)]
        write: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

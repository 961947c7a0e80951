use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tubecast")]
#[command(author, version, about = "Telegram bot that turns YouTube links into audio files")]
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
    /// Start the bot and poll Telegram for messages
    Start,

    /// Split a local audio file into parts under the size limit
    Split {
        /// Audio file to split (removed if it is split)
        #[arg(required = true)]
        file: PathBuf,

        /// Override the per-part size limit, in bytes
        #[arg(long)]
        max_size: Option<u64>,
    },

    /// Print the duration of a media file as reported by ffprobe
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

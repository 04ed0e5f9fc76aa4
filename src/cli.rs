use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keepsake")]
#[command(author, version, about = "Self-hosted wedding photo and video gallery server")]
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
    /// Start the gallery server
    Start {
        /// Host to bind to (overrides config and KEEPSAKE_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and KEEPSAKE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Check the upload directory and summarize what can be served
    CheckStorage,

    /// Generate a random event token for guest links
    GenerateToken,

    /// Display version information
    Version,
}

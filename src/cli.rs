use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "silkconv")]
#[command(author, version, about = "Convert audio to SILK v3 voice files")]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `start`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (and the watch loop if enabled)
    Start {
        /// Host to bind to [default: 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on [default: $PORT or 9527]
        #[arg(short, long)]
        port: Option<u16>,

        /// Start the folder watch loop at boot
        #[arg(long)]
        watch: bool,
    },

    /// Convert a single file and exit
    Convert {
        /// Audio file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Output path [default: input with a .silk extension]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

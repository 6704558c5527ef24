pub mod ask;
pub mod init;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A3S Chat - HTTP and SSE gateway for an LLM-backed assistant
#[derive(Debug, Parser)]
#[command(name = "a3s-chat", version, about)]
pub struct Cli {
    /// Path to the configuration file (default: ~/.a3s/chat/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host address to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Send one message to the configured model and print the reply
    Ask {
        /// Message to send
        message: String,

        /// Print the reply incrementally as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Arguments for running both loops in one process.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Override the configured transport between front door and decoder
    #[arg(short, long, value_enum)]
    pub transport: Option<TransportArg>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Transport argument for `serve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// Loopback UDP datagrams
    Udp,
    /// In-process queue
    Channel,
}

impl From<TransportArg> for crate::relay::Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Udp => Self::Udp,
            TransportArg::Channel => Self::Channel,
        }
    }
}

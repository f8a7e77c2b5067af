//! CLI module for Delve
//!
//! Command-line parsing for the delve-server binary. Uses clap for arguments
//! and owo-colors for terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Delve - deep research server
///
/// Plans web searches for a question, runs them concurrently and writes a
/// chart-illustrated markdown report.
#[derive(Parser, Debug)]
#[command(
    name = "delve-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Delve - deep research server",
    long_about = "Plans web searches for a question, runs them concurrently and writes a\n\
                  chart-illustrated markdown report, over HTTP, SSE or the terminal.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  delve-server                              # Start the server (requires delve.toml)\n    \
                  delve-server --config my.toml serve       # Use a custom config file\n    \
                  delve-server research \"solar tariffs\"     # Research from the terminal\n    \
                  delve-server research --stream \"...\"      # Print progress as it happens\n    \
                  delve-server check                        # Validate the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "delve.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run one research query and print the report
    Research {
        /// The question to research
        query: String,

        /// Print pipeline events as they arrive
        #[arg(short, long)]
        stream: bool,

        /// Browse pages suggested by the planner
        #[arg(short, long)]
        browse: bool,
    },

    /// Validate the configuration and print a summary
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `roster` binary.
#[derive(Debug, Parser)]
#[command(
    name = "roster",
    version,
    about = "Roster - Telegram record intake over a Google spreadsheet"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of ./roster.toml
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the bot until interrupted (default).
    #[default]
    Run,
    /// Print the tables of the configured spreadsheet.
    Tables,
    /// Create the built-in Students, Teachers and StudentProgress tables.
    Provision,
    /// Print the effective configuration with secrets redacted.
    Config,
}

impl Cli {
    /// Log level implied by `--quiet`/`--verbose`, if either was given.
    #[must_use]
    pub const fn level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else if self.verbose {
            Some("debug")
        } else {
            None
        }
    }
}

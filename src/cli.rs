//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use archive_override::output::OutputConfig;

/// Archive Override - replace git_override with pinned archive_override
#[derive(Parser, Debug)]
#[command(name = "archive-override")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a MODULE.bazel for git_override declarations and detect submodules
    Scan(commands::scan::ScanArgs),

    /// Package tools with submodules and compute integrity hashes
    Package(commands::package::PackageArgs),

    /// Render release notes with archive_override snippets
    Notes(commands::notes::NotesArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Scan(args) => commands::scan::execute(args, &output),
            Commands::Package(args) => commands::package::execute(args, &output),
            Commands::Notes(args) => commands::notes::execute(args),
        }
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

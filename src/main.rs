//! # Archive Override CLI
//!
//! Binary entry point for the `archive-override` command-line tool. It parses
//! arguments with `clap`, sets up logging and hands off to the command
//! implementations, which are thin wrappers over the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}

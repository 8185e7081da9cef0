//! Reelbot CLI entry point
//!
//! Parses command-line arguments and dispatches to the command
//! implementations in [`reelbot::cli`]. Errors are printed in a
//! user-facing format and turn into a non-zero exit code.

use clap::Parser;
use colored::Colorize;
use reelbot::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

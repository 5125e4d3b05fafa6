//! Vitrine - local preview compiler and server for storefront themes and
//! extensions.

mod cli;
mod compiler;
mod config;
mod context;
mod core;
mod descriptor;
mod logger;
mod server;
mod unit;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::List => cli::list::list_units(&cli),
        Commands::Compile { selection } => cli::compile::compile_units(&cli, selection),
        Commands::Serve {
            selection,
            interface,
            port,
            watch,
        } => cli::serve::serve_units(&cli, selection, *interface, *port, *watch),
    }
}

//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Local preview compiler and server for storefront themes and extensions
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Project folder containing `deploy.xml` (default: current directory)
    #[arg(short = 'P', long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub project: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the themes and extensions found in the project
    #[command(visible_alias = "l")]
    List,

    /// Compile the selected units into the output root
    #[command(visible_alias = "c")]
    Compile {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Compile, then serve the output root (and recompile on change)
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable file watching for recompilation
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

/// Theme and extensions to compile, shared by Compile and Serve.
#[derive(clap::Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Theme identifier (manifest file name without `.xml`)
    #[arg(short, long)]
    pub theme: String,

    /// Extension identifiers, in the order they are layered
    #[arg(short, long = "extension", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Minify script and stylesheet bundles
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

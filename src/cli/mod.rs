//! Command-line interface module.

mod args;
mod common;
pub mod compile;
pub mod list;
pub mod serve;

pub use args::{Cli, Commands, SelectionArgs};

//! Core types - pure abstractions shared across the codebase.

mod kind;
mod state;

pub use kind::ResourceKind;
pub use state::{is_shutdown, register_shutdown, setup_shutdown_handler};

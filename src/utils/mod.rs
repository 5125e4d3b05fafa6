//! Utility modules shared by the compilers and the server.

pub mod mime;
pub mod path;

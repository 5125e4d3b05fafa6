//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 7777                 # HTTP port number
//! watch = true                # Recompile on source changes
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server reachable from other devices.

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

/// Local server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// First port tried; the next free one is used when taken.
    pub port: u16,

    /// Watch the source root and recompile on change.
    pub watch: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 7777,
            watch: true,
        }
    }
}

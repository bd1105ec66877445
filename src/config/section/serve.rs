//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! reload_port = 35729         # WebSocket port for live reload
//! cors = true                 # Send Access-Control-Allow-Origin: *
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.
//! Busy ports are retried upward, so the bound ports may differ.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Live reload WebSocket port number.
    pub reload_port: u16,

    /// Permit cross-origin requests.
    pub cors: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            reload_port: 35729,
            cors: true,
        }
    }
}

impl ServeConfig {
    pub(in crate::config) fn validate(&self) -> Result<(), ConfigError> {
        if self.port != 0 && self.port == self.reload_port {
            return Err(ConfigError::Validation(format!(
                "[serve] port and reload_port are both {}",
                self.port
            )));
        }
        Ok(())
    }
}

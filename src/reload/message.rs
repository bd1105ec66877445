//! Hot Reload Message Protocol
//!
//! JSON messages sent from the development server to browser clients.
//!
//! - `connected`: Handshake acknowledgement
//! - `reload`: Full page reload
//! - `css`: Refresh one stylesheet in place, keeping page state

use serde::{Deserialize, Serialize};

/// Hot reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Connection established
    Connected,

    /// Full page reload
    Reload,

    /// Stylesheet changed
    Css {
        /// URL path of the stylesheet (e.g., "/css/style.min.css")
        path: String,
    },
}

impl HotReloadMessage {
    pub fn css(path: impl Into<String>) -> Self {
        Self::Css { path: path.into() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

//! Live reload: WebSocket hub and message protocol.

mod message;
mod server;

pub use message::HotReloadMessage;
pub use server::ReloadHub;

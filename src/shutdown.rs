//! Ctrl+C handling for the development pipeline.
//!
//! The first Ctrl+C asks the watcher to stop, after which the server is
//! unblocked and reload clients are closed. A second one exits at once.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use tokio::sync::watch;

static REQUESTED: AtomicBool = AtomicBool::new(false);

/// Exit status of a second Ctrl+C (128 + SIGINT).
const FORCED_EXIT: i32 = 130;

/// Install the handler; the receiver turns `true` on Ctrl+C.
pub fn install() -> Result<watch::Receiver<bool>> {
    let (tx, rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        if REQUESTED.swap(true, Ordering::SeqCst) || tx.send(true).is_err() {
            std::process::exit(FORCED_EXIT);
        }
        crate::log!("serve"; "shutting down...");
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(rx)
}

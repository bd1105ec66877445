//! Source watcher for the development pipeline.
//!
//! ```text
//! notify → bridge thread → WatchRegistry (pattern → task) → task run → reload
//! ```
//!
//! Each matching registration re-runs its task on the event loop. Runs of
//! the same task are serialized through a per-task lock, so two quick saves
//! never write one output concurrently; different tasks interleave freely.

mod registry;

#[cfg(test)]
mod tests;

pub use registry::WatchRegistry;

use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinSet;

use crate::logger::{status_error, status_success};
use crate::task::{self, TaskContext, TaskKind};

/// Watches the source root and re-runs the tasks whose patterns match.
pub struct SourceWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    dispatcher: Dispatcher,
}

impl SourceWatcher {
    /// Start watching immediately; events buffer until [`run`](Self::run).
    pub fn new(ctx: TaskContext) -> Result<Self> {
        let registry = WatchRegistry::from_config(&ctx.config)?;

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        let root = registry.watch_root().to_path_buf();
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        crate::log!("watch"; "watching {}", ctx.config.root_relative(&root).display());

        Ok(Self {
            notify_rx,
            watcher,
            dispatcher: Dispatcher {
                ctx,
                registry,
                locks: FxHashMap::default(),
            },
        })
    }

    /// Dispatch events until `shutdown` turns true, then wait for in-flight runs.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        // Extract fields before consuming self
        let notify_rx = self.notify_rx;
        let _watcher = self.watcher;
        let mut dispatcher = self.dispatcher;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut runs = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(event) = async_rx.recv() => dispatcher.dispatch(&event, &mut runs),
                Some(_) = runs.join_next(), if !runs.is_empty() => {}
                else => break,
            }
        }

        while runs.join_next().await.is_some() {}
        crate::debug!("watch"; "stopped");
    }
}

/// Maps events to task runs.
struct Dispatcher {
    ctx: TaskContext,
    registry: WatchRegistry,
    locks: FxHashMap<TaskKind, Arc<Mutex<()>>>,
}

impl Dispatcher {
    fn dispatch(&mut self, event: &notify::Event, runs: &mut JoinSet<()>) {
        for index in self.registry.triggered(event) {
            let Some(registration) = self.registry.get(index) else {
                continue;
            };
            crate::debug!("watch"; "{:?} {:?} -> {}", event.kind, event.paths, registration.task);

            let lock = Arc::clone(self.locks.entry(registration.task).or_default());
            let ctx = self.ctx.clone();
            let (kind, reload) = (registration.task, registration.reload);
            runs.spawn(async move {
                let _guard = lock.lock().await;
                rerun(kind, reload, &ctx).await;
            });
        }
    }
}

/// Run one task for a change; failures are reported and never end watching.
async fn rerun(kind: TaskKind, reload: bool, ctx: &TaskContext) {
    match task::run(kind, ctx).await {
        Ok(report) => {
            if reload && let Some(session) = ctx.session() {
                session.reload();
            }
            status_success(&report.to_string());
        }
        Err(err) => status_error(&format!("{kind} failed"), &err.to_string()),
    }
}

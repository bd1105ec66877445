//! Pipeline composer.
//!
//! ```text
//! build:  clean → copy → optimizeImages → { html styles scripts svg sprite createWebp }
//! dev:    clean → copy → copyImages     → { ...same... } → serve → watch
//! ```
//!
//! Stages wait for the previous one; the tasks of the last stage run
//! concurrently in no particular order.

mod graph;

#[cfg(test)]
mod tests;

pub use graph::{FailurePolicy, GraphError, PipelineError, TaskGraph};

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::config::SiteConfig;
use crate::serve::ServerSession;
use crate::task::{TaskContext, TaskKind, TaskReport};
use crate::utils::plural::plural_count;
use crate::watch::SourceWatcher;

/// Tasks of the last stage, all depending on the image stage.
const ASSET_TASKS: [TaskKind; 6] = [
    TaskKind::Html,
    TaskKind::Styles,
    TaskKind::Scripts,
    TaskKind::Svg,
    TaskKind::Sprite,
    TaskKind::CreateWebp,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Production: images are re-encoded, any error fails the build.
    Build,
    /// Development: images are copied, transform errors are reported only.
    Dev,
}

impl Mode {
    fn image_task(self) -> TaskKind {
        match self {
            Self::Build => TaskKind::OptimizeImages,
            Self::Dev => TaskKind::CopyImages,
        }
    }

    fn policy(self) -> FailurePolicy {
        match self {
            Self::Build => FailurePolicy::Strict,
            Self::Dev => FailurePolicy::Tolerant,
        }
    }
}

/// The task graph of a pipeline.
pub fn graph(mode: Mode) -> TaskGraph {
    let images = mode.image_task();
    let mut graph = TaskGraph::new();
    graph
        .add(TaskKind::Clean, &[])
        .add(TaskKind::Copy, &[TaskKind::Clean])
        .add(images, &[TaskKind::Copy]);
    for kind in ASSET_TASKS {
        graph.add(kind, &[images]);
    }
    graph
}

/// Run the build stages of `mode` once.
pub async fn run(mode: Mode, ctx: &TaskContext) -> Result<Vec<TaskReport>, PipelineError> {
    graph(mode).run(ctx, mode.policy()).await
}

/// Production pipeline.
pub async fn build(config: Arc<SiteConfig>) -> Result<()> {
    let started = Instant::now();
    let build_dir = config.root_relative(config.build_dir());
    let reports = run(Mode::Build, &TaskContext::new(config))
        .await
        .context("build failed")?;

    let written = reports.iter().map(|r| r.written).sum();
    crate::log!(
        "build";
        "{} written to {} in {:.2?}",
        plural_count(written, "file"),
        build_dir.display(),
        started.elapsed()
    );
    Ok(())
}

/// Development pipeline: build, serve with live reload, watch until `shutdown`.
pub async fn dev(config: Arc<SiteConfig>, shutdown: watch::Receiver<bool>) -> Result<()> {
    run(Mode::Dev, &TaskContext::new(Arc::clone(&config)))
        .await
        .context("initial build failed")?;

    let session = Arc::new(ServerSession::start(&config)?);
    crate::log!("serve"; "http://{} (live reload on port {})", session.addr(), session.reload_port());
    let ctx = TaskContext::new(config).with_session(Arc::clone(&session));
    let watcher = SourceWatcher::new(ctx)?;
    watcher.run(shutdown).await;

    session.stop();
    crate::log!("serve"; "stopped");
    Ok(())
}

//! Pipeline tasks.
//!
//! A task reads a [`FileSet`](crate::source::FileSet), applies a fixed chain
//! of transformations and writes below the build root. Every task is an
//! async function returning `Result<TaskReport, TaskError>`; CPU-bound
//! transforms run on tokio's blocking pool.
//!
//! | Task             | Input                              | Output                      |
//! |------------------|------------------------------------|-----------------------------|
//! | `clean`          | build root                         | (deleted)                   |
//! | `copy`           | `[copy]` fonts and favicons        | verbatim copies             |
//! | `optimizeImages` | `[images]` raster set              | re-encoded copies           |
//! | `copyImages`     | `[images]` raster set              | verbatim copies             |
//! | `createWebp`     | `[images]` raster set              | `<name>.webp` siblings      |
//! | `styles`         | `[styles] entry`                   | `[styles] output`           |
//! | `html`           | `[html]` markup                    | collapsed markup            |
//! | `scripts`        | `[scripts]` scripts                | minified scripts            |
//! | `svg`            | `[svg]` standalone vectors         | optimized vectors           |
//! | `sprite`         | `[sprite]` icons                   | `[sprite] output`           |

mod assets;
mod clean;
mod images;
mod styles;
mod vector;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::SiteConfig;
use crate::serve::ServerSession;
use crate::source::{FileSet, SourceError};
use crate::transform::TransformError;
use crate::utils::plural::plural_count;

// ============================================================================
// Task identity
// ============================================================================

/// Every task the pipelines and the watcher can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Clean,
    Copy,
    OptimizeImages,
    CopyImages,
    CreateWebp,
    Styles,
    Html,
    Scripts,
    Svg,
    Sprite,
}

impl TaskKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Copy => "copy",
            Self::OptimizeImages => "optimizeImages",
            Self::CopyImages => "copyImages",
            Self::CreateWebp => "createWebp",
            Self::Styles => "styles",
            Self::Html => "html",
            Self::Scripts => "scripts",
            Self::Svg => "svg",
            Self::Sprite => "sprite",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Error)]
pub enum TaskError {
    /// A processor rejected one input file.
    #[error("{}: {source}", path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source path not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

impl TaskError {
    /// Transform errors are recoverable in watch mode and the dev build.
    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn transform(path: &Path, source: TransformError) -> Self {
        Self::Transform {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<SourceError> for TaskError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Pattern { pattern, message } => Self::Pattern { pattern, message },
            SourceError::Missing(path) => Self::MissingSource(path),
            SourceError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Outcome of one successful task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskReport {
    pub kind: TaskKind,
    /// Files written (or removed trees, for `clean`).
    pub written: usize,
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, plural_count(self.written, "file"))
    }
}

// ============================================================================
// Context
// ============================================================================

/// Shared, cheaply cloned state handed to every task run.
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<SiteConfig>,
    session: Option<Arc<ServerSession>>,
}

impl TaskContext {
    pub fn new(config: Arc<SiteConfig>) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Attach the dev server so tasks can signal connected browsers.
    pub fn with_session(mut self, session: Arc<ServerSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&ServerSession> {
        self.session.as_deref()
    }

    fn files(&self, include: &[String], exclude: &[String]) -> Result<FileSet, TaskError> {
        Ok(FileSet::resolve(&self.config.source_dir(), include, exclude)?)
    }
}

/// Run one task to completion.
pub async fn run(kind: TaskKind, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
    crate::debug!("task"; "start {}", kind);
    let written = match kind {
        TaskKind::Clean => clean::run(ctx).await?,
        TaskKind::Copy => assets::copy(ctx).await?,
        TaskKind::OptimizeImages => images::optimize(ctx).await?,
        TaskKind::CopyImages => images::copy(ctx).await?,
        TaskKind::CreateWebp => images::webp(ctx).await?,
        TaskKind::Styles => styles::run(ctx).await?,
        TaskKind::Html => assets::html(ctx).await?,
        TaskKind::Scripts => assets::scripts(ctx).await?,
        TaskKind::Svg => vector::svg(ctx).await?,
        TaskKind::Sprite => vector::sprite(ctx).await?,
    };
    let report = TaskReport { kind, written };
    crate::debug!("task"; "done {}", report);
    Ok(report)
}

// ============================================================================
// I/O helpers
// ============================================================================

async fn read(path: &Path) -> Result<Vec<u8>, TaskError> {
    tokio::fs::read(path).await.map_err(|e| TaskError::io(path, e))
}

/// Write a file, creating parent directories.
async fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::io(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| TaskError::io(path, e))
}

/// Copy a file byte-for-byte, creating parent directories.
async fn copy_file(from: &Path, to: &Path) -> Result<(), TaskError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::io(parent, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| TaskError::io(from, e))
}

/// Run a CPU-bound transform off the event loop.
async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => value,
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}

//! Output tree removal.

use std::io::ErrorKind;

use super::{TaskContext, TaskError};

/// Delete the build root. A missing root is already clean.
pub(super) async fn run(ctx: &TaskContext) -> Result<usize, TaskError> {
    let build = ctx.config.build_dir();
    match tokio::fs::remove_dir_all(&build).await {
        Ok(()) => {
            crate::debug!("clean"; "removed {}", ctx.config.root_relative(&build).display());
            Ok(1)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
        Err(err) => Err(TaskError::io(&build, err)),
    }
}

//! Text assets (markup, scripts) and verbatim copies.

use super::{TaskContext, TaskError, blocking, copy_file, read, write};
use crate::transform::{html::collapse_whitespace, js};

/// Copy fonts and favicons unchanged.
pub(super) async fn copy(ctx: &TaskContext) -> Result<usize, TaskError> {
    let section = &ctx.config.copy;
    let files = ctx.files(&section.include, &section.exclude)?;
    for rel in files.iter() {
        copy_file(&files.absolute(rel), &ctx.config.output_for(rel)).await?;
    }
    Ok(files.len())
}

/// Collapse whitespace in top-level markup.
pub(super) async fn html(ctx: &TaskContext) -> Result<usize, TaskError> {
    let section = &ctx.config.html;
    let files = ctx.files(&section.include, &section.exclude)?;
    for rel in files.iter() {
        let path = files.absolute(rel);
        let markup = String::from_utf8(read(&path).await?)
            .map_err(|e| TaskError::transform(&path, e.into()))?;
        let markup = if section.collapse_whitespace {
            blocking(move || collapse_whitespace(&markup)).await
        } else {
            markup
        };
        write(&ctx.config.output_for(rel), markup).await?;
    }
    Ok(files.len())
}

/// Minify scripts, keeping their file names.
pub(super) async fn scripts(ctx: &TaskContext) -> Result<usize, TaskError> {
    let section = &ctx.config.scripts;
    let files = ctx.files(&section.include, &section.exclude)?;
    for rel in files.iter() {
        let path = files.absolute(rel);
        let source = String::from_utf8(read(&path).await?)
            .map_err(|e| TaskError::transform(&path, e.into()))?;
        let minified = blocking(move || js::minify(&source))
            .await
            .map_err(|e| TaskError::transform(&path, e))?;
        write(&ctx.config.output_for(rel), minified).await?;
    }
    Ok(files.len())
}

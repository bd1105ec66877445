//! Vector tasks: standalone SVGs and the icon sprite.

use super::{TaskContext, TaskError, blocking, read, write};
use crate::transform::sprite::{self, Icon};
use crate::transform::svg;

/// Optimize each standalone SVG.
pub(super) async fn svg(ctx: &TaskContext) -> Result<usize, TaskError> {
    let section = &ctx.config.svg;
    let files = ctx.files(&section.include, &section.exclude)?;
    for rel in files.iter() {
        let path = files.absolute(rel);
        let bytes = read(&path).await?;
        let optimized = blocking(move || svg::optimize(&bytes))
            .await
            .map_err(|e| TaskError::transform(&path, e))?;
        write(&ctx.config.output_for(rel), optimized).await?;
    }
    Ok(files.len())
}

/// Optimize the icons and combine them into one sprite, ordered by file name.
///
/// Icons are never written individually.
pub(super) async fn sprite(ctx: &TaskContext) -> Result<usize, TaskError> {
    let section = &ctx.config.sprite;
    let files = ctx.files(&section.include, &section.exclude)?;
    if files.is_empty() {
        crate::debug!("sprite"; "no icons matched, skipping");
        return Ok(0);
    }

    let mut named: Vec<_> = files
        .iter()
        .map(|rel| (rel.file_name().map(|n| n.to_os_string()), rel))
        .collect();
    named.sort();

    let mut icons = Vec::with_capacity(named.len());
    for (_, rel) in named {
        let path = files.absolute(rel);
        let bytes = read(&path).await?;
        let svg = blocking(move || svg::optimize(&bytes))
            .await
            .map_err(|e| TaskError::transform(&path, e))?;
        let id = rel
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        icons.push(Icon { id, svg });
    }

    let output = ctx.config.output_for(&section.output);
    let document = sprite::build(&icons).map_err(|e| TaskError::transform(&output, e))?;
    write(&output, document).await?;
    Ok(1)
}

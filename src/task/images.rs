//! Raster image tasks sharing the `[images]` file set.

use std::path::Path;

use super::{TaskContext, TaskError, blocking, copy_file, read, write};
use crate::source::FileSet;
use crate::transform::TransformError;
use crate::transform::raster::{self, RasterFormat};

fn raster_set(ctx: &TaskContext) -> Result<FileSet, TaskError> {
    let section = &ctx.config.images;
    ctx.files(&section.include, &section.exclude)
}

fn format_of(path: &Path) -> Result<RasterFormat, TaskError> {
    RasterFormat::from_path(path)
        .ok_or_else(|| TaskError::transform(path, TransformError::UnsupportedImage))
}

/// Re-encode each image for size (production).
pub(super) async fn optimize(ctx: &TaskContext) -> Result<usize, TaskError> {
    let files = raster_set(ctx)?;
    let quality = ctx.config.images.jpeg_quality;
    for rel in files.iter() {
        let path = files.absolute(rel);
        let format = format_of(&path)?;
        let bytes = read(&path).await?;
        let optimized = blocking(move || raster::optimize(&bytes, format, quality))
            .await
            .map_err(|e| TaskError::transform(&path, e))?;
        write(&ctx.config.output_for(rel), optimized).await?;
    }
    Ok(files.len())
}

/// Copy each image unchanged (development).
pub(super) async fn copy(ctx: &TaskContext) -> Result<usize, TaskError> {
    let files = raster_set(ctx)?;
    for rel in files.iter() {
        copy_file(&files.absolute(rel), &ctx.config.output_for(rel)).await?;
    }
    Ok(files.len())
}

/// Write a `.webp` variant next to each image's output.
pub(super) async fn webp(ctx: &TaskContext) -> Result<usize, TaskError> {
    let files = raster_set(ctx)?;
    for rel in files.iter() {
        let path = files.absolute(rel);
        let format = format_of(&path)?;
        let bytes = read(&path).await?;
        let encoded = blocking(move || raster::to_webp(&bytes, format))
            .await
            .map_err(|e| TaskError::transform(&path, e))?;
        write(&ctx.config.output_for(rel.with_extension("webp")), encoded).await?;
    }
    Ok(files.len())
}

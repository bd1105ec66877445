//! SVG optimization using usvg.
//!
//! usvg resolves styles, drops editor metadata and unused definitions, and
//! writes a normalized document without indentation.

use super::TransformError;

/// Optimize an SVG document, returning the rewritten markup.
pub fn optimize(content: &[u8]) -> Result<String, TransformError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(content, &options)?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options))
}

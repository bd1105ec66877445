//! Path utilities.
//!
//! Pure functions for path manipulation.
//!
//! - [`fs`]: Filesystem path normalization and slash-separated display forms

pub mod fs;

pub use fs::{clean_path, normalize_path, to_slash};

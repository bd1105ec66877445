//! Source file sets.
//!
//! A [`FileSet`] is the sorted, de-duplicated list of files under the source
//! root selected by include patterns minus exclude patterns. Paths are kept
//! relative to the source root, which is also the layout of the output tree.

mod pattern;


pub use pattern::{PathPattern, has_glob_meta};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::utils::path::to_slash;
use pattern::{MATCH_OPTIONS, expand_braces};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    /// A literal (non-glob) include that names nothing on disk.
    #[error("source path not found: {}", .0.display())]
    Missing(PathBuf),

    /// A directory under the root could not be read while matching.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Files selected from the source root, in path order.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl FileSet {
    /// Select files under `root` matching any `include` and no `exclude`.
    pub fn resolve(root: &Path, include: &[String], exclude: &[String]) -> Result<Self, SourceError> {
        let excludes = exclude
            .iter()
            .map(|p| PathPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        for pattern in include {
            let found = glob_files(root, pattern)?;
            if found.is_empty() && !has_glob_meta(pattern) {
                return Err(SourceError::Missing(root.join(pattern)));
            }
            files.extend(found);
        }

        files.retain(|rel| {
            let rel = to_slash(rel);
            !excludes.iter().any(|ex| ex.matches(&rel))
        });
        files.sort();
        files.dedup();

        crate::debug!("source"; "{:?} -> {} file(s)", include, files.len());
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Source-relative paths.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Absolute path of a member.
    pub fn absolute(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Regular files matching one (brace-expanded) pattern, relative to `root`.
fn glob_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
    // The root itself may contain glob metacharacters.
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());

    let mut files = Vec::new();
    for expanded in expand_braces(pattern) {
        let full = format!("{}/{}", escaped_root.trim_end_matches('/'), expanded);
        let paths = glob::glob_with(&full, MATCH_OPTIONS).map_err(|err| SourceError::Pattern {
            pattern: pattern.to_string(),
            message: err.msg.to_string(),
        })?;

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    if let Ok(rel) = path.strip_prefix(root) {
                        files.push(rel.to_path_buf());
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    let path = err.path().to_path_buf();
                    return Err(SourceError::Io {
                        path,
                        source: err.into_error(),
                    });
                }
            }
        }
    }
    Ok(files)
}

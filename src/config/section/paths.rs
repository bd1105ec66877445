//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "source"   # Source root (relative to project root)
//! build = "build"     # Output root, deleted and regenerated on every run
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source and output roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub build: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "source".into(),
            build: "build".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_paths_override() {
        let config = test_parse_config("[paths]\nsource = \"src\"\nbuild = \"dist\"");
        assert_eq!(config.paths.source, PathBuf::from("src"));
        assert_eq!(config.paths.build, PathBuf::from("dist"));
    }

    #[test]
    fn test_paths_partial_override() {
        let config = test_parse_config("[paths]\nbuild = \"public\"");
        assert_eq!(config.paths.source, PathBuf::from("source"));
        assert_eq!(config.paths.build, PathBuf::from("public"));
    }
}

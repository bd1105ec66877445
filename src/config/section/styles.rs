//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! entry = "less/style.less"             # Root stylesheet (relative to source)
//! output = "css/style.min.css"          # Minified output (relative to build)
//! watch = ["less/**/*.less"]            # Changes here re-run the style task
//! preprocessor = ["lessc", "{input}"]   # Required for non-.css entries, CSS on stdout
//!
//! [styles.targets]                      # Vendor prefixes are added for these
//! chrome = 109
//! safari = 15
//! ```
//!
//! Plain `.css` entries need no preprocessor: `@import` rules are inlined by
//! the bundler and nesting is lowered for the configured targets.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigError;

/// Placeholder replaced by the entry path in `preprocessor` arguments.
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub entry: PathBuf,
    pub output: PathBuf,
    pub watch: Vec<String>,
    pub preprocessor: Vec<String>,
    pub targets: BrowserTargets,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: "css/style.css".into(),
            output: "css/style.min.css".into(),
            watch: vec!["css/**/*.css".into()],
            preprocessor: Vec::new(),
            targets: BrowserTargets::default(),
        }
    }
}

impl StylesConfig {
    /// Whether the entry is compiled by the external preprocessor.
    pub fn needs_preprocessor(&self) -> bool {
        self.entry.extension().and_then(|e| e.to_str()) != Some("css")
    }

    pub(in crate::config) fn validate(&self) -> Result<(), ConfigError> {
        if self.entry.as_os_str().is_empty() {
            return Err(ConfigError::Validation("[styles] entry must not be empty".into()));
        }
        if self.needs_preprocessor() && self.preprocessor.is_empty() {
            return Err(ConfigError::Validation(format!(
                "[styles] entry `{}` is not plain CSS, set `preprocessor`",
                self.entry.display()
            )));
        }
        Ok(())
    }
}

/// Minimum browser major versions, used for vendor prefixing and syntax lowering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserTargets {
    pub chrome: Option<u32>,
    pub edge: Option<u32>,
    pub firefox: Option<u32>,
    pub safari: Option<u32>,
    pub ios_saf: Option<u32>,
    pub samsung: Option<u32>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            chrome: Some(109),
            edge: Some(109),
            firefox: Some(115),
            safari: Some(15),
            ios_saf: Some(15),
            samsung: Some(20),
        }
    }
}

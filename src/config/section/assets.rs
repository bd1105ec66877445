//! File-set sections: `[html]`, `[scripts]`, `[images]`, `[svg]`, `[sprite]`, `[copy]`.
//!
//! Patterns are globs relative to the source root with brace alternation
//! (`*.{jpg,png}`). Outputs mirror each file's source-relative path under
//! the build root.
//!
//! # Example
//!
//! ```toml
//! [html]
//! include = ["*.html"]
//! collapse_whitespace = true
//!
//! [scripts]
//! include = ["js/*.js"]
//! watch = ["js/script.js"]
//!
//! [images]
//! include = ["img/**/*.{jpg,jpeg,png}"]
//! exclude = ["img/favicons/**"]
//! jpeg_quality = 75
//!
//! [svg]
//! exclude = ["img/icons/**", "img/favicons/**"]
//!
//! [sprite]
//! include = ["img/icons/*.svg"]
//! output = "img/sprite.svg"
//!
//! [copy]
//! include = ["fonts/*.{woff,woff2}", "img/favicons/*.{png,svg,ico,webmanifest}"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::ConfigError;

fn patterns(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// `[html]` - top-level markup files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Changes here re-run the markup task, then reload every page.
    pub watch: Vec<String>,
    pub collapse_whitespace: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["*.html"]),
            exclude: Vec::new(),
            watch: patterns(&["*.html"]),
            collapse_whitespace: true,
        }
    }
}

/// `[scripts]` - top-level scripts of the script directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub watch: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["js/*.js"]),
            exclude: Vec::new(),
            watch: patterns(&["js/script.js"]),
        }
    }
}

/// `[images]` - raster images, shared by optimize/copy/webp tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// JPEG re-encoding quality (1-100) of the production build.
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["img/**/*.{jpg,jpeg,png}"]),
            exclude: patterns(&["img/favicons/**"]),
            jpeg_quality: 75,
        }
    }
}

impl ImagesConfig {
    pub(in crate::config) fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(format!(
                "[images] jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

/// `[svg]` - standalone vector images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["img/**/*.svg"]),
            exclude: patterns(&["img/icons/**", "img/favicons/**"]),
        }
    }
}

/// `[sprite]` - icons combined into one inline sprite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Sprite path relative to the build root.
    pub output: PathBuf,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            include: patterns(&["img/icons/*.svg"]),
            exclude: Vec::new(),
            output: "img/sprite.svg".into(),
        }
    }
}

/// `[copy]` - files copied verbatim (fonts, favicons).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            include: patterns(&[
                "fonts/*.{woff,woff2}",
                "img/favicons/*.{png,svg,ico,webmanifest}",
            ]),
            exclude: Vec::new(),
        }
    }
}

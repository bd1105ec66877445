//! Pipeline configuration management for `sitepipe.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── styles     # [styles]
//! │   ├── assets     # [html] [scripts] [images] [svg] [sprite] [copy]
//! │   └── serve      # [serve]
//! ├── types/         # ConfigError
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                             |
//! |--------------|-----------------------------------------------------|
//! | `[paths]`    | Source and build roots                              |
//! | `[styles]`   | Root stylesheet, preprocessor, browser targets      |
//! | `[html]`     | Markup file set and whitespace collapsing           |
//! | `[scripts]`  | Script file set                                     |
//! | `[images]`   | Raster file set and JPEG quality                    |
//! | `[svg]`      | Standalone vector file set                          |
//! | `[sprite]`   | Icon file set and sprite output                     |
//! | `[copy]`     | Fonts and favicons copied verbatim                  |
//! | `[serve]`    | Development server (interface, ports, CORS)         |
//!
//! The file is optional: without it every section uses its defaults and the
//! working directory is the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BrowserTargets, CopyConfig, HtmlConfig, ImagesConfig, PathsConfig, ScriptsConfig,
    ServeConfig, SpriteConfig, StylesConfig, SvgConfig,
};
pub use types::ConfigError;

use crate::{cli::Cli, log, utils::path::clean_path};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sitepipe.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file or cwd
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub html: HtmlConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub svg: SvgConfig,

    #[serde(default)]
    pub sprite: SpriteConfig,

    #[serde(default)]
    pub copy: CopyConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        crate::logger::set_verbose(cli.verbose);

        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = crate::utils::path::normalize_path(&path);
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.set_root(&crate::utils::path::normalize_path(&root));
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Absolute source directory.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.paths.source)
    }

    /// Absolute build (output) directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.paths.build)
    }

    /// Output path of a file given its path relative to the source root.
    ///
    /// Outputs mirror the source layout below the build root.
    pub fn output_for(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.build_dir().join(rel)
    }

    /// Get path relative to the project root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.paths.build.as_os_str().is_empty() {
            bail!(ConfigError::Validation("[paths] build must not be empty".into()));
        }
        self.validate_build_root()?;
        self.styles.validate()?;
        self.images.validate()?;
        self.serve.validate()?;

        let sets = [
            ("html", &self.html.include),
            ("scripts", &self.scripts.include),
            ("images", &self.images.include),
            ("svg", &self.svg.include),
            ("sprite", &self.sprite.include),
            ("copy", &self.copy.include),
        ];
        for (section, include) in sets {
            if include.is_empty() {
                bail!(ConfigError::Validation(format!(
                    "[{section}] include must list at least one pattern"
                )));
            }
        }
        Ok(())
    }
}

impl SiteConfig {
    /// Clean removes the build root, so it must not hold the sources or the project.
    fn validate_build_root(&self) -> Result<()> {
        let resolve = |path: &Path| clean_path(&self.root.join(path));
        let root = resolve(Path::new(""));
        let source = resolve(&self.paths.source);
        let build = resolve(&self.paths.build);

        if source == build {
            bail!(ConfigError::Validation(
                "[paths] source and build must differ".into()
            ));
        }
        if source.starts_with(&build) {
            bail!(ConfigError::Validation(format!(
                "[paths] build `{}` contains the source directory",
                self.paths.build.display()
            )));
        }
        if root.starts_with(&build) {
            bail!(ConfigError::Validation(format!(
                "[paths] build `{}` contains the project root",
                self.paths.build.display()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config rooted at `root`.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.set_root(root);
    config
}

// ============================================================================
// tests
// ============================================================================

//! Stylesheet compilation and minification with lightningcss.
//!
//! Vendor prefixes and syntax lowering follow the configured browser
//! targets; output is always printed minified.

use std::path::Path;

use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use super::TransformError;
use crate::config::BrowserTargets;
use crate::utils::path::to_slash;

/// Minified stylesheet and its version 3 source map (JSON).
#[derive(Debug)]
pub struct CompiledCss {
    pub code: String,
    pub map: String,
}

impl CompiledCss {
    /// The code followed by a `sourceMappingURL` comment naming `map_name`.
    pub fn code_with_map_url(&self, map_name: &str) -> String {
        format!("{}\n/*# sourceMappingURL={map_name} */\n", self.code)
    }
}

/// lightningcss encodes versions as `major << 16 | minor << 8 | patch`.
fn version(major: Option<u32>) -> Option<u32> {
    major.map(|v| v << 16)
}

fn targets(browsers: &BrowserTargets) -> Targets {
    Targets::from(Browsers {
        chrome: version(browsers.chrome),
        edge: version(browsers.edge),
        firefox: version(browsers.firefox),
        safari: version(browsers.safari),
        ios_saf: version(browsers.ios_saf),
        samsung: version(browsers.samsung),
        ..Browsers::default()
    })
}

/// Bundle a `.css` entry (inlining `@import`s relative to it), then prefix and minify.
///
/// Map sources are named relative to `source_root`.
pub fn compile_entry(
    entry: &Path,
    source_root: &Path,
    browsers: &BrowserTargets,
) -> Result<CompiledCss, TransformError> {
    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut stylesheet = bundler
        .bundle(entry)
        .map_err(|err| TransformError::Css(err.to_string()))?;
    finish(&mut stylesheet, targets(browsers), source_root)
}

/// Prefix and minify already-compiled CSS (preprocessor output).
pub fn minify(
    source: &str,
    filename: &str,
    browsers: &BrowserTargets,
) -> Result<CompiledCss, TransformError> {
    let options = ParserOptions {
        filename: filename.to_string(),
        ..ParserOptions::default()
    };
    let mut stylesheet =
        StyleSheet::parse(source, options).map_err(|err| TransformError::Css(err.to_string()))?;
    finish(&mut stylesheet, targets(browsers), Path::new(""))
}

fn finish(
    stylesheet: &mut StyleSheet<'_>,
    targets: Targets,
    source_root: &Path,
) -> Result<CompiledCss, TransformError> {
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|err| TransformError::Css(err.to_string()))?;

    // Mappings refer to sources by their index in `stylesheet.sources`.
    let mut map = SourceMap::new("/");
    for source in &stylesheet.sources {
        let path = Path::new(source);
        let name = path
            .strip_prefix(source_root)
            .map_or_else(|_| source.clone(), to_slash);
        map.add_source(&name);
    }

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            source_map: Some(&mut map),
            ..PrinterOptions::default()
        })
        .map_err(|err| TransformError::Css(err.to_string()))?;
    let map = map
        .to_json(None)
        .map_err(|err| TransformError::Css(err.to_string()))?;
    Ok(CompiledCss {
        code: result.code,
        map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_minify_strips_whitespace() {
        let css = "body {\n  margin: 0;\n  color: #ff0000;\n}\n";
        let out = minify(css, "style.css", &BrowserTargets::default()).unwrap().code;
        assert!(!out.contains('\n'));
        assert!(out.contains("margin:0"));
        assert!(out.contains("color:red"));
    }

    #[test]
    fn test_bundle_inlines_imports() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("base.css"), "html { margin: 0 }").unwrap();
        fs::write(
            temp.path().join("style.css"),
            "@import \"base.css\";\n.card { padding: 4px }",
        )
        .unwrap();

        let out = compile_entry(&temp.path().join("style.css"), temp.path(), &BrowserTargets::default())
            .unwrap()
            .code;
        assert!(!out.contains("@import"));
        assert!(out.contains("html{margin:0}"));
        assert!(out.contains(".card{padding:4px}"));
    }

    #[test]
    fn test_nesting_lowered() {
        let css = ".nav { & a { color: blue } }";
        let out = minify(css, "style.css", &BrowserTargets::default()).unwrap().code;
        assert!(out.contains(".nav a"));
    }

    #[test]
    fn test_malformed_is_error() {
        let err = minify("..bad { color: red }", "broken.css", &BrowserTargets::default());
        assert!(matches!(err, Err(TransformError::Css(_))));
    }

    #[test]
    fn test_missing_entry_is_error() {
        let temp = TempDir::new().unwrap();
        let err = compile_entry(&temp.path().join("none.css"), temp.path(), &BrowserTargets::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_source_map_names_bundled_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("css")).unwrap();
        fs::write(temp.path().join("css/base.css"), "html { margin: 0 }").unwrap();
        fs::write(
            temp.path().join("css/style.css"),
            "@import \"base.css\";\n.card { padding: 4px }",
        )
        .unwrap();

        let out = compile_entry(
            &temp.path().join("css/style.css"),
            temp.path(),
            &BrowserTargets::default(),
        )
        .unwrap();
        let map: serde_json::Value = serde_json::from_str(&out.map).unwrap();
        assert_eq!(map["version"], 3);
        let sources = map["sources"].as_array().unwrap();
        assert!(sources.iter().any(|s| s == "css/base.css"));
        assert!(sources.iter().any(|s| s == "css/style.css"));
        assert!(!map["mappings"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_map_url_comment() {
        let out = minify("a { color: red }", "style.css", &BrowserTargets::default()).unwrap();
        assert_eq!(
            out.code_with_map_url("style.min.css.map"),
            "a{color:red}\n/*# sourceMappingURL=style.min.css.map */\n"
        );
    }
}

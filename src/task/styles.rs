//! Root stylesheet: compile, prefix, minify, write with its source map, notify.

use std::path::{Path, PathBuf};

use super::{TaskContext, TaskError, blocking, write};
use crate::config::BrowserTargets;
use crate::config::section::INPUT_PLACEHOLDER;
use crate::transform::css::{self, CompiledCss};
use crate::transform::TransformError;
use crate::utils::exec::Cmd;
use crate::utils::path::to_slash;

pub(super) async fn run(ctx: &TaskContext) -> Result<usize, TaskError> {
    let config = &ctx.config;
    let section = &config.styles;
    let entry = config.source_dir().join(&section.entry);
    if !entry.is_file() {
        return Err(TaskError::MissingSource(entry));
    }

    let targets = section.targets.clone();
    let compiled = if section.needs_preprocessor() {
        let argv = preprocessor_argv(&section.preprocessor, &entry);
        let cwd = config.source_dir();
        let filename = to_slash(&section.entry);
        blocking(move || preprocess(&argv, &cwd, &filename, &targets)).await
    } else {
        let entry = entry.clone();
        let source_root = config.source_dir();
        blocking(move || css::compile_entry(&entry, &source_root, &targets)).await
    };
    let compiled = compiled.map_err(|e| TaskError::transform(&entry, e))?;

    let output = config.output_for(&section.output);
    let map_file = map_path(&output);
    let map_name = map_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    write(&output, compiled.code_with_map_url(&map_name)).await?;
    write(&map_file, compiled.map).await?;

    if let Some(session) = ctx.session() {
        session.notify_css(&format!("/{}", to_slash(&section.output)));
    }
    Ok(2)
}

/// `style.min.css` → `style.min.css.map`, in the same directory.
fn map_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".map");
    PathBuf::from(name)
}

/// Substitute the entry path for `{input}`.
fn preprocessor_argv(template: &[String], entry: &Path) -> Vec<String> {
    let input = entry.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input))
        .collect()
}

/// Run the preprocessor and minify the CSS it prints.
fn preprocess(
    argv: &[String],
    cwd: &Path,
    filename: &str,
    targets: &BrowserTargets,
) -> Result<CompiledCss, TransformError> {
    let output = Cmd::from_slice(argv)
        .cwd(cwd)
        .run()
        .map_err(|e| TransformError::Preprocessor(format!("{e:#}")))?;
    let compiled = String::from_utf8(output.stdout)?;
    css::minify(&compiled, filename, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocessor_argv() {
        let template = vec!["lessc".to_string(), "--strict-math".to_string(), "{input}".to_string()];
        let argv = preprocessor_argv(&template, Path::new("/site/source/less/style.less"));
        assert_eq!(argv, vec!["lessc", "--strict-math", "/site/source/less/style.less"]);
    }

    #[test]
    fn test_map_path() {
        assert_eq!(
            map_path(Path::new("/site/build/css/style.min.css")),
            PathBuf::from("/site/build/css/style.min.css.map")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_preprocessor_output_is_error() {
        let argv = vec!["printf".to_string(), "a{content:\"\\351\"}".to_string()];
        let err = preprocess(&argv, Path::new("."), "style.less", &BrowserTargets::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::Encoding(_)));
    }
}

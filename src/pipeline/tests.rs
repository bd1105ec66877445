use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use super::*;
use crate::config::test_config_at;
use crate::task::TaskError;
use crate::transform::raster::fixtures;
use crate::utils::path::to_slash;

const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16"><path d="M0 0h16v16H0z"/></svg>"#;

fn put(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join("source").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small site covering every task.
fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    put(root, "index.html", "<!DOCTYPE html>\n<html>\n  <body>\n    <h1>Home</h1>\n  </body>\n</html>\n");
    put(root, "about.html", "<div>\n  <p>About   us</p>\n</div>\n");
    put(root, "partials/footer.html", "<footer></footer>");
    put(root, "css/base.css", "html {\n  color: #333333;\n}\n");
    put(root, "css/style.css", "@import \"base.css\";\n\n.menu {\n  display: flex;\n}\n");
    put(root, "js/script.js", "var counter = 0;\nfunction tick() {\n  counter += 1;\n  return counter;\n}\nwindow.tick = tick;\n");
    put(root, "img/photo.png", fixtures::loose_png());
    put(root, "img/team/portrait.jpg", fixtures::fine_jpeg());
    put(root, "img/logo.svg", ICON);
    put(root, "img/icons/search.svg", ICON);
    put(root, "img/icons/close.svg", ICON);
    put(root, "img/icons/menu.svg", ICON);
    put(root, "img/favicons/favicon.png", fixtures::loose_png());
    put(root, "img/favicons/site.webmanifest", "{\"name\":\"site\"}");
    put(root, "fonts/body.woff2", b"wOF2fake");
    temp
}

fn context(root: &Path) -> TaskContext {
    TaskContext::new(Arc::new(test_config_at(root)))
}

/// Every file under the build root, keyed by its relative path.
fn output_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(dir: &Path, base: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, base, out);
            } else {
                let rel = to_slash(path.strip_prefix(base).unwrap());
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let build = root.join("build");
    let mut out = BTreeMap::new();
    if build.exists() {
        walk(&build, &build, &mut out);
    }
    out
}

fn source_bytes(root: &Path, rel: &str) -> Vec<u8> {
    fs::read(root.join("source").join(rel)).unwrap()
}

// ============================================================================
// composed pipelines
// ============================================================================

#[tokio::test]
async fn test_build_output_tree() {
    let temp = site();
    run(Mode::Build, &context(temp.path())).await.unwrap();

    let tree = output_tree(temp.path());
    let files: Vec<&str> = tree.keys().map(String::as_str).collect();
    assert_eq!(
        files,
        vec![
            "about.html",
            "css/style.min.css",
            "css/style.min.css.map",
            "fonts/body.woff2",
            "img/favicons/favicon.png",
            "img/favicons/site.webmanifest",
            "img/logo.svg",
            "img/photo.png",
            "img/photo.webp",
            "img/sprite.svg",
            "img/team/portrait.jpg",
            "img/team/portrait.webp",
            "index.html",
            "js/script.js",
        ]
    );

    let css = String::from_utf8(tree["css/style.min.css"].clone()).unwrap();
    assert_eq!(
        css,
        "html{color:#333}.menu{display:flex}\n/*# sourceMappingURL=style.min.css.map */\n"
    );
    assert_eq!(tree["about.html"], b"<div><p>About us</p></div>");
    assert!(!String::from_utf8_lossy(&tree["js/script.js"]).contains("\n  "));

    assert_eq!(tree["fonts/body.woff2"], source_bytes(temp.path(), "fonts/body.woff2"));
    assert_eq!(
        tree["img/favicons/favicon.png"],
        source_bytes(temp.path(), "img/favicons/favicon.png")
    );
}

#[tokio::test]
async fn test_build_twice_is_identical() {
    let temp = site();
    let ctx = context(temp.path());

    run(Mode::Build, &ctx).await.unwrap();
    let first = output_tree(temp.path());
    run(Mode::Build, &ctx).await.unwrap();
    let second = output_tree(temp.path());

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_stale_outputs_removed() {
    let temp = site();
    let ctx = context(temp.path());
    run(Mode::Build, &ctx).await.unwrap();

    fs::remove_file(temp.path().join("source/about.html")).unwrap();
    fs::write(temp.path().join("build/leftover.txt"), "old").unwrap();
    run(Mode::Build, &ctx).await.unwrap();

    let tree = output_tree(temp.path());
    assert!(!tree.contains_key("about.html"));
    assert!(!tree.contains_key("leftover.txt"));
    assert!(tree.contains_key("index.html"));
}

#[tokio::test]
async fn test_dev_copies_images_build_reencodes() {
    let temp = site();
    let ctx = context(temp.path());
    let original = source_bytes(temp.path(), "img/photo.png");

    run(Mode::Dev, &ctx).await.unwrap();
    let dev = output_tree(temp.path());
    assert_eq!(dev["img/photo.png"], original);
    assert_eq!(
        dev["img/team/portrait.jpg"],
        source_bytes(temp.path(), "img/team/portrait.jpg")
    );
    assert!(dev.contains_key("img/photo.webp"));

    run(Mode::Build, &ctx).await.unwrap();
    let build = output_tree(temp.path());
    assert!(build["img/photo.png"].len() < original.len());
    assert!(build.contains_key("img/photo.webp"));
}

#[tokio::test]
async fn test_icons_only_in_sprite() {
    let temp = site();
    run(Mode::Build, &context(temp.path())).await.unwrap();

    let tree = output_tree(temp.path());
    assert!(!tree.keys().any(|k| k.starts_with("img/icons/")));

    let sprite = String::from_utf8(tree["img/sprite.svg"].clone()).unwrap();
    assert_eq!(sprite.matches("<symbol").count(), 3);
    let close = sprite.find("id=\"close\"").unwrap();
    let menu = sprite.find("id=\"menu\"").unwrap();
    let search = sprite.find("id=\"search\"").unwrap();
    assert!(close < menu && menu < search);
}

#[tokio::test]
async fn test_transform_error_fails_build_not_dev() {
    let temp = site();
    put(temp.path(), "js/broken.js", "function (");
    let ctx = context(temp.path());

    let err = run(Mode::Build, &ctx).await.unwrap_err();
    match err {
        PipelineError::Task { kind, source } => {
            assert_eq!(kind, TaskKind::Scripts);
            assert!(source.is_transform());
        }
        other => panic!("unexpected error: {other}"),
    }

    let reports = run(Mode::Dev, &ctx).await.unwrap();
    assert!(!reports.iter().any(|r| r.kind == TaskKind::Scripts));
    let tree = output_tree(temp.path());
    assert!(tree.contains_key("index.html"));
    assert!(tree.contains_key("css/style.min.css"));
}

#[tokio::test]
async fn test_missing_stylesheet_fails_dev_too() {
    let temp = site();
    fs::remove_file(temp.path().join("source/css/style.css")).unwrap();

    let err = run(Mode::Dev, &context(temp.path())).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Task {
            kind: TaskKind::Styles,
            source: TaskError::MissingSource(_)
        }
    ));
}

// ============================================================================
// graph
// ============================================================================

#[test]
fn test_pipeline_order() {
    for (mode, images) in [
        (Mode::Build, TaskKind::OptimizeImages),
        (Mode::Dev, TaskKind::CopyImages),
    ] {
        let order = graph(mode).validate().unwrap();
        assert_eq!(order.len(), 9);
        assert_eq!(&order[..3], &[TaskKind::Clean, TaskKind::Copy, images]);
        for kind in ASSET_TASKS {
            assert!(order[3..].contains(&kind));
        }
    }
}

#[test]
fn test_graph_rejects_cycle() {
    let mut graph = TaskGraph::new();
    graph
        .add(TaskKind::Clean, &[])
        .add(TaskKind::Copy, &[TaskKind::Clean, TaskKind::Html])
        .add(TaskKind::Html, &[TaskKind::Copy]);

    let err = graph.validate().unwrap_err();
    assert_eq!(err, GraphError::Cycle(vec![TaskKind::Copy, TaskKind::Html]));
    assert!(err.to_string().contains("`copy`, `html`"));
}

#[test]
fn test_graph_rejects_unknown_and_duplicate() {
    let mut graph = TaskGraph::new();
    graph.add(TaskKind::Styles, &[TaskKind::Clean]);
    assert_eq!(
        graph.validate().unwrap_err(),
        GraphError::UnknownDependency {
            task: TaskKind::Styles,
            dependency: TaskKind::Clean
        }
    );

    let mut graph = TaskGraph::new();
    graph.add(TaskKind::Clean, &[]).add(TaskKind::Clean, &[]);
    assert_eq!(graph.validate().unwrap_err(), GraphError::Duplicate(TaskKind::Clean));
}

#[tokio::test]
async fn test_invalid_graph_runs_nothing() {
    let temp = site();
    let mut graph = TaskGraph::new();
    graph
        .add(TaskKind::Html, &[TaskKind::Scripts])
        .add(TaskKind::Scripts, &[TaskKind::Html]);

    let err = graph
        .run(&context(temp.path()), FailurePolicy::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Graph(GraphError::Cycle(_))));
    assert!(output_tree(temp.path()).is_empty());
}

#[tokio::test]
async fn test_fatal_error_skips_dependents() {
    let temp = site();
    fs::remove_file(temp.path().join("source/css/style.css")).unwrap();
    let mut graph = TaskGraph::new();
    graph
        .add(TaskKind::Styles, &[])
        .add(TaskKind::Html, &[TaskKind::Styles]);

    let err = graph
        .run(&context(temp.path()), FailurePolicy::Tolerant)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Task { kind: TaskKind::Styles, .. }));
    assert!(!temp.path().join("build/index.html").exists());
}

#[tokio::test]
async fn test_tolerated_error_releases_dependents() {
    let temp = site();
    put(temp.path(), "js/broken.js", "function (");
    let mut graph = TaskGraph::new();
    graph
        .add(TaskKind::Scripts, &[])
        .add(TaskKind::Html, &[TaskKind::Scripts]);

    let reports = graph
        .run(&context(temp.path()), FailurePolicy::Tolerant)
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, TaskKind::Html);
    assert!(temp.path().join("build/index.html").exists());
}

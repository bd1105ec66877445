use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind};
use tempfile::TempDir;

use super::registry::is_temp_file;
use super::*;
use crate::config::{SiteConfig, test_config_at};
use crate::reload::HotReloadMessage;
use crate::serve::ServerSession;

fn config() -> SiteConfig {
    test_config_at(Path::new("/site"))
}

fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Content))
}

fn tasks(registry: &WatchRegistry, event: &notify::Event) -> Vec<TaskKind> {
    registry
        .triggered(event)
        .into_iter()
        .filter_map(|i| registry.get(i).map(|r| r.task))
        .collect()
}

#[test]
fn test_stylesheet_change_triggers_only_styles() {
    let registry = WatchRegistry::from_config(&config()).unwrap();
    let hit = event(modify(), &["/site/source/css/blocks/header.css"]);

    assert_eq!(tasks(&registry, &hit), vec![TaskKind::Styles]);
    let styles = registry.get(registry.triggered(&hit)[0]).unwrap();
    assert!(!styles.reload);
}

#[test]
fn test_markup_change_reloads() {
    let registry = WatchRegistry::from_config(&config()).unwrap();
    let hit = event(EventKind::Create(CreateKind::File), &["/site/source/about.html"]);

    let indexes = registry.triggered(&hit);
    assert_eq!(indexes.len(), 1);
    let html = registry.get(indexes[0]).unwrap();
    assert_eq!(html.task, TaskKind::Html);
    assert!(html.reload);

    // `*.html` is top-level only
    let nested = event(modify(), &["/site/source/partials/nav.html"]);
    assert!(registry.triggered(&nested).is_empty());
}

#[test]
fn test_only_watched_script_triggers() {
    let registry = WatchRegistry::from_config(&config()).unwrap();
    let main = event(modify(), &["/site/source/js/script.js"]);
    let other = event(modify(), &["/site/source/js/vendor.js"]);

    assert_eq!(tasks(&registry, &main), vec![TaskKind::Scripts]);
    assert!(registry.triggered(&other).is_empty());
}

#[test]
fn test_one_event_triggers_each_registration_once() {
    let registry = WatchRegistry::from_config(&config()).unwrap();
    let burst = event(
        modify(),
        &[
            "/site/source/index.html",
            "/site/source/css/style.css",
            "/site/source/contact.html",
        ],
    );
    assert_eq!(tasks(&registry, &burst), vec![TaskKind::Styles, TaskKind::Html]);
}

#[test]
fn test_noise_ignored() {
    let registry = WatchRegistry::from_config(&config()).unwrap();

    let metadata = event(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        &["/site/source/css/style.css"],
    );
    let access = event(EventKind::Access(AccessKind::Any), &["/site/source/index.html"]);
    let swap = event(modify(), &["/site/source/css/.style.css.swp"]);
    let outside = event(modify(), &["/site/build/index.html"]);

    for ignored in [metadata, access, swap, outside] {
        assert!(registry.triggered(&ignored).is_empty(), "{:?}", ignored);
    }
}

#[test]
fn test_unspecified_event_kind_triggers() {
    let registry = WatchRegistry::from_config(&config()).unwrap();
    let polled = event(EventKind::Any, &["/site/source/index.html"]);
    assert_eq!(tasks(&registry, &polled), vec![TaskKind::Html]);
}

#[test]
fn test_temp_files() {
    assert!(is_temp_file(Path::new("css/style.css~")));
    assert!(is_temp_file(Path::new("index.html.bak")));
    assert!(is_temp_file(Path::new(".#index.html")));
    assert!(!is_temp_file(Path::new("css/style.css")));
}

#[test]
fn test_custom_watch_patterns() {
    let mut config = config();
    config.styles.watch = vec!["less/**/*.{less,css}".into()];
    let registry = WatchRegistry::from_config(&config).unwrap();

    let hit = event(modify(), &["/site/source/less/blocks/card.less"]);
    let old = event(modify(), &["/site/source/css/style.css"]);
    assert_eq!(tasks(&registry, &hit), vec![TaskKind::Styles]);
    assert!(registry.triggered(&old).is_empty());
}

#[tokio::test]
async fn test_markup_save_rebuilds_and_reloads() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();

    let mut config = test_config_at(temp.path());
    config.serve.port = 0;
    config.serve.reload_port = 0;
    let config = Arc::new(config);
    let session = Arc::new(ServerSession::start(&config).unwrap());

    let url = format!("ws://127.0.0.1:{}", session.reload_port());
    let (mut client, _) = tungstenite::connect(url).unwrap();
    client.read().unwrap(); // connected
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.client_count() < 1 {
        assert!(Instant::now() < deadline, "client never registered");
        std::thread::sleep(Duration::from_millis(20));
    }
    if let tungstenite::stream::MaybeTlsStream::Plain(stream) = client.get_ref() {
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    }

    let ctx = TaskContext::new(config).with_session(Arc::clone(&session));
    let watcher = SourceWatcher::new(ctx).unwrap();
    let (stop_tx, stop_rx) = watch::channel(false);
    let running = tokio::spawn(watcher.run(stop_rx));

    // Stage outside the watched root so the save lands in one rename
    let staged = temp.path().join("staged.html");
    fs::write(&staged, "<div>\n  <p>saved</p>\n</div>\n").unwrap();
    fs::rename(&staged, source.join("index.html")).unwrap();

    let message = tokio::task::spawn_blocking(move || client.read().unwrap())
        .await
        .unwrap();
    assert_eq!(message.to_text().unwrap(), HotReloadMessage::Reload.to_json());
    assert_eq!(
        fs::read_to_string(temp.path().join("build/index.html")).unwrap(),
        "<div><p>saved</p></div>"
    );

    stop_tx.send(true).unwrap();
    running.await.unwrap();
    session.stop();
}

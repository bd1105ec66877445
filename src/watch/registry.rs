//! Which task a changed source file re-runs.

use std::path::{Path, PathBuf};

use notify::EventKind;
use notify::event::ModifyKind;

use crate::config::SiteConfig;
use crate::source::{PathPattern, SourceError};
use crate::task::TaskKind;
use crate::utils::path::{normalize_path, to_slash};

/// Check if path is a temp/backup file (editor artifacts)
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Source patterns bound to the task they re-run.
#[derive(Debug)]
pub struct Registration {
    pub task: TaskKind,
    patterns: Vec<PathPattern>,
    /// Full page reload after a successful run.
    pub reload: bool,
}

impl Registration {
    fn new(task: TaskKind, patterns: &[String], reload: bool) -> Result<Self, SourceError> {
        let patterns = patterns
            .iter()
            .map(|p| PathPattern::new(p))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            task,
            patterns,
            reload,
        })
    }

    fn matches(&self, rel: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(rel))
    }
}

#[derive(Debug)]
pub struct WatchRegistry {
    /// Configured and canonical forms of the source root; events may report either.
    roots: Vec<PathBuf>,
    registrations: Vec<Registration>,
}

impl WatchRegistry {
    /// Styles notify the stylesheet themselves; markup changes reload the page.
    pub fn from_config(config: &SiteConfig) -> Result<Self, SourceError> {
        let source = config.source_dir();
        let canonical = normalize_path(&source);
        let mut roots = vec![source];
        if !roots.contains(&canonical) {
            roots.push(canonical);
        }

        let registrations = vec![
            Registration::new(TaskKind::Styles, &config.styles.watch, false)?,
            Registration::new(TaskKind::Scripts, &config.scripts.watch, false)?,
            Registration::new(TaskKind::Html, &config.html.watch, true)?,
        ];
        Ok(Self {
            roots,
            registrations,
        })
    }

    /// Root to hand to the file watcher.
    pub fn watch_root(&self) -> &Path {
        self.roots.last().map_or(Path::new("."), PathBuf::as_path)
    }

    pub fn get(&self, index: usize) -> Option<&Registration> {
        self.registrations.get(index)
    }

    /// Registrations an event triggers, each at most once, in registration order.
    pub fn triggered(&self, event: &notify::Event) -> Vec<usize> {
        match event.kind {
            // Some backends (the poll watcher among them) only report `Any`
            EventKind::Any | EventKind::Create(_) | EventKind::Remove(_) => {}
            // Metadata-only changes (mtime/atime/chmod) would loop on our own writes
            EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
            EventKind::Modify(_) => {}
            _ => return Vec::new(),
        }

        let mut hits = Vec::new();
        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let Some(rel) = self.relative(path) else {
                continue;
            };
            for (index, registration) in self.registrations.iter().enumerate() {
                if registration.matches(&rel) && !hits.contains(&index) {
                    hits.push(index);
                }
            }
        }
        hits.sort_unstable();
        hits
    }

    fn relative(&self, path: &Path) -> Option<String> {
        self.roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .map(to_slash)
    }
}

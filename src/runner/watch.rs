//! Source watching for the monitor task
//!
//! Changes under the application and test folders trigger one run of the
//! monitored tasks. Cycles never overlap: events that arrive while a cycle
//! runs are queued and coalesced into the next one.

use crate::runner::{expand, Context, ExpandOptions, Executor, TaskRequest};
use anyhow::{Context as _, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, error, info, warn};

/// Decides which changed paths trigger a cycle
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl WatchFilter {
    /// Filter over glob patterns relative to `root`
    pub fn new(root: impl Into<PathBuf>, include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(WatchFilter {
            root: root.into(),
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// Everything below the watched folders, minus editor and VCS droppings
    pub fn for_folders(root: &Path, folders: &[&Path]) -> Result<Self> {
        let include: Vec<String> = folders
            .iter()
            .filter_map(|folder| relative_str(root, folder))
            .map(|rel| format!("{}/**", rel))
            .collect();
        let exclude = vec![
            "**/.git/**".to_string(),
            "**/*~".to_string(),
            "**/*.swp".to_string(),
            "**/.DS_Store".to_string(),
        ];
        WatchFilter::new(root, &include, &exclude)
    }

    pub fn matches(&self, path: &Path) -> bool {
        match relative_str(&self.root, path) {
            Some(rel) => self.include.is_match(&rel) && !self.exclude.is_match(&rel),
            None => false,
        }
    }

    /// Whether an event changes a watched file
    pub fn is_relevant(&self, event: &Event) -> bool {
        !matches!(event.kind, EventKind::Access(_)) && event.paths.iter().any(|p| self.matches(p))
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid watch pattern {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("building watch patterns")
}

/// Path relative to `root` with forward slashes
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Drain queued events; returns how many relevant ones were pending
pub fn coalesce(rx: &Receiver<notify::Result<Event>>, filter: &WatchFilter) -> usize {
    rx.try_iter()
        .filter_map(|res| res.ok())
        .filter(|event| filter.is_relevant(event))
        .count()
}

/// Run the monitored tasks once
pub fn run_cycle(ctx: &Context, options: &ExpandOptions, requests: &[TaskRequest]) -> crate::Result<()> {
    let plan = expand(requests, options)?;
    let mut executor = Executor::new(ctx, options)?;
    executor.run(&plan)
}

/// Watch the application and test folders until the process is stopped
pub fn watch(ctx: &Context, options: &ExpandOptions, requests: &[TaskRequest]) -> Result<()> {
    let root = ctx
        .project_root
        .canonicalize()
        .unwrap_or_else(|_| ctx.project_root.clone());
    let folders: Vec<PathBuf> = [ctx.layout.app(), ctx.layout.test()]
        .iter()
        .map(|node| {
            let path = node.path();
            path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
        })
        .collect();
    let folder_refs: Vec<&Path> = folders.iter().map(PathBuf::as_path).collect();
    let filter = WatchFilter::for_folders(&root, &folder_refs)?;

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // The receiver only goes away when watching stops
            let _ = tx.send(res);
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    for folder in &folders {
        if folder.is_dir() {
            watcher
                .watch(folder, RecursiveMode::Recursive)
                .with_context(|| format!("watching {}", folder.display()))?;
            info!("Watching {}", ctx.display_path(folder));
        } else {
            warn!("Not watching missing folder {}", ctx.display_path(folder));
        }
    }

    info!("Waiting for changes...");
    while let Ok(res) = rx.recv() {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("File watch error: {}", e);
                continue;
            }
        };
        if !filter.is_relevant(&event) {
            continue;
        }

        if let Some(path) = event.paths.first() {
            info!("File {} changed", ctx.display_path(path));
        }
        let queued = coalesce(&rx, &filter);
        if queued > 0 {
            debug!("coalesced {} queued change(s)", queued);
        }

        match run_cycle(ctx, options, requests) {
            Ok(()) => info!("Completed, waiting for changes..."),
            Err(e) => error!("Cycle failed: {}; waiting for changes...", e),
        }
    }

    debug!("file watcher loop ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn filter() -> WatchFilter {
        let root = Path::new("/project");
        WatchFilter::for_folders(root, &[Path::new("/project/app"), Path::new("/project/test")])
            .unwrap()
    }

    #[test]
    fn test_matches_watched_folders_only() {
        let filter = filter();
        assert!(filter.matches(Path::new("/project/app/static/js/app.js")));
        assert!(filter.matches(Path::new("/project/test/client/spec.js")));
        assert!(!filter.matches(Path::new("/project/working/app/server.js")));
        assert!(!filter.matches(Path::new("/elsewhere/app/a.js")));
        assert!(!filter.matches(Path::new("/project/app/views/index.html.swp")));
    }

    #[test]
    fn test_access_events_are_ignored() {
        let filter = filter();
        let path = PathBuf::from("/project/app/server.js");

        let read = Event::new(EventKind::Access(AccessKind::Any)).add_path(path.clone());
        assert!(!filter.is_relevant(&read));

        let write = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path);
        assert!(filter.is_relevant(&write));
    }

    #[test]
    fn test_coalesce_drains_queue() {
        let filter = filter();
        let (tx, rx) = mpsc::channel();
        for name in ["a.js", "b.js"] {
            let event = Event::new(EventKind::Create(CreateKind::File))
                .add_path(PathBuf::from(format!("/project/app/{}", name)));
            tx.send(Ok(event)).unwrap();
        }
        let outside = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/project/dist/x.zip"));
        tx.send(Ok(outside)).unwrap();

        assert_eq!(coalesce(&rx, &filter), 2);
        assert_eq!(coalesce(&rx, &filter), 0);
    }
}

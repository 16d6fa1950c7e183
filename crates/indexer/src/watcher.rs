use crate::cache::{relative_to_root, IndexCache};
use crate::config::WatcherConfig;
use crate::{IndexerError, Result};
use log::{debug, info, warn};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use promptdir_protocol::names;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Upsert,
    Remove,
}

/// One index mutation derived from a filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn upsert(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Upsert,
            path: path.into(),
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Remove,
            path: path.into(),
        }
    }
}

enum WatcherCommand {
    Shutdown,
}

struct ActiveWatch {
    _watcher: RecommendedWatcher,
    command_tx: mpsc::Sender<WatcherCommand>,
}

/// Keeps an [`IndexCache`] in sync with its root directory.
///
/// The OS callback only forwards raw notifications into a channel. A single
/// consumer task turns them into [`WatchEvent`]s and applies them to the
/// cache in arrival order.
pub struct ChangeWatcher {
    cache: Arc<IndexCache>,
    config: WatcherConfig,
    active: Mutex<Option<ActiveWatch>>,
}

impl ChangeWatcher {
    pub fn new(cache: Arc<IndexCache>, config: WatcherConfig) -> Self {
        Self {
            cache,
            config,
            active: Mutex::new(None),
        }
    }

    /// Start watching the cache root. Returns `false` if already attached.
    ///
    /// Must be called from within a tokio runtime. Only changes made after
    /// this call are delivered.
    pub fn attach(&self) -> Result<bool> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| IndexerError::Watch("watcher state lock poisoned".to_string()))?;
        if active.is_some() {
            return Ok(false);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| IndexerError::Watch(format!("no async runtime: {e}")))?;

        let root = self.cache.root().to_path_buf();
        std::fs::create_dir_all(&root)?;

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (command_tx, command_rx) = mpsc::channel(4);
        let watcher = create_fs_watcher(&root, event_tx, &self.config)?;

        runtime.spawn(run_event_loop(
            Arc::clone(&self.cache),
            root.clone(),
            event_rx,
            command_rx,
        ));

        *active = Some(ActiveWatch {
            _watcher: watcher,
            command_tx,
        });
        info!("Watching {} for prompt changes", root.display());
        Ok(true)
    }

    /// Release the OS watch and stop the consumer. Returns `false` if the
    /// watcher was not attached. A later [`attach`](Self::attach) starts over.
    pub fn detach(&self) -> bool {
        let taken = match self.active.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(active) = taken else {
            return false;
        };
        let _ = active.command_tx.try_send(WatcherCommand::Shutdown);
        drop(active);
        info!("Stopped watching {}", self.cache.root().display());
        true
    }

    pub fn is_attached(&self) -> bool {
        self.active.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.detach();
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    config: &WatcherConfig,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(config.poll_interval),
    )
    .map_err(|e| IndexerError::Watch(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| IndexerError::Watch(format!("failed to watch {}: {e}", root.display())))?;
    Ok(watcher)
}

async fn run_event_loop(
    cache: Arc<IndexCache>,
    root: PathBuf,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
) {
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => handle_event(&cache, &root, event).await,
            cmd = command_rx.recv() => match cmd {
                Some(WatcherCommand::Shutdown) | None => break,
            },
        }
    }
    debug!("Watcher loop for {} finished", root.display());
}

async fn handle_event(cache: &IndexCache, root: &Path, event: notify::Result<Event>) {
    match event {
        Ok(evt) => {
            for change in translate_event(root, &evt) {
                cache.apply(&change).await;
            }
        }
        Err(err) => warn!("Watcher error: {err}"),
    }
}

/// Map a raw notification to index mutations, dropping hidden and
/// non-document paths.
pub fn translate_event(root: &Path, event: &Event) -> Vec<WatchEvent> {
    let mut out = Vec::new();
    match &event.kind {
        EventKind::Create(_)
        | EventKind::Access(AccessKind::Close(AccessMode::Write))
        | EventKind::Modify(
            ModifyKind::Any | ModifyKind::Data(_) | ModifyKind::Metadata(_) | ModifyKind::Other,
        ) => {
            for path in &event.paths {
                push_by_existence(root, path, &mut out);
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
            (RenameMode::From, paths) => {
                for path in paths {
                    push_relevant(root, WatchEvent::remove(path.clone()), &mut out);
                }
            }
            (RenameMode::To, paths) => {
                for path in paths {
                    push_relevant(root, WatchEvent::upsert(path.clone()), &mut out);
                }
            }
            (RenameMode::Both, [from, to]) => {
                push_relevant(root, WatchEvent::remove(from.clone()), &mut out);
                push_relevant(root, WatchEvent::upsert(to.clone()), &mut out);
            }
            (_, paths) => {
                for path in paths {
                    push_by_existence(root, path, &mut out);
                }
            }
        },
        EventKind::Remove(_) => {
            for path in &event.paths {
                push_relevant(root, WatchEvent::remove(path.clone()), &mut out);
            }
        }
        _ => {}
    }
    out
}

// Backends that cannot tell a rename-away from a write report both as a
// generic change; the file's presence decides.
fn push_by_existence(root: &Path, path: &Path, out: &mut Vec<WatchEvent>) {
    let event = if path.exists() {
        WatchEvent::upsert(path)
    } else {
        WatchEvent::remove(path)
    };
    push_relevant(root, event, out);
}

fn push_relevant(root: &Path, event: WatchEvent, out: &mut Vec<WatchEvent>) {
    if is_relevant_path(root, &event.path) {
        out.push(event);
    }
}

fn is_relevant_path(root: &Path, path: &Path) -> bool {
    let Some(relative) = relative_to_root(root, path) else {
        return false;
    };
    let relative = relative.to_string_lossy();
    names::is_document_path(&relative) && !names::is_hidden_rel_path(&relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: &[&Path]) -> Event {
        let mut evt = Event::new(kind);
        for path in paths {
            evt = evt.add_path(path.to_path_buf());
        }
        evt
    }

    #[test]
    fn create_and_modify_become_upserts() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        let file = root.join("new.md");
        std::fs::write(&file, "x").unwrap();

        let created = translate_event(root, &event(EventKind::Create(CreateKind::File), &[&file]));
        assert_eq!(created, vec![WatchEvent::upsert(file.clone())]);

        let modified = translate_event(
            root,
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &[&file]),
        );
        assert_eq!(modified, vec![WatchEvent::upsert(file)]);
    }

    #[test]
    fn modify_of_vanished_file_becomes_remove() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("gone.md");

        let out = translate_event(
            temp.path(),
            &event(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), &[&file]),
        );
        assert_eq!(out, vec![WatchEvent::remove(file)]);
    }

    #[test]
    fn remove_and_rename_map_to_mutations() {
        let root = PathBuf::from("/prompts");
        let old = root.join("old.md");
        let new = root.join("team/new.md");

        let removed = translate_event(&root, &event(EventKind::Remove(RemoveKind::File), &[&old]));
        assert_eq!(removed, vec![WatchEvent::remove(old.clone())]);

        let renamed = translate_event(
            &root,
            &event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &[&old, &new]),
        );
        assert_eq!(
            renamed,
            vec![WatchEvent::remove(old.clone()), WatchEvent::upsert(new.clone())]
        );

        let from = translate_event(
            &root,
            &event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &[&old]),
        );
        assert_eq!(from, vec![WatchEvent::remove(old)]);

        let to = translate_event(
            &root,
            &event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &[&new]),
        );
        assert_eq!(to, vec![WatchEvent::upsert(new)]);
    }

    #[test]
    fn hidden_foreign_and_non_document_paths_are_dropped() {
        let root = PathBuf::from("/prompts");
        let remove = |path: PathBuf| {
            translate_event(&root, &event(EventKind::Remove(RemoveKind::Any), &[&path]))
        };

        assert!(remove(root.join(".hidden/x.md")).is_empty());
        assert!(remove(root.join("team/.draft.md")).is_empty());
        assert!(remove(root.join("notes.txt")).is_empty());
        assert!(remove(PathBuf::from("/elsewhere/x.md")).is_empty());
    }

    #[test]
    fn access_events_other_than_close_write_are_ignored() {
        let root = PathBuf::from("/prompts");
        let file = root.join("a.md");
        let out = translate_event(
            &root,
            &event(EventKind::Access(AccessKind::Close(AccessMode::Read)), &[&file]),
        );
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn attach_is_idempotent_and_detach_resets() {
        let temp = tempdir().unwrap();
        let cache = Arc::new(IndexCache::new(&IndexConfig::new(temp.path())));
        let watcher = ChangeWatcher::new(cache, WatcherConfig::default());

        assert!(!watcher.is_attached());
        assert!(watcher.attach().unwrap());
        assert!(!watcher.attach().unwrap());
        assert!(watcher.is_attached());

        assert!(watcher.detach());
        assert!(!watcher.detach());
        assert!(!watcher.is_attached());

        assert!(watcher.attach().unwrap());
        assert!(watcher.detach());
    }

    #[test]
    fn attach_outside_runtime_is_an_error() {
        let temp = tempdir().unwrap();
        let cache = Arc::new(IndexCache::new(&IndexConfig::new(temp.path())));
        let watcher = ChangeWatcher::new(cache, WatcherConfig::default());

        let err = watcher.attach().unwrap_err();
        assert!(matches!(err, IndexerError::Watch(_)));
        assert!(!watcher.is_attached());
    }
}

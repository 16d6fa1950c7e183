use crate::config::IndexConfig;
use crate::loader::load_record;
use crate::scanner::DirectoryScanner;
use crate::watcher::{WatchEvent, WatchEventKind};
use crate::{IndexerError, LoadStats, Result};
use promptdir_protocol::{names, PromptRecord};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

/// In-memory name → record index over a prompt directory.
///
/// Every operation takes the map lock for its whole duration, so readers see
/// either the state before or after a mutation, never a partial one.
///
/// `mutation_gate` orders mutations: a bulk load holds it exclusively from
/// scan to swap, single-file upserts and removals share it. A watcher event
/// that arrives mid-load is applied after the swap instead of being lost.
pub struct IndexCache {
    root: PathBuf,
    max_depth: usize,
    records: RwLock<HashMap<String, PromptRecord>>,
    mutation_gate: RwLock<()>,
    load_permits: Arc<Semaphore>,
}

impl IndexCache {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_depth: config.max_depth,
            records: RwLock::new(HashMap::new()),
            mutation_gate: RwLock::new(()),
            load_permits: Arc::new(Semaphore::new(config.load_concurrency.max(1))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the whole index from disk.
    ///
    /// Creates the root if it is missing, scans it, loads every document
    /// concurrently and replaces the map in one step. Files that fail to load
    /// are left out; they never fail the call.
    pub async fn bulk_load(&self) -> Result<LoadStats> {
        let _exclusive = self.mutation_gate.write().await;
        let started = Instant::now();

        tokio::fs::create_dir_all(&self.root).await?;

        let scanner = DirectoryScanner::new(&self.root).with_max_depth(self.max_depth);
        let report = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| IndexerError::Other(format!("scan task failed: {e}")))?;

        let mut stats = LoadStats::new();
        stats.files = report.files.len();
        stats.scan_warnings = report.warnings.len();

        let root: Arc<Path> = Arc::from(self.root.as_path());
        let mut tasks = JoinSet::new();
        for rel_path in report.files {
            let root = Arc::clone(&root);
            let permits = Arc::clone(&self.load_permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                load_record(&root, &rel_path).await
            });
        }

        let mut fresh = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => {
                    stats.add_loaded();
                    fresh.insert(record.name.clone(), record);
                }
                Ok(None) => stats.add_failure(),
                Err(err) => {
                    log::warn!("Prompt load task failed: {err}");
                    stats.add_failure();
                }
            }
        }

        {
            let mut records = self.records.write().await;
            records.clear();
            records.extend(fresh);
        }

        #[allow(clippy::cast_possible_truncation)]
        let time_ms = started.elapsed().as_millis() as u64;
        stats.time_ms = time_ms;
        log::info!(
            "Loaded {} of {} prompts from {} in {}ms ({} failed)",
            stats.loaded,
            stats.files,
            self.root.display(),
            stats.time_ms,
            stats.failed
        );
        Ok(stats)
    }

    /// Reload one document and insert or overwrite its record.
    ///
    /// `path` may be absolute (under the root) or root-relative. Returns the
    /// record name when the map was updated.
    pub async fn upsert_from_path(&self, path: &Path) -> Option<String> {
        let rel_path = self.document_rel_path(path)?;
        let _shared = self.mutation_gate.read().await;
        let record = load_record(&self.root, &rel_path).await?;
        let name = record.name.clone();
        self.records.write().await.insert(name.clone(), record);
        log::debug!("Indexed prompt {name} from {}", rel_path.display());
        Some(name)
    }

    /// Drop the record a path maps to, without touching the filesystem.
    ///
    /// Returns `true` when a record was removed.
    pub async fn remove_from_path(&self, path: &Path) -> bool {
        let Some(rel_path) = self.document_rel_path(path) else {
            return false;
        };
        let Some(name) = names::canonical_name(&rel_path.to_string_lossy()) else {
            return false;
        };
        let _shared = self.mutation_gate.read().await;
        let removed = self.records.write().await.remove(&name).is_some();
        if removed {
            log::debug!("Removed prompt {name}");
        }
        removed
    }

    /// Apply one watcher event.
    pub async fn apply(&self, event: &WatchEvent) {
        match event.kind {
            WatchEventKind::Upsert => {
                if let Some(name) = self.upsert_from_path(&event.path).await {
                    log::info!("Prompt {name} changed");
                }
            }
            WatchEventKind::Remove => {
                if self.remove_from_path(&event.path).await {
                    log::info!("Prompt at {} removed", event.path.display());
                }
            }
        }
    }

    /// Point-in-time copy of every record, ordered by name.
    pub async fn snapshot(&self) -> Vec<PromptRecord> {
        let mut records: Vec<PromptRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub async fn lookup(&self, name: &str) -> Option<PromptRecord> {
        self.records.read().await.get(name).cloned()
    }

    /// Also true for a directory with no documents, which therefore gets
    /// reloaded on every readiness check.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn document_rel_path(&self, path: &Path) -> Option<PathBuf> {
        let Some(rel_path) = relative_to_root(&self.root, path) else {
            log::debug!("Ignoring path outside prompt root: {}", path.display());
            return None;
        };
        if rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            log::debug!("Ignoring path escaping prompt root: {}", path.display());
            return None;
        }
        let rel = rel_path.to_string_lossy();
        if !names::is_document_path(&rel) {
            log::debug!("Ignoring non-document path: {}", path.display());
            return None;
        }
        if names::is_hidden_rel_path(&rel) {
            log::debug!("Ignoring hidden path: {}", path.display());
            return None;
        }
        Some(rel_path)
    }
}

/// Root-relative form of `path`. Absolute paths must live under `root` (or
/// under its canonical form, since watch backends may report resolved paths).
pub(crate) fn relative_to_root(root: &Path, path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() {
        return Some(path.to_path_buf());
    }
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }
    let canonical = std::fs::canonicalize(root).ok()?;
    path.strip_prefix(&canonical).ok().map(Path::to_path_buf)
}

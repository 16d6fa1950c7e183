use crate::cache::IndexCache;
use crate::config::{IndexConfig, WatcherConfig};
use crate::front_matter::{parse_front_matter, render_document};
use crate::resolver::NameResolver;
use crate::template::substitute_arguments;
use crate::watcher::ChangeWatcher;
use crate::{IndexerError, Result};
use promptdir_protocol::{names, Attributes, PromptRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Header and body of a prompt to be written.
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub attributes: Attributes,
    pub body: String,
}

/// Entry point for callers: listing goes through the index, single-prompt
/// reads go straight to disk.
pub struct PromptFiles {
    cache: Arc<IndexCache>,
    watcher: ChangeWatcher,
    resolver: NameResolver,
    init_lock: Mutex<()>,
}

impl PromptFiles {
    pub fn new(config: IndexConfig) -> Self {
        let cache = Arc::new(IndexCache::new(&config));
        let mut files = Self::with_cache(cache, config.watcher);
        files.resolver = files.resolver.with_max_depth(config.max_depth);
        files
    }

    pub fn with_cache(cache: Arc<IndexCache>, watcher_config: WatcherConfig) -> Self {
        let resolver = NameResolver::new(cache.root());
        let watcher = ChangeWatcher::new(Arc::clone(&cache), watcher_config);
        Self {
            cache,
            watcher,
            resolver,
            init_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        self.cache.root()
    }

    pub fn cache(&self) -> &Arc<IndexCache> {
        &self.cache
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    /// Load the index if it is empty and make sure the watcher runs.
    ///
    /// Concurrent callers wait for the first one. A root with no documents
    /// stays empty, so every call reloads it.
    pub async fn ensure_ready(&self) -> Result<()> {
        let _init = self.init_lock.lock().await;
        if self.cache.is_empty().await {
            self.cache.bulk_load().await?;
        }
        if let Err(err) = self.watcher.attach() {
            log::warn!("Prompt watcher unavailable, index will not follow changes: {err}");
        }
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<PromptRecord>> {
        self.ensure_ready().await?;
        Ok(self.cache.snapshot().await)
    }

    /// Raw bytes of the document for `name`, found on disk without the index.
    pub async fn get_content(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolver.resolve_async(name).await?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(IndexerError::not_found(name))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Indexed metadata for `name`. Nested names (`team/review`) are also
    /// tried in their flattened form.
    pub async fn get_metadata(&self, name: &str) -> Option<PromptRecord> {
        if let Some(record) = self.cache.lookup(name).await {
            return Some(record);
        }
        let flattened = names::canonical_name(&format!("{name}.{}", names::DOCUMENT_EXTENSION))?;
        if flattened == name {
            return None;
        }
        self.cache.lookup(&flattened).await
    }

    /// Body of `name` with its header removed and `{{key}}` arguments filled in.
    pub async fn render(&self, name: &str, args: &HashMap<String, String>) -> Result<String> {
        let bytes = self.get_content(name).await?;
        let content = String::from_utf8(bytes)
            .map_err(|e| IndexerError::Other(format!("prompt {name} is not UTF-8: {e}")))?;
        let doc = parse_front_matter(&content)?;
        Ok(substitute_arguments(&doc.body, args))
    }

    /// Write `content` to `<root>/<sanitized name>.md` and index it.
    pub async fn save(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file_name = Self::file_name_for(name)?;
        tokio::fs::create_dir_all(self.root()).await?;
        let path = self.root().join(&file_name);
        tokio::fs::write(&path, content).await?;
        if self.cache.upsert_from_path(Path::new(&file_name)).await.is_none() {
            log::warn!("Saved {} but it could not be indexed", path.display());
        }
        log::info!("Saved prompt {name} to {}", path.display());
        Ok(path)
    }

    pub async fn save_structured(&self, name: &str, prompt: &NewPrompt) -> Result<PathBuf> {
        let content = render_document(&prompt.attributes, &prompt.body)?;
        self.save(name, &content).await
    }

    /// Delete the document for `name` and drop it from the index. Returns the
    /// removed path.
    pub async fn delete(&self, name: &str) -> Result<PathBuf> {
        let path = self.resolver.resolve_async(name).await?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IndexerError::not_found(name));
            }
            Err(err) => return Err(err.into()),
        }
        self.cache.remove_from_path(&path).await;
        log::info!("Deleted prompt {name} ({})", path.display());
        Ok(path)
    }

    /// Stop following filesystem changes. The index stays readable.
    pub fn shutdown(&self) -> bool {
        self.watcher.detach()
    }

    fn file_name_for(name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(IndexerError::InvalidName(name.to_string()));
        }
        Ok(names::document_file_name(trimmed))
    }
}

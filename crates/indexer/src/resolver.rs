use crate::config::DEFAULT_MAX_DEPTH;
use crate::scanner::DirectoryScanner;
use crate::{IndexerError, Result};
use promptdir_protocol::names::{self, sanitize_name};
use std::path::{Path, PathBuf};

/// Maps a logical prompt name to the file that holds it.
///
/// Names may be flat (`code-review`) or nested (`team/review`). Lookup first
/// tries `<root>/<sanitized>.md`, then walks the tree looking for an exact
/// match on the extension-less relative path and falls back to a match on
/// the sanitized form.
#[derive(Debug, Clone)]
pub struct NameResolver {
    root: PathBuf,
    max_depth: usize,
}

impl NameResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the document for `name`.
    ///
    /// # Errors
    ///
    /// [`IndexerError::NotFound`] when no document matches.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IndexerError::not_found(name));
        }

        let direct = self.root.join(names::document_file_name(name));
        if direct.is_file() {
            return Ok(direct);
        }

        let requested = names::normalize_rel_path(name);
        let sanitized = sanitize_name(&requested);
        let report = DirectoryScanner::new(&self.root)
            .with_max_depth(self.max_depth)
            .scan();

        let mut fallback: Option<PathBuf> = None;
        for rel_path in report.files {
            let Some(logical) = names::logical_name(&rel_path.to_string_lossy()) else {
                continue;
            };
            if logical == requested {
                return Ok(self.root.join(rel_path));
            }
            if fallback.is_none() && sanitize_name(&logical) == sanitized {
                fallback = Some(rel_path);
            }
        }

        match fallback {
            Some(rel_path) => {
                log::debug!("Resolved {name} via sanitized match {}", rel_path.display());
                Ok(self.root.join(rel_path))
            }
            None => Err(IndexerError::not_found(name)),
        }
    }

    /// Async wrapper that runs the walk on the blocking pool.
    pub async fn resolve_async(&self, name: &str) -> Result<PathBuf> {
        let resolver = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || resolver.resolve(&name))
            .await
            .map_err(|e| IndexerError::Other(format!("resolve task failed: {e}")))?
    }
}

use crate::config::DEFAULT_MAX_DEPTH;
use ignore::WalkBuilder;
use promptdir_protocol::names;
use std::path::{Path, PathBuf};

/// A subtree or entry the scanner could not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Result of a scan: every document found plus what had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Root-relative paths of document files, in no particular order.
    pub files: Vec<PathBuf>,
    pub warnings: Vec<ScanWarning>,
}

/// Scanner for finding prompt documents under a root directory
pub struct DirectoryScanner {
    root: PathBuf,
    max_depth: usize,
}

impl DirectoryScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Walk the root and collect documents, skipping hidden entries and
    /// their subtrees. Unreadable entries become warnings.
    pub fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();

        for result in self.walker().build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }
                    let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                        continue;
                    };
                    if !names::is_document_path(&relative.to_string_lossy()) {
                        continue;
                    }
                    report.files.push(relative.to_path_buf());
                }
                Err(err) => {
                    log::warn!("Skipping unreadable entry under {}: {err}", self.root.display());
                    report.warnings.push(ScanWarning {
                        path: error_path(&err),
                        message: err.to_string(),
                    });
                }
            }
        }

        log::debug!(
            "Found {} prompt documents under {} ({} warnings)",
            report.files.len(),
            self.root.display(),
            report.warnings.len()
        );
        report
    }

    fn walker(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .require_git(false)
            .follow_links(true)
            .max_depth(Some(self.max_depth));
        builder
    }
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}

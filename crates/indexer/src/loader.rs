use crate::front_matter::parse_front_matter;
use crate::{IndexerError, Result};
use promptdir_protocol::{names, PromptRecord};
use std::path::Path;

/// Load one document, logging and swallowing failures.
///
/// `None` means the file contributes nothing to the index.
pub async fn load_record(root: &Path, rel_path: &Path) -> Option<PromptRecord> {
    match try_load_record(root, rel_path).await {
        Ok(record) => Some(record),
        Err(err) => {
            log::warn!("{err}");
            None
        }
    }
}

/// Load one document, returning the cause on failure.
pub async fn try_load_record(root: &Path, rel_path: &Path) -> Result<PromptRecord> {
    let rel = rel_path.to_string_lossy();
    let name = names::canonical_name(&rel).ok_or_else(|| IndexerError::LoadFailure {
        path: rel_path.to_path_buf(),
        reason: format!("not a .{} document", names::DOCUMENT_EXTENSION),
    })?;

    let full_path = root.join(rel_path);
    let failure = |reason: String| IndexerError::LoadFailure {
        path: full_path.clone(),
        reason,
    };

    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|e| failure(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| failure(e.to_string()))?;
    let doc = parse_front_matter(&content).map_err(|e| failure(e.to_string()))?;

    Ok(PromptRecord::new(name, doc.attributes, &doc.body))
}

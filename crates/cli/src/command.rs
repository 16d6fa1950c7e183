//! Subcommand handlers. Results go to stdout, diagnostics to the log.

use crate::print_stdout;
use anyhow::Result;
use promptdir_indexer::{IndexerError, NewPrompt, PromptFiles};
use promptdir_protocol::{serialize_json, Attributes, PromptRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Header attributes given on the command line for `add`.
#[derive(Debug, Default)]
pub(crate) struct HeaderFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl HeaderFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_empty()
    }

    fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        for (key, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
        ] {
            if let Some(value) = value {
                attributes.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if !self.tags.is_empty() {
            attributes.insert(
                "tags".to_string(),
                Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
            );
        }
        attributes
    }
}

#[derive(Serialize)]
struct PathOutput<'a> {
    name: &'a str,
    path: &'a Path,
}

fn format_line(record: &PromptRecord) -> String {
    format!(
        "{}  {}  {}",
        record.name,
        record.title().unwrap_or("-"),
        record.preview
    )
}

pub(crate) async fn list(files: &PromptFiles, json: bool) -> Result<()> {
    let records = files.list_all().await?;
    if json {
        return print_stdout(&serialize_json(&records)?);
    }
    if records.is_empty() {
        log::info!("No prompts in {}", files.root().display());
        return Ok(());
    }
    let lines: Vec<String> = records.iter().map(format_line).collect();
    print_stdout(&lines.join("\n"))
}

pub(crate) async fn get(files: &PromptFiles, name: &str) -> Result<()> {
    let bytes = files.get_content(name).await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

pub(crate) async fn meta(files: &PromptFiles, name: &str, json: bool) -> Result<()> {
    // One-shot read: load the index without attaching a watcher.
    if files.cache().is_empty().await {
        files.cache().bulk_load().await?;
    }
    let record = files
        .get_metadata(name)
        .await
        .ok_or_else(|| IndexerError::not_found(name))?;
    if json {
        return print_stdout(&serialize_json(&record)?);
    }
    let mut out = vec![format!("name: {}", record.name)];
    for (key, value) in &record.attributes {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push(format!("{key}: {shown}"));
    }
    out.push(format!("preview: {}", record.preview));
    print_stdout(&out.join("\n"))
}

pub(crate) async fn render(
    files: &PromptFiles,
    name: &str,
    arguments: &HashMap<String, String>,
) -> Result<()> {
    let rendered = files.render(name, arguments).await?;
    print_stdout(&rendered)
}

pub(crate) async fn add(
    files: &PromptFiles,
    name: &str,
    content: String,
    header: &HeaderFields,
    json: bool,
) -> Result<()> {
    let path = if header.is_empty() {
        files.save(name, &content).await?
    } else {
        let prompt = NewPrompt {
            attributes: header.to_attributes(),
            body: content,
        };
        files.save_structured(name, &prompt).await?
    };
    if json {
        return print_stdout(&serialize_json(&PathOutput { name, path: &path })?);
    }
    print_stdout(&path.display().to_string())
}

pub(crate) async fn delete(files: &PromptFiles, name: &str, json: bool) -> Result<()> {
    let path = files.delete(name).await?;
    if json {
        return print_stdout(&serialize_json(&PathOutput { name, path: &path })?);
    }
    log::info!("Deleted {}", path.display());
    Ok(())
}

pub(crate) async fn watch(files: &PromptFiles) -> Result<()> {
    let stats = files.cache().bulk_load().await?;
    log::info!(
        "Indexed {} prompts from {} files in {}ms",
        stats.loaded,
        stats.files,
        stats.time_ms
    );
    if !files.watcher().attach()? {
        log::debug!("Watcher was already attached");
    }
    log::info!("Watching {} (Ctrl-C to stop)", files.root().display());
    tokio::signal::ctrl_c().await?;
    files.shutdown();
    log::info!("Stopped watching; {} prompts indexed", files.cache().len().await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields_become_attributes() {
        let header = HeaderFields {
            title: Some("Code Review".into()),
            description: None,
            category: Some("development".into()),
            tags: vec!["review".into(), "quality".into()],
        };
        let attributes = header.to_attributes();
        assert_eq!(attributes["title"], "Code Review");
        assert_eq!(attributes["category"], "development");
        assert_eq!(attributes["tags"], serde_json::json!(["review", "quality"]));
        assert!(!attributes.contains_key("description"));
        assert!(HeaderFields::default().is_empty());
    }

    #[tokio::test]
    async fn meta_loads_index_without_attaching_watcher() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("note.md"), "---\ntitle: Note\n---\nbody").unwrap();
        let files = PromptFiles::new(promptdir_indexer::IndexConfig::new(temp.path()));

        meta(&files, "note", true).await.unwrap();

        assert_eq!(files.cache().len().await, 1);
        assert!(!files.watcher().is_attached());
        let err = meta(&files, "missing", true).await.unwrap_err();
        assert!(err
            .downcast_ref::<IndexerError>()
            .is_some_and(IndexerError::is_not_found));
    }

    #[test]
    fn list_line_falls_back_when_title_is_missing() {
        let record = PromptRecord::new("plain", Attributes::new(), "Just a body");
        assert_eq!(format_line(&record), "plain  -  Just a body...");
    }
}

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod names;

pub use names::{canonical_name, logical_name, sanitize_name, DOCUMENT_EXTENSION};

/// Front-matter attributes of a prompt document.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Number of body characters kept in a record preview.
pub const PREVIEW_CHARS: usize = 100;

const PREVIEW_ELLIPSIS: &str = "...";

/// One indexed prompt document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct PromptRecord {
    /// Canonical name derived from the root-relative path.
    pub name: String,
    /// Structured header of the document. No key is required.
    #[serde(default)]
    pub attributes: Attributes,
    /// Short single-line excerpt of the body.
    pub preview: String,
}

impl PromptRecord {
    pub fn new(name: impl Into<String>, attributes: Attributes, body: &str) -> Self {
        Self {
            name: name.into(),
            attributes,
            preview: preview_of(body),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.str_attribute("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_attribute("description")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_attribute("category")
    }

    /// Tags, accepting either a YAML list or a comma separated string.
    pub fn tags(&self) -> Vec<String> {
        match self.attributes.get("tags") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(serde_json::Value::String(raw)) => raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Preview text: the first [`PREVIEW_CHARS`] characters of `body`, newlines
/// collapsed to spaces, trimmed, with a trailing ellipsis.
pub fn preview_of(body: &str) -> String {
    let head: String = body
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("{}{PREVIEW_ELLIPSIS}", head.trim())
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

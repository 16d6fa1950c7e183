//! YAML front matter: the structured header at the start of a prompt document.
//!
//! ```text
//! ---
//! title: Code Review
//! tags: [review]
//! ---
//!
//! You are an experienced reviewer...
//! ```

use crate::{IndexerError, Result};
use promptdir_protocol::Attributes;

const DELIMITER: &str = "---";

/// A document split into its header attributes and body text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub attributes: Attributes,
    pub body: String,
}

/// Split `content` into front-matter attributes and body.
///
/// Content without an opening delimiter, or with an opening delimiter that is
/// never closed, has no header: the whole content is the body. A header that
/// is not a mapping yields empty attributes.
///
/// # Errors
///
/// Returns [`IndexerError::FrontMatter`] when the header is not valid YAML.
pub fn parse_front_matter(content: &str) -> Result<ParsedDocument> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();

    let Some((header, body)) = split_header(trimmed) else {
        return Ok(ParsedDocument {
            attributes: Attributes::new(),
            body: content.to_string(),
        });
    };

    let attributes = if header.trim().is_empty() {
        Attributes::new()
    } else {
        let value: serde_json::Value = serde_yaml_ng::from_str(header)
            .map_err(|e| IndexerError::FrontMatter(e.to_string()))?;
        match value {
            serde_json::Value::Object(map) => map,
            _ => Attributes::new(),
        }
    };

    Ok(ParsedDocument {
        attributes,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

/// Returns `(header, body)` when `content` opens and closes a header block.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let header = &content[header_start..offset];
            let body = &content[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Render attributes and body back into document form.
///
/// # Errors
///
/// Returns [`IndexerError::FrontMatter`] if the attributes cannot be encoded.
pub fn render_document(attributes: &Attributes, body: &str) -> Result<String> {
    if attributes.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml_ng::to_string(attributes)
        .map_err(|e| IndexerError::FrontMatter(e.to_string()))?;
    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    Ok(out)
}

//! Naming rules shared by the index, the resolver, and callers.
//!
//! All functions take root-relative paths as strings. Both `/` and `\` are
//! accepted as separators; results always use `/`.

/// Extension (without the dot) of files treated as prompt documents.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Separator used when flattening nested paths into canonical names.
pub const NAME_SEPARATOR: char = '_';

const DOCUMENT_SUFFIX: &str = ".md";

/// Normalize a root-relative path: `/` separators, no leading `./`, no
/// leading or trailing slashes.
pub fn normalize_rel_path(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while value.starts_with("./") {
        value = value[2..].to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

/// True when `rel_path` names a prompt document.
pub fn is_document_path(rel_path: &str) -> bool {
    let normalized = normalize_rel_path(rel_path);
    normalized.len() > DOCUMENT_SUFFIX.len() && normalized.ends_with(DOCUMENT_SUFFIX)
}

/// True when any component of `rel_path` starts with the hidden-file marker.
pub fn is_hidden_rel_path(rel_path: &str) -> bool {
    normalize_rel_path(rel_path)
        .split('/')
        .any(|component| component.starts_with('.'))
}

/// Root-relative path with the document extension stripped, `/` separated.
///
/// This is the form nested-path lookups compare against (`team/review`).
pub fn logical_name(rel_path: &str) -> Option<String> {
    let normalized = normalize_rel_path(rel_path);
    if !is_document_path(&normalized) {
        return None;
    }
    let stem = &normalized[..normalized.len() - DOCUMENT_SUFFIX.len()];
    Some(stem.to_string())
}

/// Canonical index key for a document: the logical name with every path
/// separator flattened to [`NAME_SEPARATOR`].
///
/// `a/b.md` and `a_b.md` both map to `a_b`.
pub fn canonical_name(rel_path: &str) -> Option<String> {
    logical_name(rel_path).map(|stem| stem.replace('/', &NAME_SEPARATOR.to_string()))
}

/// Lowercase `name` and replace every character outside `[a-z0-9-_]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name used when a prompt is saved under `name`.
pub fn document_file_name(name: &str) -> String {
    format!("{}{DOCUMENT_SUFFIX}", sanitize_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_name_flattens_nested_paths() {
        assert_eq!(canonical_name("a/b.md").as_deref(), Some("a_b"));
        assert_eq!(canonical_name("a_b.md").as_deref(), Some("a_b"));
        assert_eq!(canonical_name("team\\review.md").as_deref(), Some("team_review"));
        assert_eq!(canonical_name("code-review.md").as_deref(), Some("code-review"));
    }

    #[test]
    fn non_documents_have_no_name() {
        assert_eq!(canonical_name("notes.txt"), None);
        assert_eq!(canonical_name(".md"), None);
        assert_eq!(canonical_name("README.MD"), None);
    }

    #[test]
    fn logical_name_keeps_separators() {
        assert_eq!(logical_name("./team/review.md").as_deref(), Some("team/review"));
    }

    #[test]
    fn sanitize_lowercases_and_replaces() {
        assert_eq!(sanitize_name("Code Review"), "code_review");
        assert_eq!(sanitize_name("TEAM/REVIEW"), "team_review");
        assert_eq!(sanitize_name("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_name("café"), "caf_");
    }

    #[test]
    fn hidden_detection_checks_every_component() {
        assert!(is_hidden_rel_path(".hidden/x.md"));
        assert!(is_hidden_rel_path("team/.draft.md"));
        assert!(!is_hidden_rel_path("./team/review.md"));
    }

    #[test]
    fn normalize_strips_dot_prefix_and_slashes() {
        assert_eq!(normalize_rel_path("./a/b/"), "a/b");
        assert_eq!(normalize_rel_path("."), "");
        assert_eq!(normalize_rel_path("a\\b.md"), "a/b.md");
    }
}

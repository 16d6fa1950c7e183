//! `{{argument}}` substitution in prompt bodies.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)\s*\}\}").expect("valid placeholder pattern")
});

/// Replace every `{{key}}` whose key is in `args`. Unknown placeholders stay.
pub fn substitute_arguments(body: &str, args: &HashMap<String, String>) -> String {
    if args.is_empty() {
        return body.to_string();
    }
    PLACEHOLDER
        .replace_all(body, |caps: &Captures<'_>| match args.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names, in order of first appearance.
pub fn placeholders(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(body)
        .filter_map(|caps| {
            let name = caps[1].to_string();
            seen.insert(name.clone()).then_some(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_and_keeps_unknown() {
        let body = "Review {{ language }} code in {{repo}}; ask {{owner}}.";
        let out = substitute_arguments(body, &args(&[("language", "Rust"), ("repo", "core")]));
        assert_eq!(out, "Review Rust code in core; ask {{owner}}.");
    }

    #[test]
    fn repeated_placeholders_are_all_replaced() {
        let out = substitute_arguments("{{x}}+{{x}}", &args(&[("x", "1")]));
        assert_eq!(out, "1+1");
    }

    #[test]
    fn values_are_inserted_literally() {
        let out = substitute_arguments("cost: {{price}}", &args(&[("price", "$1 {{x}}")]));
        assert_eq!(out, "cost: $1 {{x}}");
    }

    #[test]
    fn placeholders_are_listed_once_in_order() {
        assert_eq!(
            placeholders("{{b}} {{a}} {{ b }} {not} {{c-d}}"),
            vec!["b".to_string(), "a".to_string(), "c-d".to_string()]
        );
    }
}

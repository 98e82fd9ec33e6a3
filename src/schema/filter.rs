//! Allow-list filtering of the schema document.
//!
//! # Design Decisions
//! - Method matching is case-insensitive (entries are normalized to
//!   upper-case at parse time)
//! - Path matching is exact and case-sensitive, parameter braces included:
//!   `/pets/{petId}` matches only that literal placeholder name
//! - An allow list that matches nothing is a misconfiguration, not a valid
//!   empty proxy

use std::collections::BTreeMap;

use thiserror::Error;

use crate::schema::document::SchemaDocument;

/// Errors raised while narrowing the schema to the allow list.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The allow list filtered every operation out.
    #[error("no endpoints matched the allow list")]
    NoMatchingEndpoints,
}

/// A single `METHOD:/path` allow-list entry.
///
/// Only used while constructing the route table; methods are stored
/// upper-cased so matching against schema keys is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListEntry {
    method: String,
    path: String,
}

impl AllowListEntry {
    /// Parse an entry of the form `METHOD:/path`. Returns `None` when the
    /// separator is missing or the path does not start with `/`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (method, path) = raw.split_once(':')?;
        if method.is_empty() || !path.starts_with('/') {
            return None;
        }
        Some(Self {
            method: method.to_uppercase(),
            path: path.to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method.to_uppercase() && self.path == path
    }
}

/// Produce a new document containing only the (method, path) pairs named by
/// the allow list, preserving operation descriptors unchanged.
pub fn filter_endpoints(
    document: &SchemaDocument,
    allow_list: &[AllowListEntry],
) -> Result<SchemaDocument, FilterError> {
    tracing::debug!(entries = allow_list.len(), "Filtering endpoints");

    let mut filtered: BTreeMap<String, _> = BTreeMap::new();
    for (path, operations) in document.paths() {
        for (method, descriptor) in operations {
            if allow_list.iter().any(|entry| entry.matches(method, path)) {
                tracing::info!("Allowing {} {}", method.to_uppercase(), path);
                filtered
                    .entry(path.to_string())
                    .or_insert_with(BTreeMap::new)
                    .insert(method.clone(), descriptor.clone());
            } else {
                tracing::debug!("Not allowing {} {}", method.to_uppercase(), path);
            }
        }
    }

    if filtered.is_empty() {
        return Err(FilterError::NoMatchingEndpoints);
    }

    Ok(SchemaDocument { paths: filtered })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> SchemaDocument {
        serde_json::from_value(json!({
            "paths": {
                "/pets": {"get": {"operationId": "listPets"}, "post": {}},
                "/pets/{petId}": {"get": {}},
                "/owners": {"delete": {}}
            }
        }))
        .unwrap()
    }

    fn allow(entries: &[&str]) -> Vec<AllowListEntry> {
        entries
            .iter()
            .map(|raw| AllowListEntry::parse(raw).unwrap())
            .collect()
    }

    #[test]
    fn keeps_only_listed_pairs() {
        let filtered = filter_endpoints(&document(), &allow(&["GET:/pets"])).unwrap();
        assert_eq!(filtered.operation_count(), 1);
        let (path, ops) = filtered.paths().next().unwrap();
        assert_eq!(path, "/pets");
        assert!(ops.contains_key("get"));
        assert!(!ops.contains_key("post"));
    }

    #[test]
    fn method_matching_is_case_insensitive() {
        let filtered = filter_endpoints(&document(), &allow(&["get:/pets"])).unwrap();
        assert_eq!(filtered.operation_count(), 1);
    }

    #[test]
    fn parameter_names_match_verbatim() {
        // `{id}` is not `{petId}`: path templates are exact strings.
        let err = filter_endpoints(&document(), &allow(&["GET:/pets/{id}"])).unwrap_err();
        assert!(matches!(err, FilterError::NoMatchingEndpoints));

        let filtered = filter_endpoints(&document(), &allow(&["GET:/pets/{petId}"])).unwrap();
        assert_eq!(filtered.operation_count(), 1);
    }

    #[test]
    fn descriptors_pass_through_unchanged() {
        let filtered = filter_endpoints(&document(), &allow(&["GET:/pets"])).unwrap();
        let (_, ops) = filtered.paths().next().unwrap();
        assert_eq!(ops["get"], json!({"operationId": "listPets"}));
    }

    #[test]
    fn empty_intersection_is_an_error() {
        let err = filter_endpoints(&document(), &allow(&["GET:/nothing"])).unwrap_err();
        assert!(matches!(err, FilterError::NoMatchingEndpoints));
    }

    #[test]
    fn multiple_entries_accumulate() {
        let filtered =
            filter_endpoints(&document(), &allow(&["GET:/pets", "DELETE:/owners"])).unwrap();
        assert_eq!(filtered.operation_count(), 2);
        assert_eq!(filtered.path_count(), 2);
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        assert!(AllowListEntry::parse("GET /pets").is_none());
        assert!(AllowListEntry::parse(":/pets").is_none());
        assert!(AllowListEntry::parse("GET:pets").is_none());
    }
}

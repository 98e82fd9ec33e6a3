//! Structured representation of an OpenAPI schema document.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// The methods of a single path item, keyed as they appear in the document
/// (OpenAPI uses lower-case), each mapping to an opaque operation descriptor.
pub type PathOperations = BTreeMap<String, Value>;

/// Parsed schema document, reduced to what the proxy consumes: the mapping
/// from path template to the operations declared under it.
///
/// Built once at startup and immutable afterwards. Anything outside `paths`
/// (components, info, servers) is dropped at parse time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub(crate) paths: BTreeMap<String, PathOperations>,
}

impl SchemaDocument {
    /// Iterate over (path template, operations) pairs.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &PathOperations)> {
        self.paths.iter().map(|(path, ops)| (path.as_str(), ops))
    }

    /// Number of path templates in the document.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Total number of (path, method) entries, counting every key of every
    /// path item. Useful for startup logging.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }

    /// True when the document declares no paths at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

//! Core types for schema dereferencing.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Composition keywords walked element-wise, in this order.
pub const COMPOSITION_KEYWORDS: &[&str] = &["anyOf", "oneOf", "allOf"];

/// Keys holding a document's definition table, in lookup order.
pub const DEFINITION_KEYS: &[&str] = &["definitions", "$defs"];

/// Returns the definition table of a schema document.
///
/// Uses `definitions`, falling back to `$defs`. Documents with neither
/// (or with a non-object value there) contribute an empty table.
pub fn definitions_of(document: &Value) -> Map<String, Value> {
    DEFINITION_KEYS
        .iter()
        .find_map(|key| document.get(*key).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default()
}

/// Returns the `$ref` string of a schema node, if it has one.
pub fn ref_of(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// A parsed `$ref` pointer.
///
/// `https://x/defs.json#/definitions/A` splits into base `https://x/defs.json`
/// and fragment `/definitions/A`; the term used for lookup is `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef<'a> {
    base: &'a str,
    fragment: &'a str,
}

impl<'a> SchemaRef<'a> {
    pub fn parse(reference: &'a str) -> Self {
        match reference.split_once('#') {
            Some((base, fragment)) => Self { base, fragment },
            None => Self {
                base: reference,
                fragment: "",
            },
        }
    }

    /// The document the ref points into, or `None` for local refs.
    pub fn base(&self) -> Option<&'a str> {
        if self.base.is_empty() {
            None
        } else {
            Some(self.base)
        }
    }

    pub fn is_local(&self) -> bool {
        self.base.is_empty()
    }

    /// Last segment of the fragment with JSON Pointer escapes decoded.
    ///
    /// Empty for `#` and for refs without a fragment.
    pub fn term(&self) -> String {
        let last = self.fragment.rsplit('/').next().unwrap_or("");
        last.replace("~1", "/").replace("~0", "~")
    }
}

/// How fetched definitions merge into the working table on a name clash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Names already in the table win; remote documents cannot shadow
    /// local definitions or earlier fetches.
    #[default]
    KeepExisting,
    /// The most recently fetched definition wins.
    Overwrite,
}

/// Options for a dereference pass.
#[derive(Debug, Clone)]
pub struct DereferenceOptions {
    /// Fetch documents named by remote refs. When false, remote refs are
    /// left in place.
    pub follow_remote: bool,
    pub merge_policy: MergePolicy,
}

impl Default for DereferenceOptions {
    fn default() -> Self {
        Self {
            follow_remote: true,
            merge_policy: MergePolicy::KeepExisting,
        }
    }
}

impl DereferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable remote fetches.
    pub fn follow_remote(mut self, follow_remote: bool) -> Self {
        self.follow_remote = follow_remote;
        self
    }

    /// Set the policy for definition name clashes.
    pub fn merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }
}

/// Result of a dereference pass.
#[derive(Debug, Clone, Default)]
pub struct Dereferenced {
    /// The dereferenced schema.
    pub schema: Value,
    /// Base URLs fetched, in fetch order. Includes failed fetches.
    pub fetched: Vec<String>,
    /// Refs whose target was not found, left as `$ref` nodes.
    pub unresolved: BTreeSet<String>,
    /// Refs left in place because expanding them would recurse.
    pub recursive: BTreeSet<String>,
}

impl Dereferenced {
    /// True when every ref was inlined or deliberately kept as recursive.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_local_ref() {
        let r = SchemaRef::parse("#/definitions/Foo");
        assert!(r.is_local());
        assert_eq!(r.base(), None);
        assert_eq!(r.term(), "Foo");
    }

    #[test]
    fn parse_remote_ref() {
        let r = SchemaRef::parse("https://x/defs.json#/definitions/io.k8s.api.core.v1.HealthCheck");
        assert!(!r.is_local());
        assert_eq!(r.base(), Some("https://x/defs.json"));
        assert_eq!(r.term(), "io.k8s.api.core.v1.HealthCheck");
    }

    #[test]
    fn parse_defs_ref() {
        assert_eq!(SchemaRef::parse("#/$defs/Bar").term(), "Bar");
    }

    #[test]
    fn term_decodes_pointer_escapes() {
        assert_eq!(SchemaRef::parse("#/definitions/a~1b~0c").term(), "a/b~c");
    }

    #[test]
    fn term_empty_for_self_ref_and_bare_url() {
        assert_eq!(SchemaRef::parse("#").term(), "");

        let r = SchemaRef::parse("https://x/defs.json");
        assert_eq!(r.base(), Some("https://x/defs.json"));
        assert_eq!(r.term(), "");
    }

    #[test]
    fn definitions_prefers_definitions_over_defs() {
        let doc = json!({
            "definitions": { "A": { "type": "string" } },
            "$defs": { "B": { "type": "number" } }
        });
        let defs = definitions_of(&doc);
        assert!(defs.contains_key("A"));
        assert!(!defs.contains_key("B"));
    }

    #[test]
    fn definitions_falls_back_to_defs() {
        let doc = json!({ "$defs": { "B": { "type": "number" } } });
        assert!(definitions_of(&doc).contains_key("B"));
    }

    #[test]
    fn definitions_missing_or_malformed_is_empty() {
        assert!(definitions_of(&json!({})).is_empty());
        assert!(definitions_of(&json!({ "definitions": [1, 2] })).is_empty());
        assert!(definitions_of(&json!("not a document")).is_empty());
    }

    #[test]
    fn options_builder() {
        let opts = DereferenceOptions::new();
        assert!(opts.follow_remote);
        assert_eq!(opts.merge_policy, MergePolicy::KeepExisting);

        let opts = DereferenceOptions::new()
            .follow_remote(false)
            .merge_policy(MergePolicy::Overwrite);
        assert!(!opts.follow_remote);
        assert_eq!(opts.merge_policy, MergePolicy::Overwrite);
    }
}

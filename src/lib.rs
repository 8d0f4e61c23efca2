//! JSON Schema Dereferencer
//!
//! Replaces `$ref` pointers in a JSON Schema with the schemas they point to,
//! producing a self-contained document.
//!
//! Local refs (`#/definitions/Name`, `#/$defs/Name`) resolve against the root's
//! definition table. Remote refs (`https://host/doc.json#/definitions/Name`)
//! fetch the named document once per call and merge its definitions into the
//! table. Refs that cannot be resolved are left in place: dereferencing is
//! best-effort and never fails.
//!
//! # Example
//!
//! ```
//! use schema_deref::dereference_local;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "definitions": { "Name": { "type": "string" } },
//!     "properties": {
//!         "first": { "$ref": "#/definitions/Name" },
//!         "last": { "$ref": "#/definitions/Name" }
//!     }
//! });
//!
//! let resolved = dereference_local(&schema);
//! assert_eq!(resolved["properties"]["first"], json!({ "type": "string" }));
//! ```
//!
//! # Remote refs
//!
//! Remote documents are retrieved through a [`DefinitionFetcher`].
//! [`SourceFetcher`] reads `http(s)://` bases over HTTP (feature `remote`)
//! and anything else from disk:
//!
//! ```no_run
//! use schema_deref::{dereference, SourceFetcher};
//! use serde_json::json;
//!
//! # async fn run() {
//! let schema = json!({
//!     "properties": {
//!         "health": { "$ref": "https://example.com/k8s.json#/definitions/HealthCheck" }
//!     }
//! });
//! let resolved = dereference(&schema, &SourceFetcher::default()).await;
//! # }
//! ```
//!
//! # Walked keywords
//!
//! | Keyword | Walked as |
//! |---------|-----------|
//! | `properties` | each value |
//! | `anyOf`, `oneOf`, `allOf` | each element, in order |
//! | `items` | each element (tuple form) or the single schema |
//!
//! Other keywords are copied verbatim.

mod dereference;
mod error;
mod fetch;
mod loader;
mod types;

pub use dereference::{dereference, dereference_local, dereference_with_options};
pub use error::LoadError;
pub use fetch::{DefinitionFetcher, OfflineFetcher, SourceFetcher};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str, HTTP_TIMEOUT};
pub use types::{
    definitions_of, DereferenceOptions, Dereferenced, MergePolicy, SchemaRef,
    COMPOSITION_KEYWORDS, DEFINITION_KEYS,
};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;

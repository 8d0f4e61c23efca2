//! Schema dereferencing - inlines `$ref` pointers into a self-contained schema.
//!
//! The walk starts from the root's own definition table and grows it with the
//! definitions of every remote document a ref points into. Each remote base is
//! fetched at most once per top-level call; the table, the fetched set and the
//! expansion stack all live in a `Walk` created fresh for that call.

use std::collections::{BTreeSet, HashSet};

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::fetch::{DefinitionFetcher, OfflineFetcher};
use crate::types::{
    definitions_of, ref_of, DereferenceOptions, Dereferenced, MergePolicy, SchemaRef,
    COMPOSITION_KEYWORDS,
};

/// Dereference a schema with default options.
///
/// Every reachable `$ref` under `properties`, `items`, `anyOf`, `oneOf` and
/// `allOf` is replaced by its target, and the target is walked in turn.
/// Refs that cannot be resolved are left as-is; this never fails.
pub async fn dereference<F>(schema: &Value, fetcher: &F) -> Value
where
    F: DefinitionFetcher + ?Sized,
{
    dereference_with_options(schema, fetcher, &DereferenceOptions::default())
        .await
        .schema
}

/// Dereference a schema and report what was fetched and what was left behind.
pub async fn dereference_with_options<F>(
    schema: &Value,
    fetcher: &F,
    options: &DereferenceOptions,
) -> Dereferenced
where
    F: DefinitionFetcher + ?Sized,
{
    let mut walk = Walk::new(fetcher, options, definitions_of(schema));
    let mut result = schema.clone();
    walk.walk(&mut result).await;
    walk.finish(result)
}

/// Dereference local refs only, blocking the current thread.
///
/// Remote refs are left in place.
pub fn dereference_local(schema: &Value) -> Value {
    let options = DereferenceOptions::new().follow_remote(false);
    futures::executor::block_on(dereference_with_options(schema, &OfflineFetcher, &options))
        .schema
}

/// State of one top-level dereference call.
struct Walk<'a, F: ?Sized> {
    fetcher: &'a F,
    options: &'a DereferenceOptions,
    definitions: Map<String, Value>,
    /// Base URLs already fetched (successfully or not).
    visited: HashSet<String>,
    fetched: Vec<String>,
    /// Definition names currently being expanded, innermost last.
    expanding: Vec<String>,
    unresolved: BTreeSet<String>,
    recursive: BTreeSet<String>,
}

impl<'a, F> Walk<'a, F>
where
    F: DefinitionFetcher + ?Sized,
{
    fn new(fetcher: &'a F, options: &'a DereferenceOptions, definitions: Map<String, Value>) -> Self {
        Self {
            fetcher,
            options,
            definitions,
            visited: HashSet::new(),
            fetched: Vec::new(),
            expanding: Vec::new(),
            unresolved: BTreeSet::new(),
            recursive: BTreeSet::new(),
        }
    }

    fn finish(self, schema: Value) -> Dereferenced {
        Dereferenced {
            schema,
            fetched: self.fetched,
            unresolved: self.unresolved,
            recursive: self.recursive,
        }
    }

    /// Resolve `node` in place, then walk its subschemas.
    ///
    /// Order: properties, then anyOf/oneOf/allOf, then items.
    fn walk<'s>(&'s mut self, node: &'s mut Value) -> BoxFuture<'s, ()> {
        async move {
            let entered = self.resolve_ref(node).await;

            if let Value::Object(map) = node {
                if let Some(Value::Object(properties)) = map.get_mut("properties") {
                    for property in properties.values_mut() {
                        self.walk(property).await;
                    }
                }

                for keyword in COMPOSITION_KEYWORDS {
                    if let Some(Value::Array(branches)) = map.get_mut(*keyword) {
                        for branch in branches.iter_mut() {
                            self.walk(branch).await;
                        }
                    }
                }

                match map.get_mut("items") {
                    Some(Value::Array(items)) => {
                        for item in items.iter_mut() {
                            self.walk(item).await;
                        }
                    }
                    Some(items) => self.walk(items).await,
                    None => {}
                }
            }

            let depth = self.expanding.len() - entered;
            self.expanding.truncate(depth);
        }
        .boxed()
    }

    /// Replace `node` with its ref target, following direct ref chains.
    ///
    /// Returns how many definition names were pushed onto the expansion
    /// stack; the caller pops them once the subtree is walked.
    async fn resolve_ref(&mut self, node: &mut Value) -> usize {
        let mut entered = 0;

        while let Some(reference) = ref_of(node).map(str::to_owned) {
            let schema_ref = SchemaRef::parse(&reference);
            if let Some(base) = schema_ref.base() {
                self.ensure_fetched(base).await;
            }

            // "#" points at the document root
            if reference == "#" {
                self.recursive.insert(reference);
                break;
            }

            let term = schema_ref.term();
            if self.expanding.contains(&term) {
                debug!(reference = %reference, "leaving recursive ref in place");
                self.recursive.insert(reference);
                break;
            }

            let Some(target) = self.definitions.get(&term).filter(|_| !term.is_empty()) else {
                debug!(reference = %reference, "unresolved ref");
                self.unresolved.insert(reference);
                break;
            };

            *node = target.clone();
            self.expanding.push(term);
            entered += 1;
        }

        entered
    }

    /// Fetch `base` once and merge its definitions into the working table.
    async fn ensure_fetched(&mut self, base: &str) {
        if !self.options.follow_remote || !self.visited.insert(base.to_string()) {
            return;
        }
        self.fetched.push(base.to_string());

        debug!(url = base, "fetching remote definitions");
        let incoming = match self.fetcher.fetch(base).await {
            Ok(document) => definitions_of(&document),
            Err(e) => {
                warn!(url = base, error = %e, "remote definitions unavailable");
                return;
            }
        };

        if incoming.is_empty() {
            debug!(url = base, "remote document has no definitions");
        }

        for (name, schema) in incoming {
            match self.options.merge_policy {
                MergePolicy::KeepExisting => {
                    self.definitions.entry(name).or_insert(schema);
                }
                MergePolicy::Overwrite => {
                    self.definitions.insert(name, schema);
                }
            }
        }
    }
}

//! In-memory document store.
//!
//! Reference implementation backing tests and single-process deployments.
//! Documents are held as raw `serde_json` trees inside one `RwLock`, so
//! every primitive takes the lock once and is therefore atomic at
//! document granularity.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use shopdesk_core::{next_id, parse_id_keys};

use crate::document::StoreDocument;
use crate::path::DocPath;
use crate::store::{ArrayMatcher, DocumentStore, IdKind, StoreError, StoreFilter};

/// In-memory store, cheap to clone (shared state behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve a filter to the key of the matching document.
fn find_key(docs: &HashMap<String, Value>, filter: &StoreFilter) -> Option<String> {
    match filter {
        StoreFilter::Storename(name) => docs.contains_key(name).then(|| name.clone()),
        StoreFilter::SignupCode(code) => docs
            .iter()
            .find(|(_, doc)| doc.get("signupCode").and_then(Value::as_str) == Some(code))
            .map(|(key, _)| key.clone()),
        StoreFilter::SmsAccountSid(sid) => docs
            .iter()
            .find(|(_, doc)| {
                doc.get("smsAccount")
                    .and_then(|account| account.get("sid"))
                    .and_then(Value::as_str)
                    == Some(sid)
            })
            .map(|(key, _)| key.clone()),
    }
}

/// Walk to the object holding the final path segment.
///
/// With `create`, missing intermediate objects are created (matching
/// upsert-style partial updates); without it, a missing step resolves to
/// `None`. Crossing a non-object value is a [`StoreError::PathConflict`]
/// either way.
fn locate_parent<'a>(
    root: &'a mut Value,
    path: &DocPath,
    create: bool,
) -> Result<Option<&'a mut Map<String, Value>>, StoreError> {
    let segments = path.segments();
    let parent_len = segments.len().saturating_sub(1);
    let mut current = root;

    for segment in segments.iter().take(parent_len) {
        let object = current
            .as_object_mut()
            .ok_or_else(|| StoreError::PathConflict {
                path: path.to_string(),
            })?;

        if create {
            current = object
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        } else {
            match object.get_mut(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
    }

    current
        .as_object_mut()
        .ok_or_else(|| StoreError::PathConflict {
            path: path.to_string(),
        })
        .map(Some)
}

/// Final segment of a path. Typed constructors never produce an empty
/// path, so the fallback is unreachable in practice.
fn leaf(path: &DocPath) -> &str {
    path.segments().last().map_or("", String::as_str)
}

/// Take the value at `path`, removing it from the document.
fn take_at(root: &mut Value, path: &DocPath) -> Result<Option<Value>, StoreError> {
    Ok(locate_parent(root, path, false)?.and_then(|parent| parent.remove(leaf(path))))
}

/// Mutable handle to the array at `path`, creating it when `create`.
fn array_at<'a>(
    root: &'a mut Value,
    path: &DocPath,
    create: bool,
) -> Result<Option<&'a mut Vec<Value>>, StoreError> {
    let Some(parent) = locate_parent(root, path, create)? else {
        return Ok(None);
    };

    let slot = if create {
        parent
            .entry(leaf(path).to_owned())
            .or_insert_with(|| Value::Array(Vec::new()))
    } else {
        match parent.get_mut(leaf(path)) {
            Some(slot) => slot,
            None => return Ok(None),
        }
    };

    slot.as_array_mut()
        .ok_or_else(|| StoreError::PathConflict {
            path: path.to_string(),
        })
        .map(Some)
}

impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: StoreDocument) -> Result<(), StoreError> {
        let storename = doc.storename.clone();
        let value = serde_json::to_value(&doc)?;

        let mut docs = self.docs.write().await;
        if docs.contains_key(&storename) {
            return Err(StoreError::DuplicateStorename(storename));
        }
        tracing::debug!(storename = %storename, "inserting store document");
        docs.insert(storename, value);
        Ok(())
    }

    async fn find_one(&self, filter: &StoreFilter) -> Result<Option<StoreDocument>, StoreError> {
        let docs = self.docs.read().await;
        let Some(key) = find_key(&docs, filter) else {
            return Ok(None);
        };
        docs.get(&key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn find_raw(&self, filter: &StoreFilter) -> Result<Option<Value>, StoreError> {
        let docs = self.docs.read().await;
        Ok(find_key(&docs, filter).and_then(|key| docs.get(&key).cloned()))
    }

    async fn set_fields(
        &self,
        filter: &StoreFilter,
        writes: Vec<(DocPath, Value)>,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        // Staged on a copy so a path conflict mid-batch cannot leave the
        // document half-written.
        let mut staged = doc.clone();
        for (path, value) in writes {
            tracing::trace!(path = %path, "set");
            let parent = locate_parent(&mut staged, &path, true)?.ok_or(StoreError::NotFound)?;
            parent.insert(leaf(&path).to_owned(), value);
        }
        *doc = staged;
        Ok(())
    }

    async fn unset_fields(
        &self,
        filter: &StoreFilter,
        paths: Vec<DocPath>,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        let mut staged = doc.clone();
        for path in paths {
            tracing::trace!(path = %path, "unset");
            take_at(&mut staged, &path)?;
        }
        *doc = staged;
        Ok(())
    }

    async fn rename_field(
        &self,
        filter: &StoreFilter,
        from: &DocPath,
        to: &DocPath,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        // Staged so a conflicting destination cannot drop the taken
        // subtree.
        let mut staged = doc.clone();
        let Some(taken) = take_at(&mut staged, from)? else {
            // Missing source is a no-op, matching $rename semantics.
            return Ok(());
        };
        tracing::trace!(from = %from, to = %to, "rename");
        let parent = locate_parent(&mut staged, to, true)?.ok_or(StoreError::NotFound)?;
        parent.insert(leaf(to).to_owned(), taken);
        *doc = staged;
        Ok(())
    }

    async fn append_to_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        let array = array_at(doc, path, true)?.ok_or(StoreError::NotFound)?;
        array.push(item);
        Ok(())
    }

    async fn remove_from_array(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        matcher: &ArrayMatcher,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        if let Some(array) = array_at(doc, path, false)? {
            array.retain(|item| !matcher.matches(item));
        }
        Ok(())
    }

    async fn add_unique(
        &self,
        filter: &StoreFilter,
        path: &DocPath,
        item: Value,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        let array = array_at(doc, path, true)?.ok_or(StoreError::NotFound)?;
        if !array.contains(&item) {
            array.push(item);
        }
        Ok(())
    }

    async fn allocate_id(&self, filter: &StoreFilter, kind: IdKind) -> Result<u32, StoreError> {
        let mut docs = self.docs.write().await;
        let key = find_key(&docs, filter).ok_or(StoreError::NotFound)?;
        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;

        // Next ID implied by the records currently in the collection.
        let from_keys = doc
            .get(kind.collection_key())
            .and_then(Value::as_object)
            .map_or_else(
                || kind.floor(),
                |map| next_id(parse_id_keys::<u32>(map.keys()), kind.floor()),
            );

        let counter = doc
            .get("counters")
            .and_then(|c| c.get(kind.counter_key()))
            .and_then(Value::as_u64)
            .and_then(|c| u32::try_from(c).ok());

        // The counter never moves backwards, so deleting the highest
        // record cannot cause an ID to be handed out twice.
        let next = counter.map_or(from_keys, |last| (last + 1).max(from_keys));

        let object = doc.as_object_mut().ok_or(StoreError::NotFound)?;
        let counters = object
            .entry("counters")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| StoreError::PathConflict {
                path: "counters".to_owned(),
            })?;
        counters.insert(kind.counter_key().to_owned(), Value::from(next));

        tracing::debug!(kind = ?kind, id = next, "allocated id");
        Ok(next)
    }
}

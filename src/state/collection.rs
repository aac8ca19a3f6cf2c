/// Generic persisted collection
///
/// An insertion-ordered list of entities (newest first) mirrored to one
/// blob in durable storage. All mutation goes through the collection so the
/// in-memory list and the stored blob never drift apart: when a write fails
/// the in-memory list is rolled back and `AppError::SaveFailed` is returned.
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use super::storage::SharedStorage;
use crate::error::{AppError, Result};

/// Version written into every blob. Blobs with another version load as empty.
pub const BLOB_VERSION: u32 = 1;

/// Anything with a stable, unique identity
pub trait Identified {
    fn id(&self) -> &str;
}

/// An entity the collection can create from a caller-supplied draft
pub trait Entity: Identified {
    type Draft;

    fn from_draft(id: String, created_at: DateTime<Utc>, draft: Self::Draft) -> Self;
}

#[derive(Serialize)]
struct BlobRef<'a, T> {
    version: u32,
    items: &'a [T],
}

#[derive(Deserialize)]
struct Blob<T> {
    version: u32,
    items: Vec<T>,
}

pub struct PersistedCollection<T> {
    key: String,
    storage: SharedStorage,
    items: Vec<T>,
}

impl<T> PersistedCollection<T>
where
    T: Identified + Serialize + DeserializeOwned + Clone,
{
    /// Load the collection stored under `key`.
    ///
    /// A missing or corrupted blob is an empty collection. A backend that
    /// cannot be read is an error, so nothing gets saved over data that
    /// might still be there.
    pub fn load(storage: SharedStorage, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let items = read_items(&storage, &key)?;
        debug!(key = %key, count = items.len(), "collection loaded");
        Ok(Self {
            key,
            storage,
            items,
        })
    }

    /// All entities, newest first
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the entity with `id`. Unknown ids are a no-op and write nothing.
    ///
    /// Returns whether an entity was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.items.iter().position(|item| item.id() == id) else {
            return Ok(false);
        };
        self.commit(|items| {
            items.remove(index);
        })?;
        Ok(true)
    }

    /// Remove every entity
    pub fn clear(&mut self) -> Result<()> {
        self.commit(|items| items.clear())
    }

    /// Append an already identified entity at the end (oldest position)
    pub(crate) fn push_back(&mut self, entity: T) -> Result<()> {
        if self.contains(entity.id()) {
            return Ok(());
        }
        self.commit(|items| items.push(entity))
    }

    /// Mutate one entity in place. Returns false when `id` is unknown.
    pub(crate) fn update<F>(&mut self, id: &str, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut T),
    {
        let Some(index) = self.items.iter().position(|item| item.id() == id) else {
            return Ok(false);
        };
        self.commit(|items| mutate(&mut items[index]))?;
        Ok(true)
    }

    /// Apply a mutation and persist it, restoring the previous list on failure
    fn commit<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<T>),
    {
        let previous = self.items.clone();
        mutate(&mut self.items);

        if let Err(e) = self.persist() {
            self.items = previous;
            warn!(key = %self.key, "could not save collection: {e}");
            return Err(AppError::SaveFailed {
                key: self.key.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let blob = BlobRef {
            version: BLOB_VERSION,
            items: &self.items,
        };
        let text = serde_json::to_string(&blob)?;
        self.storage.set(&self.key, &text)
    }
}

impl<T> PersistedCollection<T>
where
    T: Entity + Serialize + DeserializeOwned + Clone,
{
    /// Create an entity from `draft` with a fresh id and the current time,
    /// prepend it and persist.
    pub fn add(&mut self, draft: T::Draft) -> Result<&T> {
        let mut id = Uuid::new_v4().to_string();
        while self.contains(&id) {
            id = Uuid::new_v4().to_string();
        }
        let entity = T::from_draft(id, Utc::now(), draft);
        self.commit(|items| items.insert(0, entity))?;
        Ok(&self.items[0])
    }
}

impl<T> std::fmt::Debug for PersistedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedCollection")
            .field("key", &self.key)
            .field("len", &self.items.len())
            .finish()
    }
}

fn read_items<T>(storage: &SharedStorage, key: &str) -> Result<Vec<T>>
where
    T: Identified + DeserializeOwned,
{
    let Some(text) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    let blob: Blob<T> = match serde_json::from_str(&text) {
        Ok(blob) => blob,
        Err(e) => {
            warn!(key, "stored collection is corrupted, starting empty: {e}");
            return Ok(Vec::new());
        }
    };

    if blob.version != BLOB_VERSION {
        warn!(
            key,
            version = blob.version,
            "unsupported collection version, starting empty"
        );
        return Ok(Vec::new());
    }

    // Keep the first occurrence of every id
    let mut seen = HashSet::new();
    Ok(blob
        .items
        .into_iter()
        .filter(|item| seen.insert(item.id().to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Category, NewResolution, Resolution};
    use crate::state::storage::{MemoryStorage, Storage};
    use std::rc::Rc;

    const KEY: &str = "resolution-storage";

    fn draft(text: &str) -> NewResolution {
        NewResolution {
            text: text.to_string(),
            category: Category::Personal,
        }
    }

    fn load(storage: &Rc<MemoryStorage>) -> PersistedCollection<Resolution> {
        PersistedCollection::load(storage.clone(), KEY).unwrap()
    }

    fn fresh() -> (Rc<MemoryStorage>, PersistedCollection<Resolution>) {
        let storage = Rc::new(MemoryStorage::new());
        let collection = load(&storage);
        (storage, collection)
    }

    #[test]
    fn test_missing_blob_is_empty() {
        let (_, collection) = fresh();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_add_prepends_with_identity() {
        let (_, mut collection) = fresh();
        let first_id = collection.add(draft("run a 10k")).unwrap().id.clone();
        let second = collection.add(draft("learn rust")).unwrap().clone();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.items()[0], second);
        assert_eq!(collection.items()[1].id, first_id);
        assert_ne!(first_id, second.id);
        assert!(!second.id.is_empty());
        assert_eq!(second.text, "learn rust");
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (_, mut collection) = fresh();
        collection.add(draft("a")).unwrap();
        collection.add(draft("b")).unwrap();
        let before = collection.items().to_vec();

        assert!(!collection.delete("no-such-id").unwrap());
        assert_eq!(collection.items(), before.as_slice());
    }

    #[test]
    fn test_delete_removes_once() {
        let (_, mut collection) = fresh();
        let id = collection.add(draft("a")).unwrap().id.clone();
        collection.add(draft("b")).unwrap();

        assert!(collection.delete(&id).unwrap());
        assert!(!collection.delete(&id).unwrap());
        assert_eq!(collection.len(), 1);
        assert!(!collection.contains(&id));
    }

    #[test]
    fn test_clear_empties() {
        let (_, mut collection) = fresh();
        for text in ["a", "b", "c"] {
            collection.add(draft(text)).unwrap();
        }
        collection.clear().unwrap();
        assert!(collection.is_empty());
        collection.clear().unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_reload_reproduces_collection() {
        let (storage, mut collection) = fresh();
        collection.add(draft("a")).unwrap();
        collection.add(draft("b")).unwrap();
        collection.add(draft("c")).unwrap();

        let reloaded = load(&storage);
        assert_eq!(reloaded.items(), collection.items());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let (storage, mut collection) = fresh();
        collection.add(draft("kept")).unwrap();
        let before = collection.items().to_vec();

        storage.set_fail_writes(true);
        let result = collection.add(draft("lost"));
        assert!(matches!(result, Err(AppError::SaveFailed { ref key, .. }) if key == KEY));
        assert_eq!(collection.items(), before.as_slice());

        let id = before[0].id.clone();
        assert!(collection.delete(&id).is_err());
        assert!(collection.clear().is_err());
        assert_eq!(collection.items(), before.as_slice());

        storage.set_fail_writes(false);
        assert_eq!(load(&storage).items(), before.as_slice());
    }

    #[test]
    fn test_unreadable_backend_is_an_error() {
        let (storage, mut collection) = fresh();
        collection.add(draft("precious")).unwrap();

        storage.set_fail_reads(true);
        let result = PersistedCollection::<Resolution>::load(storage.clone(), KEY);
        assert!(matches!(result, Err(AppError::Io(_))));

        // The stored blob is untouched once the backend recovers
        storage.set_fail_reads(false);
        let reloaded = load(&storage);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.items()[0].text, "precious");
    }

    #[test]
    fn test_corrupted_blob_is_empty() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set(KEY, "{not json").unwrap();
        assert!(load(&storage).is_empty());
    }

    #[test]
    fn test_other_version_is_empty() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set(KEY, r#"{"version":99,"items":[]}"#).unwrap();
        assert!(load(&storage).is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_dropped_on_load() {
        let storage = Rc::new(MemoryStorage::new());
        storage
            .set(
                KEY,
                r#"{"version":1,"items":[
                {"id":"x","createdAt":"2025-12-31T10:00:00Z","text":"first","category":"health"},
                {"id":"x","createdAt":"2025-12-31T09:00:00Z","text":"second","category":"health"}
                ]}"#,
            )
            .unwrap();
        let collection = load(&storage);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.items()[0].text, "first");
    }

    #[test]
    fn test_update_unknown_id() {
        let (_, mut collection) = fresh();
        assert!(!collection.update("ghost", |r| r.text.clear()).unwrap());
    }
}

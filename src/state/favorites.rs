use chrono::Utc;

use super::collection::PersistedCollection;
use super::data::FavoriteEntry;
use super::storage::SharedStorage;
use crate::error::Result;

/// A persisted set of favorited item ids, kept in the order they were added
#[derive(Debug)]
pub struct FavoriteSet {
    entries: PersistedCollection<FavoriteEntry>,
}

impl FavoriteSet {
    pub fn load(storage: SharedStorage, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            entries: PersistedCollection::load(storage, key)?,
        })
    }

    /// Remove `id` if present, otherwise append it.
    ///
    /// Returns whether `id` is a favorite afterwards.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        if self.entries.delete(id)? {
            return Ok(false);
        }
        self.entries.push_back(FavoriteEntry {
            id: id.to_string(),
            created_at: Utc::now(),
        })?;
        Ok(true)
    }

    pub fn is_present(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    /// Favorited ids, oldest first
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.items().iter().map(|entry| entry.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::state::storage::MemoryStorage;
    use std::rc::Rc;

    #[test]
    fn test_toggle_adds_then_removes() {
        let storage = Rc::new(MemoryStorage::new());
        let mut favorites = FavoriteSet::load(storage, "meme-storage").unwrap();

        assert!(favorites.toggle("meme-1").unwrap());
        assert!(favorites.is_present("meme-1"));
        assert!(!favorites.toggle("meme-1").unwrap());
        assert!(!favorites.is_present("meme-1"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_toggle_appends_in_order() {
        let storage = Rc::new(MemoryStorage::new());
        let mut favorites = FavoriteSet::load(storage.clone(), "meme-storage").unwrap();
        for id in ["a", "b", "c"] {
            favorites.toggle(id).unwrap();
        }
        favorites.toggle("b").unwrap();

        let ids: Vec<&str> = favorites.ids().collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(favorites.len(), 2);

        let reloaded = FavoriteSet::load(storage, "meme-storage").unwrap();
        assert_eq!(reloaded.ids().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_toggle_failure_keeps_membership() {
        let storage = Rc::new(MemoryStorage::new());
        let mut favorites = FavoriteSet::load(storage.clone(), "meme-storage").unwrap();
        favorites.toggle("keep").unwrap();

        storage.set_fail_writes(true);
        assert!(matches!(
            favorites.toggle("keep"),
            Err(AppError::SaveFailed { .. })
        ));
        assert!(favorites.is_present("keep"));
        assert!(matches!(
            favorites.toggle("new"),
            Err(AppError::SaveFailed { .. })
        ));
        assert!(!favorites.is_present("new"));
    }
}

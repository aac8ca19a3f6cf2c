/// The four party stores, each bound to a fixed storage key
use tracing::info;

use super::collection::PersistedCollection;
use super::data::{
    Category, GuestMessage, NewGuestMessage, NewPhoto, NewResolution, Photo, Resolution,
};
use super::favorites::FavoriteSet;
use super::storage::SharedStorage;
use crate::error::Result;

pub const GUESTBOOK_KEY: &str = "guestbook-storage";
pub const PHOTO_BOOTH_KEY: &str = "photo-booth-storage";
pub const RESOLUTION_KEY: &str = "resolution-storage";
pub const MEME_KEY: &str = "meme-storage";

/// Guestbook messages, newest first
#[derive(Debug)]
pub struct GuestbookStore {
    messages: PersistedCollection<GuestMessage>,
}

impl GuestbookStore {
    pub fn load(storage: SharedStorage) -> Result<Self> {
        Ok(Self {
            messages: PersistedCollection::load(storage, GUESTBOOK_KEY)?,
        })
    }

    pub fn add(&mut self, message: NewGuestMessage) -> Result<&GuestMessage> {
        self.messages.add(message)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        self.messages.delete(id)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.messages.clear()
    }

    pub fn messages(&self) -> &[GuestMessage] {
        self.messages.items()
    }

    /// Messages signed by `author` (case-insensitive), newest first
    pub fn by_author<'a>(
        &'a self,
        author: &'a str,
    ) -> impl Iterator<Item = &'a GuestMessage> + 'a {
        self.messages
            .items()
            .iter()
            .filter(move |m| m.author.eq_ignore_ascii_case(author))
    }
}

/// Photo booth captures, newest first
#[derive(Debug)]
pub struct PhotoStore {
    photos: PersistedCollection<Photo>,
}

impl PhotoStore {
    pub fn load(storage: SharedStorage) -> Result<Self> {
        Ok(Self {
            photos: PersistedCollection::load(storage, PHOTO_BOOTH_KEY)?,
        })
    }

    pub fn add(&mut self, photo: NewPhoto) -> Result<&Photo> {
        self.photos.add(photo)
    }

    /// Add a frame to an existing photo during a photo-strip session.
    ///
    /// Returns false (and writes nothing) when `id` is unknown.
    pub fn append_frame(&mut self, id: &str, frame: impl Into<String>) -> Result<bool> {
        let frame = frame.into();
        self.photos.update(id, |photo| photo.frames.push(frame))
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        self.photos.delete(id)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.photos.clear()
    }

    pub fn photos(&self) -> &[Photo] {
        self.photos.items()
    }

    pub fn get(&self, id: &str) -> Option<&Photo> {
        self.photos.get(id)
    }
}

/// New Year's resolutions, newest first
#[derive(Debug)]
pub struct ResolutionStore {
    resolutions: PersistedCollection<Resolution>,
}

impl ResolutionStore {
    pub fn load(storage: SharedStorage) -> Result<Self> {
        Ok(Self {
            resolutions: PersistedCollection::load(storage, RESOLUTION_KEY)?,
        })
    }

    pub fn add(&mut self, resolution: NewResolution) -> Result<&Resolution> {
        self.resolutions.add(resolution)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        self.resolutions.delete(id)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.resolutions.clear()
    }

    pub fn resolutions(&self) -> &[Resolution] {
        self.resolutions.items()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Resolution> + '_ {
        self.resolutions
            .items()
            .iter()
            .filter(move |r| r.category == category)
    }
}

/// Favorited memes
#[derive(Debug)]
pub struct MemeStore {
    favorites: FavoriteSet,
}

impl MemeStore {
    pub fn load(storage: SharedStorage) -> Result<Self> {
        Ok(Self {
            favorites: FavoriteSet::load(storage, MEME_KEY)?,
        })
    }

    pub fn toggle_favorite(&mut self, meme_id: &str) -> Result<bool> {
        self.favorites.toggle(meme_id)
    }

    pub fn is_favorite(&self, meme_id: &str) -> bool {
        self.favorites.is_present(meme_id)
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn clear(&mut self) -> Result<()> {
        self.favorites.clear()
    }
}

/// Every store of the party, opened once at process start over one backend
#[derive(Debug)]
pub struct PartyState {
    pub guestbook: GuestbookStore,
    pub photos: PhotoStore,
    pub resolutions: ResolutionStore,
    pub memes: MemeStore,
}

impl PartyState {
    /// Load every store. Fails when the backend cannot be read.
    pub fn open(storage: SharedStorage) -> Result<Self> {
        let state = Self {
            guestbook: GuestbookStore::load(storage.clone())?,
            photos: PhotoStore::load(storage.clone())?,
            resolutions: ResolutionStore::load(storage.clone())?,
            memes: MemeStore::load(storage)?,
        };
        info!(
            messages = state.guestbook.messages().len(),
            photos = state.photos.photos().len(),
            resolutions = state.resolutions.resolutions().len(),
            favorites = state.memes.favorites().len(),
            "party state loaded"
        );
        Ok(state)
    }
}

/// State management module
///
/// This module handles all persisted party state, including:
/// - Durable key-value storage backends (storage.rs)
/// - Entity types for every store (data.rs)
/// - The generic persisted collection (collection.rs)
/// - The favorites variant with toggle semantics (favorites.rs)
/// - The concrete guestbook, photo, resolution and meme stores (stores.rs)

pub mod collection;
pub mod data;
pub mod favorites;
pub mod storage;
pub mod stores;

pub use data::{Category, NewGuestMessage, NewPhoto, NewResolution};
pub use storage::SqliteStorage;
pub use stores::PartyState;

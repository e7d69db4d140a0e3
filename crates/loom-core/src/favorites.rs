//! Favorite books
//!
//! Set semantics by book id, kept in insertion order under `@favorites`.

use std::sync::Arc;

use tracing::debug;

use crate::collection::{CollectionError, PersistedCollectionStore, WritePolicy};
use crate::models::Book;
use crate::storage::KeyValueStorage;

/// Storage key of the favorites collection
pub const FAVORITES_KEY: &str = "@favorites";

/// The user's favorite books
pub struct Favorites {
    store: PersistedCollectionStore<Book>,
}

impl Favorites {
    pub fn new(storage: Arc<dyn KeyValueStorage>, policy: WritePolicy) -> Self {
        Self {
            store: PersistedCollectionStore::new(FAVORITES_KEY, storage, policy),
        }
    }

    /// Underlying collection (snapshots, subscriptions, hydration report)
    pub fn store(&self) -> &PersistedCollectionStore<Book> {
        &self.store
    }

    /// Load stored favorites; call once at startup
    pub async fn load(&self) -> Result<Vec<Book>, CollectionError> {
        self.store.hydrate().await
    }

    /// Current favorites in the order they were added
    pub fn list(&self) -> Vec<Book> {
        self.store.snapshot()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Add a book unless it is already a favorite
    pub async fn add(&self, book: Book) -> Result<Vec<Book>, CollectionError> {
        self.store.upsert_if_absent(book).await
    }

    /// Remove a book by id
    pub async fn remove(&self, id: &str) -> Result<Vec<Book>, CollectionError> {
        self.store.remove_by_id(id).await
    }

    /// Add the book if absent, remove it if present
    ///
    /// A book without an id is ignored.
    pub async fn toggle(&self, book: &Book) -> Result<Vec<Book>, CollectionError> {
        if book.id.trim().is_empty() {
            debug!(title = %book.title, "Ignoring toggle for book without id");
            return Ok(self.store.snapshot());
        }
        self.store.toggle(book.clone()).await
    }
}

//! Reading diary
//!
//! Entries live under `@diary_entries`, newest first. Each added entry gets
//! a generated id (milliseconds since the epoch, bumped so ids handed out by
//! one diary are strictly increasing) and a creation timestamp.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::collection::{CollectionError, PersistedCollectionStore, WritePolicy};
use crate::models::{DiaryEntry, NewDiaryEntry, MAX_RATING};
use crate::storage::KeyValueStorage;

/// Storage key of the diary collection
pub const DIARY_KEY: &str = "@diary_entries";

/// Errors from diary operations
#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("Book title is required")]
    MissingTitle,

    #[error("Thoughts are required")]
    MissingThoughts,

    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(u8),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// The user's reading diary
pub struct Diary {
    store: PersistedCollectionStore<DiaryEntry>,
    last_id: AtomicI64,
}

impl Diary {
    pub fn new(storage: Arc<dyn KeyValueStorage>, policy: WritePolicy) -> Self {
        Self {
            store: PersistedCollectionStore::new(DIARY_KEY, storage, policy),
            last_id: AtomicI64::new(0),
        }
    }

    /// Underlying collection (snapshots, subscriptions, hydration report)
    pub fn store(&self) -> &PersistedCollectionStore<DiaryEntry> {
        &self.store
    }

    /// Load stored entries; call once at startup
    pub async fn load(&self) -> Result<Vec<DiaryEntry>, CollectionError> {
        let entries = self.store.hydrate().await?;

        // New ids must stay above any stored numeric id
        let max_stored = entries
            .iter()
            .filter_map(|e| e.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        self.last_id.fetch_max(max_stored, Ordering::SeqCst);

        Ok(entries)
    }

    /// Current entries, newest first
    pub fn entries(&self) -> Vec<DiaryEntry> {
        self.store.snapshot()
    }

    /// Validate, stamp, and prepend a new entry
    ///
    /// Title, author and thoughts are trimmed; title and thoughts must not
    /// be empty.
    pub async fn add_entry(&self, entry: NewDiaryEntry) -> Result<Vec<DiaryEntry>, DiaryError> {
        let book_title = entry.book_title.trim();
        let thoughts = entry.thoughts.trim();

        if book_title.is_empty() {
            return Err(DiaryError::MissingTitle);
        }
        if thoughts.is_empty() {
            return Err(DiaryError::MissingThoughts);
        }
        if entry.rating > MAX_RATING {
            return Err(DiaryError::InvalidRating(entry.rating));
        }

        let timestamp = Utc::now();
        let record = DiaryEntry {
            id: self.next_id(timestamp),
            timestamp,
            book_title: book_title.to_string(),
            author: entry.author.trim().to_string(),
            thoughts: thoughts.to_string(),
            rating: entry.rating,
        };

        Ok(self.store.prepend(record).await?)
    }

    /// Delete an entry by id
    pub async fn delete_entry(&self, id: &str) -> Result<Vec<DiaryEntry>, DiaryError> {
        Ok(self.store.remove_by_id(id).await?)
    }

    /// Next id: `now` in milliseconds, or one past the last id handed out
    ///
    /// If the last id is `i64::MAX` the clock value is used as is, so ids
    /// keep increasing from there.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let mut last = self.last_id.load(Ordering::SeqCst);
        loop {
            let candidate = last.checked_add(1).map_or(millis, |next| millis.max(next));
            match self
                .last_id
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => last = actual,
            }
        }
    }
}

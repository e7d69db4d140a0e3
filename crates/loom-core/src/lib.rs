//! Loom Core Library
//!
//! This crate provides the persisted state behind Loom, a book-discovery
//! app: a favorites list and a personal reading diary, each kept as one
//! ordered collection in a durable key-value slot.
//!
//! # Architecture
//!
//! - **PersistedCollectionStore**: generic id-unique list synchronized with
//!   one storage key; mutations are serialized and written in full
//! - **Favorites / Diary**: the two configured collections
//! - **Library**: loads both at startup and flushes them at shutdown
//!
//! # Quick Start
//!
//! ```text
//! let library = Library::open().await?;
//!
//! // Favorite a book
//! library.favorites().toggle(&Book::new("zyTCAlFPjgYC", "Dune")).await?;
//!
//! // Write in the diary
//! library.diary().add_entry(NewDiaryEntry::new("Dune", "Sandy")).await?;
//! ```
//!
//! # Modules
//!
//! - `library`: Composition root (main entry point)
//! - `collection`: Persisted collection engine
//! - `favorites`, `diary`: Collection policies
//! - `models`: Book and diary entry records
//! - `storage`: Key-value backends
//! - `config`: Application configuration

pub mod collection;
pub mod config;
pub mod diary;
pub mod favorites;
pub mod library;
pub mod models;
pub mod storage;

pub use collection::{
    CollectionError, HydrationReport, PersistedCollectionStore, Record, WritePolicy,
};
pub use config::Config;
pub use diary::{Diary, DiaryError};
pub use favorites::Favorites;
pub use library::{Library, LibraryStatus};
pub use models::{Book, DiaryEntry, NewDiaryEntry};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

//! Library: the application's persisted state
//!
//! The `Library` builds the storage backend from configuration, loads the
//! favorites and diary collections once at startup, and hands them to the
//! front end. `shutdown()` waits for pending writes before exit.
//!
//! ## Usage
//!
//! ```ignore
//! let library = Library::open().await?;
//!
//! library.favorites().toggle(&book).await?;
//! let entries = library.diary().entries();
//!
//! library.shutdown().await;
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::collection::HydrationReport;
use crate::config::Config;
use crate::diary::Diary;
use crate::favorites::Favorites;
use crate::storage::{FileStorage, KeyValueStorage};

/// Counts and load results for both collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStatus {
    pub favorites: usize,
    pub diary_entries: usize,
    pub favorites_report: HydrationReport,
    pub diary_report: HydrationReport,
}

impl LibraryStatus {
    /// Whether either collection had to discard unreadable data
    pub fn has_recovered(&self) -> bool {
        matches!(self.favorites_report, HydrationReport::Recovered { .. })
            || matches!(self.diary_report, HydrationReport::Recovered { .. })
    }
}

/// Favorites and diary, loaded and ready
pub struct Library {
    favorites: Favorites,
    diary: Diary,
    config: Config,
}

impl Library {
    /// Open the library from the default configuration
    pub async fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config).await
    }

    /// Open the library with files under `config.data_dir`
    pub async fn open_with_config(config: Config) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
        Self::open_with_storage(config, storage).await
    }

    /// Open the library on an explicit storage backend
    ///
    /// Both collections are hydrated before this returns.
    pub async fn open_with_storage(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self> {
        let favorites = Favorites::new(Arc::clone(&storage), config.write_policy);
        let diary = Diary::new(storage, config.write_policy);

        favorites
            .load()
            .await
            .context("Failed to load favorites")?;
        diary.load().await.context("Failed to load diary")?;

        info!(
            favorites = favorites.store().len(),
            diary_entries = diary.store().len(),
            policy = %config.write_policy,
            "Library opened"
        );

        Ok(Self {
            favorites,
            diary,
            config,
        })
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn diary(&self) -> &Diary {
        &self.diary
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> LibraryStatus {
        LibraryStatus {
            favorites: self.favorites.store().len(),
            diary_entries: self.diary.store().len(),
            favorites_report: self.favorites.store().hydration_report(),
            diary_report: self.diary.store().hydration_report(),
        }
    }

    /// Wait for in-flight writes and close both collections
    pub async fn shutdown(&self) {
        self.favorites.store().flush().await;
        self.diary.store().flush().await;
        info!("Library closed");
    }
}

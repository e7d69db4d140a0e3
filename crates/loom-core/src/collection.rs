//! Persisted collections
//!
//! A `PersistedCollectionStore` owns one ordered, id-unique list of records
//! and mirrors it into a single key-value slot.
//!
//! ## Lifecycle
//!
//! 1. Created empty
//! 2. `hydrate()` loads the slot exactly once (missing or unreadable data
//!    leaves the collection empty)
//! 3. Mutations read the current list, compute the next one, write it in
//!    full, then publish it
//! 4. `flush()` waits for the in-flight mutation and closes the store
//!
//! Every mutation rewrites the whole slot, so a write costs O(collection
//! size). Collections are meant to stay small (user-curated lists); this is
//! not a general-purpose record store.
//!
//! ## Concurrency
//!
//! Mutations on one store are serialized by an async mutex held across the
//! storage write. Two overlapping calls can therefore never compute from the
//! same stale list and drop each other's change. Snapshots are served from a
//! `watch` channel and never wait for an in-flight write.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStorage, StorageError};

/// A value that can live in a persisted collection
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier, unique within its collection
    fn id(&self) -> &str;
}

/// What a mutation does when the durable write fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Keep the in-memory change and report the failure
    #[default]
    FailOpen,
    /// Leave the collection untouched and return the error
    FailClosed,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::FailOpen => write!(f, "fail_open"),
            WritePolicy::FailClosed => write!(f, "fail_closed"),
        }
    }
}

/// Unknown write policy name
#[derive(Error, Debug)]
#[error("Unknown write policy '{0}'. Use 'fail_open' or 'fail_closed'.")]
pub struct ParseWritePolicyError(String);

impl FromStr for WritePolicy {
    type Err = ParseWritePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(WritePolicy::FailOpen),
            "fail_closed" | "closed" => Ok(WritePolicy::FailClosed),
            _ => Err(ParseWritePolicyError(s.to_string())),
        }
    }
}

/// Errors returned by collection operations
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Mutation attempted before `hydrate()`
    #[error("Collection '{key}' has not been loaded yet")]
    NotHydrated { key: String },

    /// `hydrate()` called a second time
    #[error("Collection '{key}' was already loaded")]
    AlreadyHydrated { key: String },

    /// Operation attempted after `flush()`
    #[error("Collection '{key}' is closed")]
    Closed { key: String },

    /// Records could not be encoded
    #[error("Failed to encode collection '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Durable write failed (only surfaced under `WritePolicy::FailClosed`)
    #[error("Failed to persist collection '{key}': {source}")]
    Persist {
        key: String,
        #[source]
        source: StorageError,
    },
}

/// What hydration found in the durable slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationReport {
    /// `hydrate()` has not run
    NotHydrated,
    /// No prior state
    Empty,
    /// Records loaded
    Loaded { count: usize },
    /// Stored data could not be read or parsed; started empty
    Recovered {
        details: String,
        /// Slot holding a copy of the unreadable value, if one was made
        backup_key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Open,
    Closed,
}

/// One named collection synchronized with durable storage
pub struct PersistedCollectionStore<T: Record> {
    key: String,
    storage: Arc<dyn KeyValueStorage>,
    policy: WritePolicy,
    /// Current snapshot, published after every applied mutation
    records: watch::Sender<Vec<T>>,
    /// Serializes hydration and mutations; held across the storage write
    phase: Mutex<Phase>,
    report: OnceLock<HydrationReport>,
}

impl<T: Record> PersistedCollectionStore<T> {
    /// Create an empty, not yet hydrated store for `key`
    pub fn new(key: impl Into<String>, storage: Arc<dyn KeyValueStorage>, policy: WritePolicy) -> Self {
        let (records, _) = watch::channel(Vec::new());
        Self {
            key: key.into(),
            storage,
            policy,
            records,
            phase: Mutex::new(Phase::Fresh),
            report: OnceLock::new(),
        }
    }

    /// Storage key of this collection
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write failure policy
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// What the one-time hydration found
    pub fn hydration_report(&self) -> HydrationReport {
        self.report
            .get()
            .cloned()
            .unwrap_or(HydrationReport::NotHydrated)
    }

    /// Load the durable slot into memory
    ///
    /// A missing slot yields an empty collection and writes nothing.
    /// Unreadable data is logged, copied to `<key>.corrupt`, and the
    /// collection starts empty. Must be called once, before any mutation.
    pub async fn hydrate(&self) -> Result<Vec<T>, CollectionError> {
        let mut phase = self.phase.lock().await;
        match *phase {
            Phase::Fresh => {}
            Phase::Open => {
                return Err(CollectionError::AlreadyHydrated {
                    key: self.key.clone(),
                })
            }
            Phase::Closed => {
                return Err(CollectionError::Closed {
                    key: self.key.clone(),
                })
            }
        }

        let (records, report) = match self.storage.get(&self.key).await {
            Ok(None) => (Vec::new(), HydrationReport::Empty),
            // Blank slot is treated like a missing one
            Ok(Some(raw)) if raw.trim().is_empty() => (Vec::new(), HydrationReport::Empty),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(records) => {
                    let records = self.dedup(records);
                    let count = records.len();
                    (records, HydrationReport::Loaded { count })
                }
                Err(e) => {
                    error!(key = %self.key, error = %e, "Stored collection is unreadable; starting empty");
                    let backup_key = self.backup_corrupt().await;
                    (
                        Vec::new(),
                        HydrationReport::Recovered {
                            details: e.to_string(),
                            backup_key,
                        },
                    )
                }
            },
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to read stored collection; starting empty");
                // Undecodable data is still on disk; keep a copy before it is overwritten
                let backup_key = if e.is_corrupt_data() {
                    self.backup_corrupt().await
                } else {
                    None
                };
                (
                    Vec::new(),
                    HydrationReport::Recovered {
                        details: e.to_string(),
                        backup_key,
                    },
                )
            }
        };

        debug!(key = %self.key, report = ?report, "Hydrated collection");
        let _ = self.report.set(report);
        self.records.send_replace(records.clone());
        *phase = Phase::Open;

        Ok(records)
    }

    /// Current records
    pub fn snapshot(&self) -> Vec<T> {
        self.records.borrow().clone()
    }

    /// Receive every snapshot published from now on
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.records.subscribe()
    }

    /// Whether a record with `id` is present
    pub fn contains(&self, id: &str) -> bool {
        self.records.borrow().iter().any(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Append `record` unless its id is already present
    ///
    /// An existing id leaves the collection untouched and writes nothing.
    pub async fn upsert_if_absent(&self, record: T) -> Result<Vec<T>, CollectionError> {
        self.mutate("upsert_if_absent", move |current| {
            if current.iter().any(|r| r.id() == record.id()) {
                return None;
            }
            let mut next = current.to_vec();
            next.push(record);
            Some(next)
        })
        .await
    }

    /// Remove every record with `id`; writes nothing if there is none
    pub async fn remove_by_id(&self, id: &str) -> Result<Vec<T>, CollectionError> {
        self.mutate("remove_by_id", |current| {
            if !current.iter().any(|r| r.id() == id) {
                return None;
            }
            Some(current.iter().filter(|r| r.id() != id).cloned().collect())
        })
        .await
    }

    /// Insert `record` at the front
    ///
    /// Ids are not checked; the caller supplies a fresh one.
    pub async fn prepend(&self, record: T) -> Result<Vec<T>, CollectionError> {
        self.mutate("prepend", move |current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(record);
            next.extend_from_slice(current);
            Some(next)
        })
        .await
    }

    /// Remove `record`'s id if present, otherwise append `record`
    ///
    /// Presence is decided inside the serialized mutation, so two rapid
    /// toggles of the same record cancel out.
    pub async fn toggle(&self, record: T) -> Result<Vec<T>, CollectionError> {
        self.mutate("toggle", move |current| {
            if current.iter().any(|r| r.id() == record.id()) {
                Some(
                    current
                        .iter()
                        .filter(|r| r.id() != record.id())
                        .cloned()
                        .collect(),
                )
            } else {
                let mut next = current.to_vec();
                next.push(record);
                Some(next)
            }
        })
        .await
    }

    /// Wait for the in-flight mutation, then refuse further ones
    pub async fn flush(&self) {
        let mut phase = self.phase.lock().await;
        *phase = Phase::Closed;
        debug!(key = %self.key, "Collection closed");
    }

    /// Run one serialized read-compute-persist-publish cycle
    ///
    /// `compute` returns `None` for a no-op.
    async fn mutate<F>(&self, op: &'static str, compute: F) -> Result<Vec<T>, CollectionError>
    where
        F: FnOnce(&[T]) -> Option<Vec<T>>,
    {
        let phase = self.phase.lock().await;
        match *phase {
            Phase::Open => {}
            Phase::Fresh => {
                return Err(CollectionError::NotHydrated {
                    key: self.key.clone(),
                })
            }
            Phase::Closed => {
                return Err(CollectionError::Closed {
                    key: self.key.clone(),
                })
            }
        }

        let current = self.snapshot();
        let Some(next) = compute(current.as_slice()) else {
            debug!(key = %self.key, op, "No change");
            return Ok(current);
        };

        if let Err(e) = self.persist(&next).await {
            match self.policy {
                WritePolicy::FailOpen => {
                    warn!(key = %self.key, op, error = %e, "Persist failed; keeping in-memory change");
                }
                WritePolicy::FailClosed => {
                    warn!(key = %self.key, op, error = %e, "Persist failed; change discarded");
                    return Err(e);
                }
            }
        }

        self.records.send_replace(next.clone());
        debug!(key = %self.key, op, len = next.len(), "Applied mutation");
        drop(phase);

        Ok(next)
    }

    async fn persist(&self, records: &[T]) -> Result<(), CollectionError> {
        let json = serde_json::to_string(records).map_err(|source| CollectionError::Encode {
            key: self.key.clone(),
            source,
        })?;

        self.storage
            .set(&self.key, &json)
            .await
            .map_err(|source| CollectionError::Persist {
                key: self.key.clone(),
                source,
            })
    }

    /// Keep the first record for each id
    fn dedup(&self, records: Vec<T>) -> Vec<T> {
        let total = records.len();
        let mut seen = HashSet::new();
        let records: Vec<T> = records
            .into_iter()
            .filter(|r| seen.insert(r.id().to_string()))
            .collect();

        if records.len() != total {
            warn!(
                key = %self.key,
                dropped = total - records.len(),
                "Stored collection had duplicate ids; kept first occurrences"
            );
        }
        records
    }

    /// Copy an unreadable value aside before the next write replaces it
    async fn backup_corrupt(&self) -> Option<String> {
        let backup_key = format!("{}.corrupt", self.key);
        match self.storage.copy(&self.key, &backup_key).await {
            Ok(true) => Some(backup_key),
            Ok(false) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not back up unreadable collection");
                None
            }
        }
    }
}

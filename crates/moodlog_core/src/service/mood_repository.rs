//! Mood repository.
//!
//! # Responsibility
//! - Give presentation code stable entry points without touching storage.
//!
//! # Invariants
//! - Every call forwards 1:1 to the live store; no business rules here.

use crate::db::{open_db, open_db_in_memory};
use crate::model::entry::{EntryId, MoodEntry};
use crate::repo::entry_repo::RepoResult;
use crate::service::live_store::{ListUpdate, LiveMoodStore, PendingWrite, SubscriptionId};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

/// Pass-through façade over [`LiveMoodStore`].
pub struct MoodRepository {
    store: LiveMoodStore,
}

impl MoodRepository {
    pub fn new(store: LiveMoodStore) -> Self {
        Self { store }
    }

    /// Opens (creating and migrating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        Ok(Self::new(LiveMoodStore::spawn(conn)?))
    }

    pub fn insert_mood(&self, entry: MoodEntry) -> PendingWrite {
        self.store.insert_or_replace(entry)
    }

    pub fn update_mood(&self, entry: MoodEntry) -> PendingWrite {
        self.store.update(entry)
    }

    pub fn delete_mood(&self, entry: MoodEntry) -> PendingWrite {
        self.store.delete(entry)
    }

    pub fn get_mood_by_id(&self, id: EntryId) -> RepoResult<Option<MoodEntry>> {
        self.store.get_by_id(id)
    }

    /// Subscribes to the live, newest-first list of all entries.
    pub fn all_moods(
        &self,
        observer: impl Fn(&ListUpdate) + Send + 'static,
    ) -> RepoResult<SubscriptionId> {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> RepoResult<()> {
        self.store.unsubscribe(id)
    }

    pub fn get_moods_from_date(&self, start: NaiveDate) -> RepoResult<Vec<MoodEntry>> {
        self.store.list_since(start)
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.store.flush()
    }
}

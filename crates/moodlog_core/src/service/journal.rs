//! Journal use-case service.
//!
//! # Responsibility
//! - Provide the presentation-facing entry points (add/edit/remove/lookup).
//! - Keep an owned cache of the latest broadcast snapshot.
//! - Build frequency reports from that cache on demand.
//!
//! # Invariants
//! - The cache is written only by the store broadcast and is replaced
//!   wholesale, never patched.
//! - A broadcast that carries an error replaces the cache with that error
//!   until the next readable list arrives.
//! - Edits keep the original id and timestamp.
//! - Edit/remove of an unknown id returns `NotFound` without queueing a write.

use crate::model::entry::{EntryId, MoodEntry};
use crate::model::mood::Mood;
use crate::repo::entry_repo::{RepoError, RepoResult};
use crate::report::{build_report, MoodReport, ReportWindow};
use crate::service::live_store::{ListUpdate, PendingWrite, Snapshot, SubscriptionId};
use crate::service::mood_repository::MoodRepository;
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Presentation-level view of a single entry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// No snapshot has arrived yet.
    Pending,
    Found(MoodEntry),
    Missing,
    /// The latest broadcast could not read the list.
    Failed(String),
}

#[derive(Debug, Clone)]
enum CachedList {
    Pending,
    Ready(Snapshot),
    Failed(String),
}

impl CachedList {
    fn from_update(update: &ListUpdate) -> Self {
        match update {
            Ok(snapshot) => Self::Ready(Arc::clone(snapshot)),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

type SnapshotCache = Arc<RwLock<CachedList>>;

/// Journal service over a [`MoodRepository`].
pub struct Journal {
    repository: MoodRepository,
    cache: SnapshotCache,
    cache_subscription: SubscriptionId,
}

impl Journal {
    /// Wraps a repository and starts mirroring its live list.
    pub fn new(repository: MoodRepository) -> RepoResult<Self> {
        let cache: SnapshotCache = Arc::new(RwLock::new(CachedList::Pending));
        let writer = Arc::clone(&cache);
        let cache_subscription = repository.all_moods(move |update| {
            let mut slot = writer.write().unwrap_or_else(PoisonError::into_inner);
            *slot = CachedList::from_update(update);
        })?;

        Ok(Self {
            repository,
            cache,
            cache_subscription,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::new(MoodRepository::open(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::new(MoodRepository::open_in_memory()?)
    }

    pub fn repository(&self) -> &MoodRepository {
        &self.repository
    }

    /// Latest cached list, newest first; `None` while pending or failed.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.live_list().ok().flatten()
    }

    /// Latest cached list, or the error carried by the last broadcast.
    ///
    /// `Ok(None)` means no broadcast has arrived yet.
    pub fn live_list(&self) -> RepoResult<Option<Snapshot>> {
        match self.cached() {
            CachedList::Pending => Ok(None),
            CachedList::Ready(snapshot) => Ok(Some(snapshot)),
            CachedList::Failed(message) => Err(RepoError::LiveListUnavailable(message)),
        }
    }

    /// Latest cached list, empty while pending or failed.
    pub fn entries(&self) -> Snapshot {
        self.snapshot().unwrap_or_default()
    }

    /// Blocks until every queued command (and its broadcast) has been applied.
    pub fn flush(&self) -> RepoResult<()> {
        self.repository.flush()
    }

    /// Additional observer of the live list.
    ///
    /// Runs on the store worker thread; blocking journal calls made from it
    /// return `ReentrantCall`.
    pub fn subscribe(
        &self,
        observer: impl Fn(&ListUpdate) + Send + 'static,
    ) -> RepoResult<SubscriptionId> {
        self.repository.all_moods(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> RepoResult<()> {
        self.repository.unsubscribe(id)
    }

    /// Logs a new entry for `mood` at the current time.
    pub fn add_entry(&self, mood: Mood) -> PendingWrite {
        let entry = MoodEntry::new(mood);
        debug!(
            "event=entry_add module=journal status=queued entry_id={}",
            entry.id
        );
        self.repository.insert_mood(entry)
    }

    /// Replaces mood and note of an existing entry.
    pub fn edit_entry(
        &self,
        id: EntryId,
        mood: Mood,
        note: impl Into<String>,
    ) -> RepoResult<PendingWrite> {
        let current = self.require_entry(id)?;
        Ok(self.repository.update_mood(current.edited(mood, note)))
    }

    pub fn remove_entry(&self, id: EntryId) -> RepoResult<PendingWrite> {
        let current = self.require_entry(id)?;
        Ok(self.repository.delete_mood(current))
    }

    /// Reads one entry from storage, observing every previously queued write.
    pub fn get_by_id(&self, id: EntryId) -> RepoResult<Option<MoodEntry>> {
        self.repository.get_mood_by_id(id)
    }

    /// Non-blocking lookup against the cached snapshot.
    pub fn entry_state(&self, id: EntryId) -> EntryState {
        match self.cached() {
            CachedList::Pending => EntryState::Pending,
            CachedList::Failed(message) => EntryState::Failed(message),
            CachedList::Ready(entries) => entries
                .iter()
                .find(|entry| entry.id == id)
                .cloned()
                .map_or(EntryState::Missing, EntryState::Found),
        }
    }

    pub fn entries_since(&self, start: NaiveDate) -> RepoResult<Vec<MoodEntry>> {
        self.repository.get_moods_from_date(start)
    }

    /// Report over the cached snapshot relative to `now`.
    ///
    /// A pending cache yields the empty report; a failed one yields its error.
    pub fn report_at(&self, window: ReportWindow, now: NaiveDateTime) -> RepoResult<MoodReport> {
        let entries = self.live_list()?.unwrap_or_default();
        Ok(build_report(&entries, window, now))
    }

    /// Frequency report for the trailing seven days.
    pub fn weekly_report(&self) -> RepoResult<MoodReport> {
        self.report_at(ReportWindow::weekly(), Local::now().naive_local())
    }

    pub fn all_time_report(&self) -> RepoResult<MoodReport> {
        self.report_at(ReportWindow::AllTime, Local::now().naive_local())
    }

    fn cached(&self) -> CachedList {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_entry(&self, id: EntryId) -> RepoResult<MoodEntry> {
        self.repository
            .get_mood_by_id(id)?
            .ok_or(RepoError::NotFound(id))
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        if let Err(err) = self.repository.unsubscribe(self.cache_subscription) {
            warn!("event=journal_close module=journal status=error error={err}");
        }
    }
}

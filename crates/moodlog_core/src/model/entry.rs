//! Mood entry domain model.
//!
//! # Responsibility
//! - Define the canonical journaled record.
//! - Own creation-time id assignment and the display timestamp format.
//!
//! # Invariants
//! - `id` is derived from the creation instant and strictly increases within
//!   one process, even for entries created in the same millisecond.
//! - `timestamp` is set once at creation; edits never recompute it.
//! - `timestamp` always parses with [`TIMESTAMP_FORMAT`].

use crate::model::mood::Mood;
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};

/// Primary key of a mood entry (Unix epoch milliseconds at creation).
pub type EntryId = i64;

/// Display format of `MoodEntry::timestamp`, e.g. `05 Mar 2025, 09:41 PM`.
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y, %I:%M %p";
/// Day-only variant of the display format, e.g. `05 Mar 2025`.
pub const DATE_FORMAT: &str = "%d %b %Y";
/// Lexically sortable projection of the timestamp, stored as `logged_at`.
pub const SORT_KEY_FORMAT: &str = "%Y-%m-%d %H:%M";

static LAST_ENTRY_ID: AtomicI64 = AtomicI64::new(0);

/// Validation error for entry invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    NonPositiveId(EntryId),
    InvalidTimestamp(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "entry id must be positive, got {id}"),
            Self::InvalidTimestamp(value) => write!(
                f,
                "entry timestamp `{value}` does not match `dd MMM yyyy, hh:mm a`"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// One journaled mood observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: EntryId,
    pub mood: Mood,
    /// Human-readable creation time in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    pub note: String,
}

impl MoodEntry {
    /// Creates a new entry for `mood` logged now, with an empty note.
    pub fn new(mood: Mood) -> Self {
        Self {
            id: next_entry_id(Utc::now().timestamp_millis()),
            mood,
            timestamp: format_timestamp(Local::now().naive_local()),
            note: String::new(),
        }
    }

    /// Builds an entry from already-known fields.
    ///
    /// Used by read paths and tests where identity already exists.
    ///
    /// # Errors
    /// - Returns [`EntryValidationError`] when the fields break entry invariants.
    pub fn with_fields(
        id: EntryId,
        mood: Mood,
        timestamp: impl Into<String>,
        note: impl Into<String>,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id,
            mood,
            timestamp: timestamp.into(),
            note: note.into(),
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Returns a copy with a new mood and note; `id` and `timestamp` are kept.
    pub fn edited(&self, mood: Mood, note: impl Into<String>) -> Self {
        Self {
            id: self.id,
            mood,
            timestamp: self.timestamp.clone(),
            note: note.into(),
        }
    }

    /// Checks entry invariants before persistence.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.id <= 0 {
            return Err(EntryValidationError::NonPositiveId(self.id));
        }
        if parse_timestamp(&self.timestamp).is_none() {
            return Err(EntryValidationError::InvalidTimestamp(
                self.timestamp.clone(),
            ));
        }
        Ok(())
    }

    /// Parsed creation time, or `None` when the timestamp is malformed.
    pub fn logged_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// Chronologically sortable key persisted next to the display timestamp.
    pub fn sort_key(&self) -> Result<String, EntryValidationError> {
        self.logged_at()
            .map(|at| at.format(SORT_KEY_FORMAT).to_string())
            .ok_or_else(|| EntryValidationError::InvalidTimestamp(self.timestamp.clone()))
    }
}

/// Formats a local date-time with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a display timestamp.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Parses a start date given as `dd MMM yyyy` or as a full display timestamp.
pub fn parse_start_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|at| at.date()))
}

/// Returns the next entry id for a creation instant in epoch milliseconds.
///
/// Falls back to `last + 1` when the clock did not advance.
pub fn next_entry_id(now_millis: i64) -> EntryId {
    let mut last = LAST_ENTRY_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now_millis.max(last + 1);
        match LAST_ENTRY_ID.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

/// Raises the id clock to at least `id` so new ids never collide with stored ones.
pub fn seed_entry_ids(id: EntryId) {
    LAST_ENTRY_ID.fetch_max(id, Ordering::Relaxed);
}

//! Core domain logic for the mood journal.
//! This crate is the single source of truth for entry invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LogSettings};
pub use model::entry::{
    format_timestamp, parse_start_date, parse_timestamp, EntryId, EntryValidationError, MoodEntry,
    TIMESTAMP_FORMAT,
};
pub use model::mood::Mood;
pub use repo::entry_repo::{MoodEntryStore, RepoError, RepoResult, SqliteMoodEntryStore};
pub use report::{
    build_report, MoodCount, MoodReport, MoodTally, ReportInsight, ReportWindow,
    DEFAULT_REPORT_DAYS,
};
pub use service::journal::{EntryState, Journal};
pub use service::live_store::{ListUpdate, LiveMoodStore, PendingWrite, Snapshot, SubscriptionId};
pub use service::mood_repository::MoodRepository;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

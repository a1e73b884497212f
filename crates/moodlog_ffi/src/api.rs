//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose journal use-cases (add/edit/remove/lookup/report) to Dart via FRB.
//! - Convert core types into flat, string-friendly view models.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All calls share one process-wide journal opened lazily on first use.
//! - Write calls wait for their own result so the UI gets a definite answer;
//!   the live list still updates through the core broadcast.

use log::error;
use moodlog_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner,
    parse_start_date, ping as ping_inner, EntryState, Journal, Mood, MoodEntry, MoodReport,
    PendingWrite, RepoResult,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const JOURNAL_DB_FILE_NAME: &str = "moodlog.sqlite3";
const JOURNAL_DB_PATH_ENV: &str = "MOODLOG_DB_PATH";

static JOURNAL_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static JOURNAL: OnceLock<Result<Journal, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive);
///   blank selects the build default (`debug` in debug builds, else `info`).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match level.trim() {
        "" => default_log_level(),
        explicit => explicit,
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One selectable palette option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodOption {
    /// Exact label to pass back into `add_entry`/`edit_entry`.
    pub label: String,
    pub name: String,
    pub symbol: String,
}

/// Flat entry view for list and detail screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntryView {
    pub id: i64,
    /// Full palette label, e.g. `Happy 😊`.
    pub mood: String,
    pub timestamp: String,
    pub note: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    /// Affected entry id, when known.
    pub entry_id: Option<i64>,
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, entry_id: i64) -> Self {
        Self {
            ok: true,
            entry_id: Some(entry_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry_id: None,
            message: message.into(),
        }
    }
}

/// Lookup state for the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLookupResponse {
    /// The journal has not delivered its first list yet.
    Pending,
    Found(MoodEntryView),
    Missing,
    /// Journal could not be opened or its latest list could not be read.
    Failed(String),
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListResponse {
    pub items: Vec<MoodEntryView>,
    pub message: String,
}

/// One bar of the frequency chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCountView {
    pub mood: String,
    pub count: u32,
}

/// Frequency report view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodReportView {
    /// Every palette mood in palette order, including zero counts.
    pub counts: Vec<MoodCountView>,
    pub total: u32,
    /// Most frequent mood label; `None` when `total == 0`.
    pub top_mood: Option<String>,
    /// Summary text, or the empty-state message when nothing was logged.
    pub insight: String,
    pub is_empty: bool,
}

/// Returns the fixed palette in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_palette() -> Vec<MoodOption> {
    Mood::ALL
        .into_iter()
        .map(|mood| MoodOption {
            label: mood.label().to_string(),
            name: mood.name().to_string(),
            symbol: mood.symbol().to_string(),
        })
        .collect()
}

/// Logs a new entry for the given palette label.
#[flutter_rust_bridge::frb(sync)]
pub fn add_entry(mood_label: String) -> EntryActionResponse {
    let Some(mood) = Mood::from_label(&mood_label) else {
        return EntryActionResponse::failure(format!("unknown mood `{mood_label}`"));
    };
    run_write("add_entry", "Mood logged.", |journal| {
        Ok(journal.add_entry(mood))
    })
}

/// Replaces mood and note of an existing entry; the timestamp is kept.
///
/// The note is stored exactly as given, surrounding whitespace included.
#[flutter_rust_bridge::frb(sync)]
pub fn edit_entry(id: i64, mood_label: String, note: String) -> EntryActionResponse {
    let Some(mood) = Mood::from_label(&mood_label) else {
        return EntryActionResponse::failure(format!("unknown mood `{mood_label}`"));
    };
    run_write("edit_entry", "Entry updated.", |journal| {
        journal.edit_entry(id, mood, note)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn remove_entry(id: i64) -> EntryActionResponse {
    run_write("remove_entry", "Entry deleted.", |journal| {
        journal.remove_entry(id)
    })
}

/// Non-blocking lookup against the journal's latest list.
#[flutter_rust_bridge::frb(sync)]
pub fn get_entry(id: i64) -> EntryLookupResponse {
    match journal() {
        Ok(journal) => match journal.entry_state(id) {
            EntryState::Pending => EntryLookupResponse::Pending,
            EntryState::Found(entry) => EntryLookupResponse::Found(to_entry_view(&entry)),
            EntryState::Missing => EntryLookupResponse::Missing,
            EntryState::Failed(message) => EntryLookupResponse::Failed(message),
        },
        Err(err) => EntryLookupResponse::Failed(err),
    }
}

/// Latest list, newest first. Empty while the first list is still pending.
#[flutter_rust_bridge::frb(sync)]
pub fn list_entries() -> Vec<MoodEntryView> {
    match journal() {
        Ok(journal) => journal.entries().iter().map(to_entry_view).collect(),
        Err(_) => Vec::new(),
    }
}

/// Lists entries logged on or after `start_date` (`dd MMM yyyy`).
#[flutter_rust_bridge::frb(sync)]
pub fn list_entries_since(start_date: String) -> EntryListResponse {
    let Some(start) = parse_start_date(&start_date) else {
        return EntryListResponse {
            items: Vec::new(),
            message: format!("invalid start date `{}`", start_date.trim()),
        };
    };

    match journal().and_then(|journal| journal.entries_since(start).map_err(|err| err.to_string()))
    {
        Ok(entries) => EntryListResponse {
            message: format!("Found {} entries.", entries.len()),
            items: entries.iter().map(to_entry_view).collect(),
        },
        Err(err) => EntryListResponse {
            items: Vec::new(),
            message: format!("list_entries_since failed: {err}"),
        },
    }
}

/// Frequency report for the trailing seven days.
#[flutter_rust_bridge::frb(sync)]
pub fn weekly_report() -> MoodReportView {
    report_view(
        journal().and_then(|journal| journal.weekly_report().map_err(|err| err.to_string())),
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn all_time_report() -> MoodReportView {
    report_view(
        journal().and_then(|journal| journal.all_time_report().map_err(|err| err.to_string())),
    )
}

fn run_write(
    operation: &str,
    success_message: &str,
    submit: impl FnOnce(&Journal) -> RepoResult<PendingWrite>,
) -> EntryActionResponse {
    let journal = match journal() {
        Ok(journal) => journal,
        Err(err) => return EntryActionResponse::failure(format!("{operation} failed: {err}")),
    };

    let outcome = submit(journal).and_then(|write| {
        let entry_id = write.entry_id();
        write.wait().map(|()| entry_id)
    });
    match outcome {
        Ok(entry_id) => EntryActionResponse::success(success_message, entry_id),
        Err(err) => EntryActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn journal() -> Result<&'static Journal, String> {
    JOURNAL
        .get_or_init(|| {
            let path = resolve_journal_db_path();
            Journal::open(&path).map_err(|err| {
                error!(
                    "event=journal_open module=ffi status=error path={} error={err}",
                    path.display()
                );
                format!("journal open failed: {err}")
            })
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn resolve_journal_db_path() -> PathBuf {
    JOURNAL_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(JOURNAL_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(JOURNAL_DB_FILE_NAME)
        })
        .clone()
}

fn to_entry_view(entry: &MoodEntry) -> MoodEntryView {
    MoodEntryView {
        id: entry.id,
        mood: entry.mood.label().to_string(),
        timestamp: entry.timestamp.clone(),
        note: entry.note.clone(),
    }
}

fn report_view(report: Result<MoodReport, String>) -> MoodReportView {
    match report {
        Ok(report) => MoodReportView {
            counts: report
                .counts
                .iter()
                .map(|bucket| MoodCountView {
                    mood: bucket.mood.label().to_string(),
                    count: bucket.count,
                })
                .collect(),
            total: report.total,
            top_mood: report.top.map(|mood| mood.label().to_string()),
            insight: report.insight().to_string(),
            is_empty: report.is_empty(),
        },
        Err(err) => MoodReportView {
            counts: Vec::new(),
            total: 0,
            top_mood: None,
            insight: err,
            is_empty: true,
        },
    }
}

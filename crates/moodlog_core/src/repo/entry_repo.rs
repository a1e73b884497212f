//! Mood entry store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD over the `mood_entries` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `MoodEntry::validate()` before SQL mutations.
//! - Every mutation is one SQL statement; rows are never partially written.
//! - List results are strictly descending by `id`.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::entry::{EntryId, EntryValidationError, MoodEntry, SORT_KEY_FORMAT};
use crate::model::mood::Mood;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    mood,
    timestamp,
    note
FROM mood_entries";

const REQUIRED_TABLE: &str = "mood_entries";
const REQUIRED_COLUMNS: &[&str] = &["id", "mood", "timestamp", "note", "logged_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    /// Operation referenced an id that is not stored.
    NotFound(EntryId),
    /// Persisted row breaks entry invariants.
    InvalidData(String),
    /// Background store worker is no longer running.
    StoreClosed,
    /// Blocking store call issued from the store's own worker thread.
    ReentrantCall,
    /// The live entry list could not be read after the last change.
    LiveListUnavailable(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Whether the error comes from the durability layer rather than input.
    pub fn is_storage_failure(&self) -> bool {
        !matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::ReentrantCall
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "mood entry not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::StoreClosed => write!(f, "mood entry store is closed"),
            Self::ReentrantCall => write!(
                f,
                "blocking mood entry store call from inside a list observer"
            ),
            Self::LiveListUnavailable(message) => {
                write!(f, "mood entry list unavailable: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed CRUD contract over durable mood entries.
pub trait MoodEntryStore {
    /// Writes `entry`, fully replacing any record with the same id.
    fn insert_or_replace(&self, entry: &MoodEntry) -> RepoResult<()>;
    /// Replaces an existing record; `NotFound` when the id is not stored.
    fn update(&self, entry: &MoodEntry) -> RepoResult<()>;
    /// Removes the record with `entry.id`; `NotFound` when absent.
    fn delete(&self, entry: &MoodEntry) -> RepoResult<()>;
    fn get_by_id(&self, id: EntryId) -> RepoResult<Option<MoodEntry>>;
    /// All records, newest (highest id) first.
    fn list_all(&self) -> RepoResult<Vec<MoodEntry>>;
    /// Records logged on or after local midnight of `start`, newest first.
    fn list_since(&self, start: NaiveDate) -> RepoResult<Vec<MoodEntry>>;
}

/// SQLite-backed entry store.
pub struct SqliteMoodEntryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMoodEntryStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema is
    ///   not the one this binary writes.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let columns = table_columns(conn, REQUIRED_TABLE)?;
        if columns.is_empty() {
            return Err(RepoError::MissingRequiredTable(REQUIRED_TABLE));
        }
        if let Some(&column) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !columns.iter().any(|name| name == **column))
        {
            return Err(RepoError::MissingRequiredColumn {
                table: REQUIRED_TABLE,
                column,
            });
        }

        Ok(Self { conn })
    }

    /// Largest stored id, or `None` for an empty table.
    pub fn max_id(&self) -> RepoResult<Option<EntryId>> {
        let max_id = self
            .conn
            .query_row("SELECT MAX(id) FROM mood_entries;", [], |row| row.get(0))?;
        Ok(max_id)
    }

    fn query_entries(&self, sql: &str, params: impl Params) -> RepoResult<Vec<MoodEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }
}

impl MoodEntryStore for SqliteMoodEntryStore<'_> {
    fn insert_or_replace(&self, entry: &MoodEntry) -> RepoResult<()> {
        entry.validate()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO mood_entries (
                id,
                mood,
                timestamp,
                note,
                logged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id,
                entry.mood.label(),
                entry.timestamp.as_str(),
                entry.note.as_str(),
                entry.sort_key()?,
            ],
        )?;

        Ok(())
    }

    fn update(&self, entry: &MoodEntry) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE mood_entries
             SET
                mood = ?1,
                timestamp = ?2,
                note = ?3,
                logged_at = ?4
             WHERE id = ?5;",
            params![
                entry.mood.label(),
                entry.timestamp.as_str(),
                entry.note.as_str(),
                entry.sort_key()?,
                entry.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn delete(&self, entry: &MoodEntry) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM mood_entries WHERE id = ?1;", [entry.id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn get_by_id(&self, id: EntryId) -> RepoResult<Option<MoodEntry>> {
        let mut entries = self.query_entries(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(entries.pop())
    }

    fn list_all(&self) -> RepoResult<Vec<MoodEntry>> {
        self.query_entries(&format!("{ENTRY_SELECT_SQL} ORDER BY id DESC;"), params![])
    }

    fn list_since(&self, start: NaiveDate) -> RepoResult<Vec<MoodEntry>> {
        let lower_bound = start
            .and_hms_opt(0, 0, 0)
            .map(|at| at.format(SORT_KEY_FORMAT).to_string())
            .ok_or_else(|| RepoError::InvalidData(format!("invalid start date `{start}`")))?;

        self.query_entries(
            &format!("{ENTRY_SELECT_SQL} WHERE logged_at >= ?1 ORDER BY id DESC;"),
            [lower_bound],
        )
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<MoodEntry> {
    let id: EntryId = row.get("id")?;

    let mood_text: String = row.get("mood")?;
    let mood = Mood::from_label(&mood_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "unknown mood label `{mood_text}` in mood_entries.mood (id {id})"
        ))
    })?;

    let entry = MoodEntry {
        id,
        mood,
        timestamp: row.get("timestamp")?,
        note: row.get("note")?,
    };
    entry
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} (id {id})")))?;
    Ok(entry)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

use chrono::NaiveDate;
use moodlog_core::db::migrations::latest_version;
use moodlog_core::db::open_db_in_memory;
use moodlog_core::{Mood, MoodEntry, MoodEntryStore, RepoError, SqliteMoodEntryStore};
use rusqlite::Connection;

fn entry(id: i64, mood: Mood, timestamp: &str, note: &str) -> MoodEntry {
    MoodEntry::with_fields(id, mood, timestamp, note).unwrap()
}

fn ids(entries: &[MoodEntry]) -> Vec<i64> {
    entries.iter().map(|entry| entry.id).collect()
}

#[test]
fn insert_then_get_and_list_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let inserted = entry(100, Mood::Happy, "05 Mar 2025, 09:41 PM", "long walk");
    store.insert_or_replace(&inserted).unwrap();

    let loaded = store.get_by_id(100).unwrap().unwrap();
    assert_eq!(loaded, inserted);

    let listed = store.list_all().unwrap();
    assert_eq!(listed, vec![inserted]);
}

#[test]
fn insert_with_existing_id_replaces_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    store
        .insert_or_replace(&entry(7, Mood::Sad, "01 Jan 2025, 08:00 AM", "first"))
        .unwrap();
    let replacement = entry(7, Mood::Calm, "02 Jan 2025, 09:00 AM", "second");
    store.insert_or_replace(&replacement).unwrap();

    assert_eq!(store.list_all().unwrap(), vec![replacement]);
}

#[test]
fn list_all_is_strictly_descending_by_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    for id in [30, 10, 50, 20, 40] {
        store
            .insert_or_replace(&entry(id, Mood::Neutral, "01 Jan 2025, 08:00 AM", ""))
            .unwrap();
    }
    store
        .delete(&entry(20, Mood::Neutral, "01 Jan 2025, 08:00 AM", ""))
        .unwrap();

    let listed = ids(&store.list_all().unwrap());
    assert_eq!(listed, vec![50, 40, 30, 10]);
    assert!(listed.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn list_all_is_idempotent_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    store
        .insert_or_replace(&entry(1, Mood::Happy, "01 Jan 2025, 08:00 AM", "a"))
        .unwrap();
    store
        .insert_or_replace(&entry(2, Mood::Anxious, "01 Jan 2025, 09:00 AM", "b"))
        .unwrap();

    assert_eq!(store.list_all().unwrap(), store.list_all().unwrap());
}

#[test]
fn update_replaces_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let original = entry(5, Mood::Sad, "01 Jan 2025, 08:00 AM", "tired");
    store.insert_or_replace(&original).unwrap();

    let edited = original.edited(Mood::Happy, "coffee helped");
    store.update(&edited).unwrap();

    let loaded = store.get_by_id(5).unwrap().unwrap();
    assert_eq!(loaded, edited);
    assert_eq!(loaded.timestamp, original.timestamp);
}

#[test]
fn update_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let err = store
        .update(&entry(9, Mood::Calm, "01 Jan 2025, 08:00 AM", ""))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(9)));
    assert!(!err.is_storage_failure());
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn delete_removes_record_and_rejects_second_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let doomed = entry(3, Mood::Anxious, "01 Jan 2025, 08:00 AM", "");
    store.insert_or_replace(&doomed).unwrap();
    store.delete(&doomed).unwrap();

    assert!(store.get_by_id(3).unwrap().is_none());
    assert!(store.list_all().unwrap().is_empty());

    let err = store.delete(&doomed).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(3)));
}

#[test]
fn get_by_id_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    assert!(store.get_by_id(12345).unwrap().is_none());
}

#[test]
fn invalid_entry_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let bad = MoodEntry {
        id: 1,
        mood: Mood::Calm,
        timestamp: "yesterday".to_string(),
        note: String::new(),
    };
    let err = store.insert_or_replace(&bad).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn list_since_compares_chronologically_across_months() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    store
        .insert_or_replace(&entry(1, Mood::Sad, "28 Jan 2025, 10:00 PM", ""))
        .unwrap();
    store
        .insert_or_replace(&entry(2, Mood::Calm, "01 Feb 2025, 12:30 AM", ""))
        .unwrap();
    store
        .insert_or_replace(&entry(3, Mood::Happy, "03 Feb 2025, 07:15 PM", ""))
        .unwrap();
    store
        .insert_or_replace(&entry(4, Mood::Neutral, "31 Jan 2025, 11:59 PM", ""))
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let since = store.list_since(start).unwrap();
    assert_eq!(ids(&since), vec![3, 2]);
}

#[test]
fn unknown_persisted_mood_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO mood_entries (id, mood, timestamp, note, logged_at)
         VALUES (1, 'Happy', '01 Jan 2025, 08:00 AM', '', '2025-01-01 08:00');",
        [],
    )
    .unwrap();
    let store = SqliteMoodEntryStore::try_new(&conn).unwrap();

    let err = store.list_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(err.is_storage_failure());
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteMoodEntryStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_entry_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMoodEntryStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("mood_entries"))
    ));
}

#[test]
fn store_rejects_connection_missing_sort_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE mood_entries (
            id INTEGER PRIMARY KEY NOT NULL,
            mood TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT ''
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMoodEntryStore::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "mood_entries",
            column: "logged_at"
        })
    ));
}

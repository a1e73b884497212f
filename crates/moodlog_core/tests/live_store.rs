use moodlog_core::db::open_db_in_memory;
use moodlog_core::{
    ListUpdate, LiveMoodStore, Mood, MoodEntry, MoodRepository, RepoError, Snapshot,
};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn entry(id: i64, mood: Mood) -> MoodEntry {
    MoodEntry::with_fields(id, mood, "01 Jan 2025, 08:00 AM", "").unwrap()
}

fn spawn_store() -> LiveMoodStore {
    LiveMoodStore::spawn(open_db_in_memory().unwrap()).unwrap()
}

fn forward_to(tx: Sender<Snapshot>) -> impl Fn(&ListUpdate) + Send + 'static {
    move |update| {
        if let Ok(snapshot) = update {
            let _ = tx.send(Arc::clone(snapshot));
        }
    }
}

fn ids(snapshot: &Snapshot) -> Vec<i64> {
    snapshot.iter().map(|entry| entry.id).collect()
}

#[test]
fn subscriber_receives_current_snapshot_then_every_mutation() {
    let store = spawn_store();
    store.insert_or_replace(entry(1, Mood::Calm)).wait().unwrap();

    let (tx, rx) = mpsc::channel();
    store
        .subscribe(forward_to(tx))
        .unwrap();

    assert_eq!(ids(&rx.recv_timeout(RECV_TIMEOUT).unwrap()), vec![1]);

    store.insert_or_replace(entry(2, Mood::Happy));
    assert_eq!(ids(&rx.recv_timeout(RECV_TIMEOUT).unwrap()), vec![2, 1]);

    store.update(entry(1, Mood::Sad));
    let after_update = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(ids(&after_update), vec![2, 1]);
    assert_eq!(after_update[1].mood, Mood::Sad);

    store.delete(entry(2, Mood::Happy));
    assert_eq!(ids(&rx.recv_timeout(RECV_TIMEOUT).unwrap()), vec![1]);
}

#[test]
fn every_observer_gets_the_same_snapshot() {
    let store = spawn_store();
    let (first_tx, first_rx) = mpsc::channel();
    let (second_tx, second_rx) = mpsc::channel();
    store
        .subscribe(forward_to(first_tx))
        .unwrap();
    store
        .subscribe(forward_to(second_tx))
        .unwrap();

    store.insert_or_replace(entry(10, Mood::Neutral)).wait().unwrap();

    for rx in [&first_rx, &second_rx] {
        assert!(rx.recv_timeout(RECV_TIMEOUT).unwrap().is_empty());
        assert_eq!(ids(&rx.recv_timeout(RECV_TIMEOUT).unwrap()), vec![10]);
    }
}

#[test]
fn failed_write_reports_error_and_broadcasts_nothing() {
    let store = spawn_store();
    let (tx, rx) = mpsc::channel();
    store
        .subscribe(forward_to(tx))
        .unwrap();
    assert!(rx.recv_timeout(RECV_TIMEOUT).unwrap().is_empty());

    let err = store.update(entry(99, Mood::Calm)).wait().unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));

    store.flush().unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn unsubscribed_observer_stops_receiving() {
    let store = spawn_store();
    let (tx, rx) = mpsc::channel();
    let subscription = store
        .subscribe(forward_to(tx))
        .unwrap();
    rx.recv_timeout(RECV_TIMEOUT).unwrap();

    store.unsubscribe(subscription).unwrap();
    store.insert_or_replace(entry(4, Mood::Happy)).wait().unwrap();

    assert!(rx.try_recv().is_err());
}

#[test]
fn writes_apply_in_submission_order() {
    let store = spawn_store();
    let pending: Vec<_> = (1..=20)
        .map(|id| store.insert_or_replace(entry(id, Mood::Calm)))
        .collect();
    let last = store.update(entry(20, Mood::Anxious));

    for write in pending {
        write.wait().unwrap();
    }
    last.wait().unwrap();

    let listed = store.list_all().unwrap();
    assert_eq!(listed.len(), 20);
    assert_eq!(listed[0].id, 20);
    assert_eq!(listed[0].mood, Mood::Anxious);
}

#[test]
fn reads_observe_previously_queued_writes() {
    let store = spawn_store();
    let write = store.insert_or_replace(entry(8, Mood::Happy));

    assert_eq!(store.get_by_id(8).unwrap(), Some(entry(8, Mood::Happy)));
    assert_eq!(write.entry_id(), 8);
    write.wait().unwrap();
}

#[test]
fn repository_forwards_to_store() {
    let repository = MoodRepository::open_in_memory().unwrap();
    let inserted = entry(21, Mood::Sad);

    repository.insert_mood(inserted.clone()).wait().unwrap();
    assert_eq!(repository.get_mood_by_id(21).unwrap(), Some(inserted.clone()));

    let edited = inserted.edited(Mood::Calm, "better");
    repository.update_mood(edited.clone()).wait().unwrap();
    assert_eq!(repository.get_mood_by_id(21).unwrap(), Some(edited.clone()));

    repository.delete_mood(edited).wait().unwrap();
    assert_eq!(repository.get_mood_by_id(21).unwrap(), None);
}

#[test]
fn unreadable_list_reaches_observers_as_error() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO mood_entries (id, mood, timestamp, note, logged_at)
         VALUES (1, 'Happy', '01 Jan 2025, 08:00 AM', '', '2025-01-01 08:00');",
        [],
    )
    .unwrap();
    let store = LiveMoodStore::spawn(conn).unwrap();

    let (tx, rx) = mpsc::channel();
    store
        .subscribe(move |update| {
            let outcome = match update {
                Ok(snapshot) => Ok(snapshot.len()),
                Err(err) => Err(err.to_string()),
            };
            let _ = tx.send(outcome);
        })
        .unwrap();
    let initial = rx.recv_timeout(RECV_TIMEOUT).unwrap().unwrap_err();
    assert!(initial.contains("invalid persisted entry data"));

    store.insert_or_replace(entry(2, Mood::Calm)).wait().unwrap();
    assert!(rx.recv_timeout(RECV_TIMEOUT).unwrap().is_err());
}

#[test]
fn observer_calling_back_into_store_gets_reentrant_error() {
    let store = Arc::new(spawn_store());
    let (tx, rx) = mpsc::channel();
    let inner = Arc::downgrade(&store);
    store
        .subscribe(move |_| {
            if let Some(store) = inner.upgrade() {
                let _ = tx.send(store.list_all().map(|entries| entries.len()));
            }
        })
        .unwrap();

    let outcome = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(matches!(outcome, Err(RepoError::ReentrantCall)));
    store.flush().unwrap();
}

#[test]
fn new_ids_skip_past_stored_ids() {
    let far_future = chrono::Utc::now().timestamp_millis() + 86_400_000;
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO mood_entries (id, mood, timestamp, note, logged_at)
         VALUES (?1, 'Calm 🙂', '01 Jan 2025, 08:00 AM', '', '2025-01-01 08:00');",
        [far_future],
    )
    .unwrap();
    let store = LiveMoodStore::spawn(conn).unwrap();

    let fresh = MoodEntry::new(Mood::Happy);
    assert!(fresh.id > far_future);
    store.insert_or_replace(fresh).wait().unwrap();
    assert_eq!(store.list_all().unwrap().len(), 2);
}

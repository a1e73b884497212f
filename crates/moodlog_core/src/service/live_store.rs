//! Live entry store backed by a dedicated writer thread.
//!
//! # Responsibility
//! - Own the SQLite connection on one worker thread.
//! - Serialize writes in submission order without blocking callers.
//! - Broadcast the full ordered entry list to observers after each mutation.
//!
//! # Invariants
//! - Exactly one thread touches the connection.
//! - Observers receive the current list on registration and a fresh one
//!   after every successful insert/update/delete, before the write reply.
//! - A list that cannot be read is delivered to observers as an error.
//! - A failed write broadcasts nothing.
//! - Blocking calls made from the worker thread fail with `ReentrantCall`.

use crate::model::entry::{seed_entry_ids, EntryId, MoodEntry};
use crate::repo::entry_repo::{MoodEntryStore, RepoError, RepoResult, SqliteMoodEntryStore};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "moodlog-store";

/// Immutable point-in-time copy of all entries, newest first.
pub type Snapshot = Arc<Vec<MoodEntry>>;

/// What observers receive: the full list, or the error that prevented reading it.
pub type ListUpdate = RepoResult<Snapshot>;

/// Handle returned by `subscribe`, used to unregister an observer.
pub type SubscriptionId = u64;

type Observer = Box<dyn Fn(&ListUpdate) + Send + 'static>;
type Reply<T> = Sender<RepoResult<T>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOp {
    Insert,
    Update,
    Delete,
}

impl WriteOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

enum Command {
    Write {
        op: WriteOp,
        entry: MoodEntry,
        reply: Reply<()>,
    },
    GetById {
        id: EntryId,
        reply: Reply<Option<MoodEntry>>,
    },
    ListAll {
        reply: Reply<Vec<MoodEntry>>,
    },
    ListSince {
        start: NaiveDate,
        reply: Reply<Vec<MoodEntry>>,
    },
    Subscribe {
        id: SubscriptionId,
        observer: Observer,
    },
    Unsubscribe(SubscriptionId),
    Flush {
        reply: Reply<()>,
    },
    Shutdown,
}

/// Fire-and-forget write handle.
///
/// Dropping it is fine; the write still runs and its effect reaches
/// observers through the broadcast. `wait` blocks for the write's own result.
#[derive(Debug)]
pub struct PendingWrite {
    entry_id: EntryId,
    worker_thread: ThreadId,
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Queued(Receiver<RepoResult<()>>),
    Rejected(RepoError),
}

impl PendingWrite {
    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    /// Blocks until the worker has applied (and broadcast) this write.
    ///
    /// Fails with `ReentrantCall` when called from an observer.
    pub fn wait(self) -> RepoResult<()> {
        if std::thread::current().id() == self.worker_thread {
            return Err(RepoError::ReentrantCall);
        }
        match self.state {
            PendingState::Queued(reply) => reply.recv().unwrap_or(Err(RepoError::StoreClosed)),
            PendingState::Rejected(err) => Err(err),
        }
    }
}

/// Entry store with serialized background writes and a live list view.
pub struct LiveMoodStore {
    commands: Sender<Command>,
    next_subscription: AtomicU64,
    worker_thread: ThreadId,
    worker: Option<JoinHandle<()>>,
}

impl LiveMoodStore {
    /// Moves a migrated connection onto a new worker thread.
    ///
    /// # Errors
    /// - Schema errors from [`SqliteMoodEntryStore::try_new`].
    /// - `StoreClosed` when the worker thread cannot be spawned.
    pub fn spawn(conn: Connection) -> RepoResult<Self> {
        let stored_max_id = SqliteMoodEntryStore::try_new(&conn)?.max_id()?;
        if let Some(max_id) = stored_max_id {
            seed_entry_ids(max_id);
        }

        let (commands, inbox) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(conn, inbox))
            .map_err(|err| {
                error!(
                    "event=store_start module=live_store status=error error_code=spawn_failed error={err}"
                );
                RepoError::StoreClosed
            })?;

        Ok(Self {
            commands,
            next_subscription: AtomicU64::new(1),
            worker_thread: worker.thread().id(),
            worker: Some(worker),
        })
    }

    pub fn insert_or_replace(&self, entry: MoodEntry) -> PendingWrite {
        self.submit_write(WriteOp::Insert, entry)
    }

    pub fn update(&self, entry: MoodEntry) -> PendingWrite {
        self.submit_write(WriteOp::Update, entry)
    }

    pub fn delete(&self, entry: MoodEntry) -> PendingWrite {
        self.submit_write(WriteOp::Delete, entry)
    }

    pub fn get_by_id(&self, id: EntryId) -> RepoResult<Option<MoodEntry>> {
        self.request(|reply| Command::GetById { id, reply })
    }

    /// One-shot read of the ordered list; observers get the same data pushed.
    pub fn list_all(&self) -> RepoResult<Vec<MoodEntry>> {
        self.request(|reply| Command::ListAll { reply })
    }

    pub fn list_since(&self, start: NaiveDate) -> RepoResult<Vec<MoodEntry>> {
        self.request(|reply| Command::ListSince { start, reply })
    }

    /// Registers an observer of the live ordered list.
    ///
    /// The observer runs on the worker thread. It is called once with the
    /// current list, then after every successful mutation. It must not block
    /// on this store: reads, `flush` and `PendingWrite::wait` issued from
    /// inside an observer return `ReentrantCall`.
    pub fn subscribe(
        &self,
        observer: impl Fn(&ListUpdate) + Send + 'static,
    ) -> RepoResult<SubscriptionId> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.commands
            .send(Command::Subscribe {
                id,
                observer: Box::new(observer),
            })
            .map_err(|_| RepoError::StoreClosed)?;
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> RepoResult<()> {
        self.commands
            .send(Command::Unsubscribe(id))
            .map_err(|_| RepoError::StoreClosed)
    }

    /// Blocks until every previously submitted command has been processed.
    pub fn flush(&self) -> RepoResult<()> {
        self.request(|reply| Command::Flush { reply })
    }

    fn submit_write(&self, op: WriteOp, entry: MoodEntry) -> PendingWrite {
        let entry_id = entry.id;
        let (reply, outcome) = mpsc::channel();
        let state = match self.commands.send(Command::Write { op, entry, reply }) {
            Ok(()) => PendingState::Queued(outcome),
            Err(_) => {
                warn!(
                    "event=entry_write module=live_store status=rejected op={} entry_id={entry_id}",
                    op.as_str()
                );
                PendingState::Rejected(RepoError::StoreClosed)
            }
        };
        PendingWrite {
            entry_id,
            worker_thread: self.worker_thread,
            state,
        }
    }

    fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> RepoResult<T> {
        if std::thread::current().id() == self.worker_thread {
            return Err(RepoError::ReentrantCall);
        }
        let (reply, outcome) = mpsc::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| RepoError::StoreClosed)?;
        outcome.recv().unwrap_or(Err(RepoError::StoreClosed))
    }
}

impl Drop for LiveMoodStore {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=store_stop module=live_store status=error error_code=worker_panicked");
            }
        }
    }
}

fn run_worker(conn: Connection, inbox: Receiver<Command>) {
    let store = match SqliteMoodEntryStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            error!("event=store_start module=live_store status=error error={err}");
            return;
        }
    };
    info!("event=store_start module=live_store status=ok");

    let mut observers: Vec<(SubscriptionId, Observer)> = Vec::new();

    while let Ok(command) = inbox.recv() {
        match command {
            Command::Write { op, entry, reply } => {
                let started_at = Instant::now();
                let result = apply_write(&store, op, &entry);
                match &result {
                    Ok(()) => {
                        debug!(
                            "event=entry_write module=live_store status=ok op={} entry_id={} duration_ms={}",
                            op.as_str(),
                            entry.id,
                            started_at.elapsed().as_millis()
                        );
                        broadcast(&store, &observers);
                    }
                    Err(err) => error!(
                        "event=entry_write module=live_store status=error op={} entry_id={} error={err}",
                        op.as_str(),
                        entry.id
                    ),
                }
                let _ = reply.send(result);
            }
            Command::GetById { id, reply } => {
                let _ = reply.send(store.get_by_id(id));
            }
            Command::ListAll { reply } => {
                let _ = reply.send(store.list_all());
            }
            Command::ListSince { start, reply } => {
                let _ = reply.send(store.list_since(start));
            }
            Command::Subscribe { id, observer } => {
                let update = read_list(&store);
                if let Err(err) = &update {
                    error!(
                        "event=subscribe module=live_store status=error subscription_id={id} error={err}"
                    );
                }
                observer(&update);
                observers.push((id, observer));
                debug!(
                    "event=subscribe module=live_store status=ok subscription_id={id} observers={}",
                    observers.len()
                );
            }
            Command::Unsubscribe(id) => {
                observers.retain(|(registered, _)| *registered != id);
            }
            Command::Flush { reply } => {
                let _ = reply.send(Ok(()));
            }
            Command::Shutdown => break,
        }
    }

    info!("event=store_stop module=live_store status=ok");
}

fn apply_write(store: &impl MoodEntryStore, op: WriteOp, entry: &MoodEntry) -> RepoResult<()> {
    match op {
        WriteOp::Insert => store.insert_or_replace(entry),
        WriteOp::Update => store.update(entry),
        WriteOp::Delete => store.delete(entry),
    }
}

fn broadcast(store: &impl MoodEntryStore, observers: &[(SubscriptionId, Observer)]) {
    if observers.is_empty() {
        return;
    }

    let update = read_list(store);
    for (_, observer) in observers {
        observer(&update);
    }
    match &update {
        Ok(snapshot) => debug!(
            "event=broadcast module=live_store status=ok observers={} entries={}",
            observers.len(),
            snapshot.len()
        ),
        Err(err) => error!(
            "event=broadcast module=live_store status=error observers={} error={err}",
            observers.len()
        ),
    }
}

fn read_list(store: &impl MoodEntryStore) -> ListUpdate {
    store.list_all().map(Arc::new)
}

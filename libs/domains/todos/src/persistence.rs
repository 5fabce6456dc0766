//! Durable snapshot of the todo store.
//!
//! The whole collection plus the id counter is written as one JSON document
//! after every mutation and read back once at startup.

use async_trait::async_trait;
use observability::TodoMetrics;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{PersistenceError, PersistenceResult};
use crate::models::{Todo, TodoId};

/// The single durable record
///
/// Missing and `null` fields both fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub todos: Vec<Todo>,
    /// Next id to assign
    #[serde(default = "first_id", deserialize_with = "null_as_first_id")]
    pub counter: TodoId,
}

fn first_id() -> TodoId {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_first_id<'de, D>(deserializer: D) -> Result<TodoId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TodoId>::deserialize(deserializer)?.unwrap_or_else(first_id))
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            counter: first_id(),
        }
    }
}

impl PersistedState {
    pub fn new(todos: Vec<Todo>, counter: TodoId) -> Self {
        Self { todos, counter }
    }

    fn max_id(&self) -> TodoId {
        self.todos.iter().map(|t| t.id).max().unwrap_or(0)
    }
}

/// Storage backend for the snapshot
#[async_trait]
pub trait TodoPersistence: Send + Sync {
    /// Read the stored snapshot; `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> PersistenceResult<Option<PersistedState>>;

    /// Replace the stored snapshot
    async fn save(&self, state: &PersistedState) -> PersistenceResult<()>;

    /// Readiness probe for the backing storage
    async fn check(&self) -> PersistenceResult<()>;
}

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl TodoPersistence for JsonFilePersistence {
    async fn load(&self) -> PersistenceResult<Option<PersistedState>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// never see a partial document
    async fn save(&self, state: &PersistedState) -> PersistenceResult<()> {
        let data = serde_json::to_vec_pretty(state)?;

        tokio::fs::create_dir_all(self.parent_dir()).await?;

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    async fn check(&self) -> PersistenceResult<()> {
        let metadata = tokio::fs::metadata(self.parent_dir()).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.parent_dir().display()),
            )))
        }
    }
}

/// In-memory implementation of TodoPersistence (for development/testing)
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    state: Mutex<Option<PersistedState>>,
    saves: AtomicUsize,
    failing: bool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot, as if read from disk
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// Every load and save fails with an I/O error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Most recently saved snapshot
    pub async fn last_saved(&self) -> Option<PersistedState> {
        self.state.lock().await.clone()
    }

    fn unavailable() -> PersistenceError {
        PersistenceError::Io(std::io::Error::other("storage unavailable"))
    }
}

#[async_trait]
impl TodoPersistence for InMemoryPersistence {
    async fn load(&self) -> PersistenceResult<Option<PersistedState>> {
        if self.failing {
            return Err(Self::unavailable());
        }
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> PersistenceResult<()> {
        if self.failing {
            return Err(Self::unavailable());
        }
        *self.state.lock().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn check(&self) -> PersistenceResult<()> {
        if self.failing {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

/// Read the startup state.
///
/// Missing or unreadable data starts an empty store with counter 1. A counter
/// that does not exceed every stored id is raised so ids are never reused.
/// Data whose highest id leaves no room for another counts as unreadable.
pub async fn load_state<P: TodoPersistence + ?Sized>(persistence: &P) -> PersistedState {
    let mut state = match persistence.load().await {
        Ok(Some(state)) => state,
        Ok(None) => {
            info!("No stored todos found, starting empty");
            return PersistedState::default();
        }
        Err(e) => {
            error!(error = %e, "Failed to load todos, starting empty");
            return PersistedState::default();
        }
    };

    let max_id = state.max_id();
    if state.counter <= max_id {
        let Some(next) = max_id.checked_add(1) else {
            error!(max_id = max_id, "Stored ids exhaust the id space, starting empty");
            return PersistedState::default();
        };
        warn!(
            counter = state.counter,
            max_id = max_id,
            "Stored counter does not exceed existing ids, raising it"
        );
        state.counter = next;
    }

    info!(
        todos = state.todos.len(),
        counter = state.counter,
        "Loaded stored todos"
    );
    state
}

enum FlushRequest {
    Save(PersistedState),
    Barrier(oneshot::Sender<()>),
}

/// Background writer for store snapshots.
///
/// Snapshots are saved one at a time in the order they were queued, so a
/// later state is never overwritten by an earlier one. Failures are logged
/// and counted; they never reach the caller that queued the snapshot.
#[derive(Debug, Clone)]
pub struct Flusher {
    tx: mpsc::UnboundedSender<FlushRequest>,
}

impl Flusher {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn<P>(persistence: Arc<P>) -> Self
    where
        P: TodoPersistence + ?Sized + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    FlushRequest::Save(state) => {
                        let started = Instant::now();
                        match persistence.save(&state).await {
                            Ok(()) => {
                                TodoMetrics::record_flush(started.elapsed().as_secs_f64());
                            }
                            Err(e) => {
                                TodoMetrics::record_flush_failure();
                                error!(error = %e, "Failed to save todos");
                            }
                        }
                    }
                    FlushRequest::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Flusher stopped");
        });

        Self { tx }
    }

    /// Queue a snapshot without waiting for it to be written
    pub fn enqueue(&self, state: PersistedState) {
        if self.tx.send(FlushRequest::Save(state)).is_err() {
            error!("Flusher is not running, snapshot dropped");
        }
    }

    /// Wait until every snapshot queued before this call has been handled
    pub async fn sync(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(FlushRequest::Barrier(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TodoPriority;

    fn todo(id: TodoId, task: &str) -> Todo {
        Todo::new(id, task.to_string(), TodoPriority::Medium)
    }

    #[tokio::test]
    async fn test_load_state_without_data_starts_empty() {
        let state = load_state(&InMemoryPersistence::new()).await;
        assert!(state.todos.is_empty());
        assert_eq!(state.counter, 1);
    }

    #[tokio::test]
    async fn test_load_state_with_failing_storage_starts_empty() {
        let state = load_state(&InMemoryPersistence::failing()).await;
        assert_eq!(state, PersistedState::default());
    }

    #[tokio::test]
    async fn test_load_state_raises_stale_counter() {
        let stored = PersistedState::new(vec![todo(4, "a"), todo(9, "b")], 3);
        let state = load_state(&InMemoryPersistence::with_state(stored)).await;
        assert_eq!(state.counter, 10);
        assert_eq!(state.todos.len(), 2);
    }

    #[tokio::test]
    async fn test_load_state_keeps_valid_counter() {
        let stored = PersistedState::new(vec![todo(2, "a")], 8);
        let state = load_state(&InMemoryPersistence::with_state(stored)).await;
        assert_eq!(state.counter, 8);
    }

    #[test]
    fn test_persisted_state_defaults_missing_fields() {
        let state: PersistedState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn test_persisted_state_defaults_null_fields() {
        let state: PersistedState =
            serde_json::from_str(r#"{"todos":null,"counter":null}"#).unwrap();
        assert_eq!(state, PersistedState::default());

        let state: PersistedState = serde_json::from_str(
            r#"{"todos":[{"id":4,"task":"Keep me","priority":"low","createdAt":"2024-01-01T00:00:00Z"}],"counter":null}"#,
        )
        .unwrap();
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.counter, 1);
    }

    #[tokio::test]
    async fn test_load_state_with_null_counter_raises_it_past_stored_ids() {
        let persistence = InMemoryPersistence::with_state(
            serde_json::from_str(
                r#"{"todos":[{"id":4,"task":"Keep me","priority":"low","createdAt":"2024-01-01T00:00:00Z"}],"counter":null}"#,
            )
            .unwrap(),
        );
        let state = load_state(&persistence).await;
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.counter, 5);
    }

    #[tokio::test]
    async fn test_load_state_with_maximal_id_starts_empty() {
        let stored = PersistedState::new(vec![todo(TodoId::MAX, "last")], 1);
        let state = load_state(&InMemoryPersistence::with_state(stored)).await;
        assert_eq!(state, PersistedState::default());
    }

    #[tokio::test]
    async fn test_flusher_saves_in_order() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let flusher = Flusher::spawn(persistence.clone());

        flusher.enqueue(PersistedState::new(vec![todo(1, "a")], 2));
        flusher.enqueue(PersistedState::new(vec![todo(1, "a"), todo(2, "b")], 3));
        flusher.sync().await;

        assert_eq!(persistence.save_count(), 2);
        let last = persistence.last_saved().await.unwrap();
        assert_eq!(last.counter, 3);
        assert_eq!(last.todos.len(), 2);
    }

    #[tokio::test]
    async fn test_flusher_swallows_save_failures() {
        let persistence = Arc::new(InMemoryPersistence::failing());
        let flusher = Flusher::spawn(persistence.clone());

        flusher.enqueue(PersistedState::default());
        flusher.sync().await;

        assert_eq!(persistence.save_count(), 0);
    }

    #[tokio::test]
    async fn test_json_file_missing_is_none() {
        let dir = std::env::temp_dir().join(format!("todo-missing-{}", std::process::id()));
        let persistence = JsonFilePersistence::new(dir.join("nothing-here.json"));
        assert!(persistence.load().await.unwrap().is_none());
    }
}

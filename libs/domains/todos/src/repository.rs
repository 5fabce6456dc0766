use async_trait::async_trait;
use chrono::Utc;
use observability::TodoMetrics;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{PersistenceResult, TodoError, TodoResult};
use crate::models::{MAX_TASK_LENGTH, Todo, TodoId, TodoPriority};
use crate::persistence::{Flusher, PersistedState, TodoPersistence, load_state};

/// Repository trait for the ordered todo collection
///
/// Every mutation is all-or-nothing: on error the collection is unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Validate and append a new todo
    async fn create(&self, task: String, priority: TodoPriority) -> TodoResult<Todo>;

    /// Replace a todo's text, and its priority when one is given
    async fn update(
        &self,
        id: TodoId,
        task: String,
        priority: Option<TodoPriority>,
    ) -> TodoResult<Todo>;

    /// Flip a todo's completion state
    async fn toggle(&self, id: TodoId) -> TodoResult<Todo>;

    /// Remove a todo
    async fn delete(&self, id: TodoId) -> TodoResult<()>;

    /// Remove every completed todo, returning how many were removed
    async fn clear_completed(&self) -> TodoResult<usize>;

    /// Rearrange the collection; see [`reorder_todos`]
    async fn reorder(&self, ids: Vec<TodoId>) -> TodoResult<()>;

    /// Snapshot of the collection in user order
    async fn all(&self) -> TodoResult<Vec<Todo>>;
}

#[derive(Debug)]
struct StoreState {
    todos: Vec<Todo>,
    counter: TodoId,
}

impl StoreState {
    fn snapshot(&self) -> PersistedState {
        PersistedState::new(self.todos.clone(), self.counter)
    }

    fn publish_counts(&self) {
        let completed = self.todos.iter().filter(|t| t.completed).count();
        TodoMetrics::set_todo_counts(self.todos.len(), completed);
    }

    fn position(&self, id: TodoId) -> TodoResult<usize> {
        self.todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))
    }
}

/// In-memory todo store mirrored to a [`TodoPersistence`] backend.
///
/// Cloning is cheap and every clone shares the same collection.
pub struct TodoStore<P: TodoPersistence + ?Sized> {
    state: Arc<RwLock<StoreState>>,
    persistence: Arc<P>,
    flusher: Flusher,
}

impl<P: TodoPersistence + ?Sized> Clone for TodoStore<P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            persistence: self.persistence.clone(),
            flusher: self.flusher.clone(),
        }
    }
}

impl<P: TodoPersistence + ?Sized + 'static> TodoStore<P> {
    /// Build the store from whatever the backend holds.
    ///
    /// Must run inside a tokio runtime; the snapshot writer is spawned here.
    pub async fn load(persistence: Arc<P>) -> Self {
        let PersistedState { todos, counter } = load_state(persistence.as_ref()).await;
        let flusher = Flusher::spawn(persistence.clone());
        let state = StoreState { todos, counter };
        state.publish_counts();

        Self {
            state: Arc::new(RwLock::new(state)),
            persistence,
            flusher,
        }
    }

    /// Wait for every queued snapshot to be written
    pub async fn sync(&self) {
        self.flusher.sync().await;
    }

    /// Readiness of the backing storage
    pub async fn check(&self) -> PersistenceResult<()> {
        self.persistence.check().await
    }

    /// Next id the store will assign
    pub async fn counter(&self) -> TodoId {
        self.state.read().await.counter
    }
}

/// Trim and validate task text against the collection.
///
/// `exclude` skips one todo in the duplicate check, so an edit may keep its
/// own text.
pub fn validate_task(todos: &[Todo], raw: &str, exclude: Option<TodoId>) -> TodoResult<String> {
    let task = raw.trim();

    if task.is_empty() {
        return Err(TodoError::Validation("Task cannot be empty".to_string()));
    }

    if task.chars().count() > MAX_TASK_LENGTH {
        return Err(TodoError::Validation(format!(
            "Task cannot exceed {} characters",
            MAX_TASK_LENGTH
        )));
    }

    let needle = task.to_lowercase();
    let duplicate = todos
        .iter()
        .filter(|t| Some(t.id) != exclude)
        .any(|t| t.task.to_lowercase() == needle);

    if duplicate {
        return Err(TodoError::Conflict("This task already exists".to_string()));
    }

    Ok(task.to_string())
}

/// Order `todos` by `ids`.
///
/// Known ids come first in the given order; unknown ids are dropped and a
/// repeated id keeps only its first position. Todos not named keep their
/// previous relative order after the named ones.
pub fn reorder_todos(todos: Vec<Todo>, ids: &[TodoId]) -> Vec<Todo> {
    let mut remaining: Vec<Option<Todo>> = todos.into_iter().map(Some).collect();
    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(remaining.len());

    for id in ids {
        if !seen.insert(*id) {
            continue;
        }
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|t| t.id == *id))
        {
            ordered.extend(slot.take());
        }
    }

    ordered.extend(remaining.into_iter().flatten());
    ordered
}

#[async_trait]
impl<P: TodoPersistence + ?Sized + 'static> TodoRepository for TodoStore<P> {
    async fn create(&self, task: String, priority: TodoPriority) -> TodoResult<Todo> {
        let mut state = self.state.write().await;

        let task = validate_task(&state.todos, &task, None)?;
        let id = state.counter;
        state.counter = id
            .checked_add(1)
            .ok_or_else(|| TodoError::Internal("Todo id space exhausted".to_string()))?;

        let todo = Todo::new(id, task, priority);
        state.todos.push(todo.clone());
        self.flusher.enqueue(state.snapshot());
        state.publish_counts();

        info!(todo_id = id, priority = %priority, "Todo created");
        Ok(todo)
    }

    async fn update(
        &self,
        id: TodoId,
        task: String,
        priority: Option<TodoPriority>,
    ) -> TodoResult<Todo> {
        let mut state = self.state.write().await;

        let index = state.position(id)?;
        let task = validate_task(&state.todos, &task, Some(id))?;

        let todo = &mut state.todos[index];
        todo.task = task;
        todo.updated_at = Some(Utc::now());
        if let Some(priority) = priority {
            todo.priority = priority;
        }
        let updated = todo.clone();
        self.flusher.enqueue(state.snapshot());
        state.publish_counts();

        info!(todo_id = id, "Todo updated");
        Ok(updated)
    }

    async fn toggle(&self, id: TodoId) -> TodoResult<Todo> {
        let mut state = self.state.write().await;

        let index = state.position(id)?;
        let todo = &mut state.todos[index];
        todo.toggle();
        let toggled = todo.clone();
        self.flusher.enqueue(state.snapshot());
        state.publish_counts();

        info!(todo_id = id, completed = toggled.completed, "Todo toggled");
        Ok(toggled)
    }

    async fn delete(&self, id: TodoId) -> TodoResult<()> {
        let mut state = self.state.write().await;

        let index = state.position(id)?;
        state.todos.remove(index);
        self.flusher.enqueue(state.snapshot());
        state.publish_counts();

        info!(todo_id = id, "Todo deleted");
        Ok(())
    }

    async fn clear_completed(&self) -> TodoResult<usize> {
        let mut state = self.state.write().await;

        let before = state.todos.len();
        state.todos.retain(|t| !t.completed);
        let removed = before - state.todos.len();

        if removed > 0 {
            self.flusher.enqueue(state.snapshot());
            state.publish_counts();
            info!(count = removed, "Completed todos cleared");
        }

        Ok(removed)
    }

    async fn reorder(&self, ids: Vec<TodoId>) -> TodoResult<()> {
        let mut state = self.state.write().await;

        let todos = std::mem::take(&mut state.todos);
        state.todos = reorder_todos(todos, &ids);
        self.flusher.enqueue(state.snapshot());
        state.publish_counts();

        info!(requested = ids.len(), "Todos reordered");
        Ok(())
    }

    async fn all(&self) -> TodoResult<Vec<Todo>> {
        Ok(self.state.read().await.todos.clone())
    }
}

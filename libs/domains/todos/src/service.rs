use chrono::Utc;
use observability::TodoMetrics;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{TodoError, TodoResult};
use crate::models::{
    ClearCompletedResponse, CreateTodo, ReorderTodos, Todo, TodoExport, TodoId, TodoPriority,
    TodoQuery, TodoView, UpdateTodo,
};
use crate::query;
use crate::repository::TodoRepository;

/// Service layer for todo business logic
#[derive(Clone)]
pub struct TodoService<R: TodoRepository> {
    repository: Arc<R>,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Filtered and sorted list with counts over the whole collection
    pub async fn list_todos(&self, query: TodoQuery) -> TodoResult<TodoView> {
        let todos = self.repository.all().await?;
        Ok(query::build_view(&todos, &query))
    }

    /// Create a todo; a missing or unknown priority becomes `medium`
    pub async fn create_todo(&self, input: CreateTodo) -> TodoResult<Todo> {
        let priority = TodoPriority::resolve(input.priority.as_ref());
        let todo = self.repository.create(input.task, priority).await?;

        TodoMetrics::record_operation("create");
        Ok(todo)
    }

    /// Edit a todo; the priority changes only when a valid one is given
    pub async fn update_todo(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        let priority = TodoPriority::from_json(input.priority.as_ref());
        let todo = self.repository.update(id, input.task, priority).await?;

        TodoMetrics::record_operation("update");
        Ok(todo)
    }

    pub async fn toggle_todo(&self, id: TodoId) -> TodoResult<Todo> {
        let todo = self.repository.toggle(id).await?;

        TodoMetrics::record_operation("toggle");
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: TodoId) -> TodoResult<()> {
        self.repository.delete(id).await?;

        TodoMetrics::record_operation("delete");
        Ok(())
    }

    pub async fn clear_completed(&self) -> TodoResult<ClearCompletedResponse> {
        let deleted_count = self.repository.clear_completed().await?;

        TodoMetrics::record_operation("clear_completed");
        Ok(ClearCompletedResponse { deleted_count })
    }

    /// Reorder from a raw `todoIds` payload
    pub async fn reorder_todos(&self, input: ReorderTodos) -> TodoResult<()> {
        let ids = parse_todo_ids(&input.todo_ids)?;
        self.repository.reorder(ids).await?;

        TodoMetrics::record_operation("reorder");
        Ok(())
    }

    /// Whole collection in stored order, stamped with the current time
    pub async fn export_todos(&self) -> TodoResult<TodoExport> {
        let todos = self.repository.all().await?;
        Ok(query::build_export(todos, Utc::now()))
    }
}

/// Extract ids from a reorder payload.
///
/// The payload must be an array. Positive integers and strings holding one
/// are accepted; any other element is skipped.
pub fn parse_todo_ids(raw: &Value) -> TodoResult<Vec<TodoId>> {
    let items = raw
        .as_array()
        .ok_or_else(|| TodoError::Validation("Invalid todo IDs array".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<TodoId>().ok(),
            _ => None,
        })
        .filter(|id| *id > 0)
        .collect())
}

//! Todos Domain
//!
//! An ordered, in-memory todo list mirrored to a single JSON document.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Input resolution, views, export, metrics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← TodoStore: validation + mutation under one lock
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Persistence │  ← Snapshot load at startup, ordered background flush
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_todos::{handlers, JsonFilePersistence, TodoService, TodoStore};
//!
//! # async fn run() {
//! let persistence = Arc::new(JsonFilePersistence::new("todos.json"));
//! let store = TodoStore::load(persistence).await;
//! let service = TodoService::new(store.clone());
//!
//! let router = handlers::router(service);
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod persistence;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{PersistenceError, TodoError, TodoResult};
pub use models::{
    ClearCompletedResponse, CreateTodo, PriorityFilter, ReorderTodos, SortKey, StatusFilter, Todo,
    TodoExport, TodoId, TodoPriority, TodoQuery, TodoStats, TodoView, UpdateTodo,
};
pub use persistence::{
    Flusher, InMemoryPersistence, JsonFilePersistence, PersistedState, TodoPersistence,
    load_state,
};
pub use repository::{TodoRepository, TodoStore};
pub use service::TodoService;

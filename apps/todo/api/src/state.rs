//! Application state management.
//!
//! The state holds the configuration and the todo store handle. The store
//! is cheap to clone; every clone shares the same collection and writer.

use domain_todos::{TodoPersistence, TodoStore};

/// Store over whichever persistence backend the process was started with
pub type SharedStore = TodoStore<dyn TodoPersistence>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// The single todo store for this process
    pub store: SharedStore,
}

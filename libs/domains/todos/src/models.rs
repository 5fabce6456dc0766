use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

/// Todo identifier, assigned by the store from a monotonically increasing counter
pub type TodoId = u64;

/// Maximum task length in characters
pub const MAX_TASK_LENGTH: usize = 200;

/// Task priority
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TodoPriority {
    /// Parse an exact priority name; anything else is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    /// Parse a raw JSON value; only a string naming a priority counts
    pub fn from_json(raw: Option<&serde_json::Value>) -> Option<Self> {
        raw.and_then(serde_json::Value::as_str).and_then(Self::parse)
    }

    /// Resolve raw input, defaulting to `medium` when missing or invalid
    pub fn resolve(raw: Option<&serde_json::Value>) -> Self {
        Self::from_json(raw).unwrap_or_default()
    }

    /// Sort rank, highest priority first
    pub fn rank(self) -> u8 {
        match self {
            TodoPriority::High => 0,
            TodoPriority::Medium => 1,
            TodoPriority::Low => 2,
        }
    }
}

/// Todo entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Store-assigned identifier, never reused
    pub id: TodoId,
    /// Trimmed task text
    #[schema(example = "Buy milk", max_length = 200)]
    pub task: String,
    pub priority: TodoPriority,
    /// Older data files may omit this; it then reads as not completed
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Set on every successful edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Present exactly when `completed` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(id: TodoId, task: String, priority: TodoPriority) -> Self {
        Self {
            id,
            task,
            priority,
            completed: false,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: None,
        }
    }

    /// Flip completion, keeping `completed_at` in step
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then(Utc::now);
    }
}

/// DTO for creating a new todo
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateTodo {
    #[serde(default)]
    #[schema(example = "Buy milk")]
    pub task: String,
    /// `low`, `medium` or `high`; anything else, including non-strings, means `medium`
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "high")]
    pub priority: Option<serde_json::Value>,
}

/// DTO for editing a todo
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTodo {
    #[serde(default)]
    pub task: String,
    /// Replaces the priority only when it names a valid one
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub priority: Option<serde_json::Value>,
}

/// DTO for reordering the collection
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReorderTodos {
    /// Should be an array of ids; validated by the service so non-arrays
    /// produce a validation error rather than a body rejection
    #[serde(rename = "todoIds", default)]
    #[schema(value_type = Vec<u64>)]
    pub todo_ids: serde_json::Value,
}

/// Raw list query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TodoQuery {
    /// Priority filter: `all`, `low`, `medium`, `high`
    pub filter: Option<String>,
    /// Completion filter: `all`, `completed`, `pending`
    pub status: Option<String>,
    /// Sort key: `date-desc`, `date-asc`, `priority`, `name`
    pub sort: Option<String>,
}

/// Resolved priority filter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    pub fn matches(self, priority: TodoPriority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Low => priority == TodoPriority::Low,
            PriorityFilter::Medium => priority == TodoPriority::Medium,
            PriorityFilter::High => priority == TodoPriority::High,
        }
    }
}

/// Resolved completion filter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    pub fn matches(self, completed: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => completed,
            StatusFilter::Pending => !completed,
        }
    }
}

/// Resolved sort key
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    Priority,
    Name,
}

impl SortKey {
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

/// Aggregate counts over the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// List response: filtered and sorted todos plus the parameters that produced them
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TodoView {
    pub todos: Vec<Todo>,
    pub filter: PriorityFilter,
    pub status: StatusFilter,
    pub sort: SortKey,
    pub stats: TodoStats,
}

/// Downloadable snapshot of the whole collection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoExport {
    pub todos: Vec<Todo>,
    pub export_date: DateTime<Utc>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
}

impl TodoExport {
    /// Attachment name, e.g. `todos-2024-03-01.json`
    pub fn file_name(&self) -> String {
        let day: NaiveDate = self.export_date.date_naive();
        format!("todos-{}.json", day.format("%Y-%m-%d"))
    }
}

/// Response of the clear-completed endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearCompletedResponse {
    pub deleted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_priority_resolution() {
        let resolve = |raw: &str| TodoPriority::resolve(Some(&serde_json::json!(raw)));
        assert_eq!(resolve("high"), TodoPriority::High);
        assert_eq!(resolve("low"), TodoPriority::Low);
        assert_eq!(resolve("urgent"), TodoPriority::Medium);
        assert_eq!(resolve("HIGH"), TodoPriority::Medium);
        assert_eq!(TodoPriority::resolve(None), TodoPriority::Medium);
        assert_eq!(TodoPriority::parse("urgent"), None);
    }

    #[test]
    fn test_non_string_priority_is_accepted_and_ignored() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"task":"Buy milk","priority":5}"#).unwrap();
        assert_eq!(TodoPriority::from_json(input.priority.as_ref()), None);
        assert_eq!(
            TodoPriority::resolve(input.priority.as_ref()),
            TodoPriority::Medium
        );

        let input: UpdateTodo = serde_json::from_str(r#"{"task":"x","priority":[]}"#).unwrap();
        assert_eq!(TodoPriority::from_json(input.priority.as_ref()), None);

        let high = serde_json::json!("high");
        assert_eq!(TodoPriority::from_json(Some(&high)), Some(TodoPriority::High));
    }

    #[test]
    fn test_toggle_keeps_completed_at_in_step() {
        let mut todo = Todo::new(1, "Write report".to_string(), TodoPriority::Low);
        todo.toggle();
        assert!(todo.completed);
        assert!(todo.completed_at.is_some());

        todo.toggle();
        assert!(!todo.completed);
        assert!(todo.completed_at.is_none());
    }

    #[test]
    fn test_todo_serializes_camel_case_and_skips_absent_timestamps() {
        let todo = Todo::new(7, "Call mom".to_string(), TodoPriority::High);
        let json = serde_json::to_value(&todo).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["priority"], "high");
        assert_eq!(json["completed"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_none());
        assert!(json.get("completedAt").is_none());
    }

    #[test]
    fn test_todo_missing_completed_defaults_to_false() {
        let todo: Todo = serde_json::from_value(serde_json::json!({
            "id": 3,
            "task": "Legacy",
            "priority": "low",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!todo.completed);
    }

    #[test]
    fn test_query_parameters_fall_back_to_defaults() {
        assert_eq!(PriorityFilter::resolve(Some("high")), PriorityFilter::High);
        assert_eq!(PriorityFilter::resolve(Some("bogus")), PriorityFilter::All);
        assert_eq!(StatusFilter::resolve(Some("pending")), StatusFilter::Pending);
        assert_eq!(StatusFilter::resolve(None), StatusFilter::All);
        assert_eq!(SortKey::resolve(Some("date-asc")), SortKey::DateAsc);
        assert_eq!(SortKey::resolve(Some("oldest")), SortKey::DateDesc);
        assert_eq!(SortKey::Priority.to_string(), "priority");
    }

    #[test]
    fn test_export_file_name_uses_export_day() {
        let export = TodoExport {
            todos: vec![],
            export_date: Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap(),
            total_tasks: 0,
            completed_tasks: 0,
            pending_tasks: 0,
        };
        assert_eq!(export.file_name(), "todos-2024-03-01.json");
    }
}

//! Filtering, sorting and aggregate counts for list and export views.
//!
//! Everything here is pure: inputs are borrowed and results are fresh copies,
//! so the stored order is never disturbed by a query.

use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions};
use tracing::warn;

use crate::models::{
    PriorityFilter, SortKey, StatusFilter, Todo, TodoExport, TodoQuery, TodoStats, TodoView,
};

/// Todos matching both filters, in stored order
pub fn filter_todos(todos: &[Todo], priority: PriorityFilter, status: StatusFilter) -> Vec<Todo> {
    todos
        .iter()
        .filter(|t| priority.matches(t.priority) && status.matches(t.completed))
        .cloned()
        .collect()
}

/// Stable sort by `key`
pub fn sort_todos(mut todos: Vec<Todo>, key: SortKey) -> Vec<Todo> {
    match key {
        SortKey::DateDesc => todos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::DateAsc => todos.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::Priority => todos.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
        SortKey::Name => match name_collator() {
            Some(collator) => todos.sort_by(|a, b| collator.compare(&a.task, &b.task)),
            None => todos.sort_by(|a, b| a.task.cmp(&b.task)),
        },
    }
    todos
}

/// Root-locale collator at default (tertiary) strength: accents and case
/// only break ties between otherwise equal names, lowercase first
fn name_collator() -> Option<Collator> {
    Collator::try_new(&Default::default(), CollatorOptions::new())
        .inspect_err(|e| warn!(error = ?e, "Collator unavailable, sorting names by code point"))
        .ok()
}

/// Counts over the whole, unfiltered collection
pub fn stats(todos: &[Todo]) -> TodoStats {
    let completed = todos.iter().filter(|t| t.completed).count();
    TodoStats {
        total: todos.len(),
        completed,
        pending: todos.len() - completed,
    }
}

/// Resolve raw query parameters and build the list response
pub fn build_view(todos: &[Todo], query: &TodoQuery) -> TodoView {
    let filter = PriorityFilter::resolve(query.filter.as_deref());
    let status = StatusFilter::resolve(query.status.as_deref());
    let sort = SortKey::resolve(query.sort.as_deref());

    TodoView {
        todos: sort_todos(filter_todos(todos, filter, status), sort),
        filter,
        status,
        sort,
        stats: stats(todos),
    }
}

/// Snapshot of the whole collection in stored order
pub fn build_export(todos: Vec<Todo>, export_date: DateTime<Utc>) -> TodoExport {
    let TodoStats {
        total,
        completed,
        pending,
    } = stats(&todos);

    TodoExport {
        todos,
        export_date,
        total_tasks: total,
        completed_tasks: completed,
        pending_tasks: pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TodoId, TodoPriority};
    use chrono::{Duration, TimeZone};

    fn todo(id: TodoId, task: &str, priority: TodoPriority, completed: bool) -> Todo {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut todo = Todo::new(id, task.to_string(), priority);
        todo.created_at = base + Duration::minutes(id as i64);
        if completed {
            todo.toggle();
        }
        todo
    }

    fn ids(todos: &[Todo]) -> Vec<TodoId> {
        todos.iter().map(|t| t.id).collect()
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo(1, "low one", TodoPriority::Low, false),
            todo(2, "high old", TodoPriority::High, true),
            todo(3, "medium", TodoPriority::Medium, false),
            todo(4, "high new", TodoPriority::High, false),
        ]
    }

    #[test]
    fn test_priority_sort_ties_newest_first() {
        let sorted = sort_todos(sample(), SortKey::Priority);
        assert_eq!(ids(&sorted), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_date_sorts() {
        assert_eq!(ids(&sort_todos(sample(), SortKey::DateDesc)), vec![4, 3, 2, 1]);
        assert_eq!(ids(&sort_todos(sample(), SortKey::DateAsc)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_date_sort_is_stable_for_equal_timestamps() {
        let mut todos = sample();
        let same = todos[0].created_at;
        for t in &mut todos {
            t.created_at = same;
        }
        assert_eq!(ids(&sort_todos(todos, SortKey::DateDesc)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_name_sort_ignores_case_then_prefers_lowercase() {
        let todos = vec![
            todo(1, "banana", TodoPriority::Low, false),
            todo(2, "Apple", TodoPriority::Low, false),
            todo(3, "apple", TodoPriority::Low, false),
            todo(4, "cherry", TodoPriority::Low, false),
        ];
        assert_eq!(ids(&sort_todos(todos, SortKey::Name)), vec![3, 2, 1, 4]);

        let todos = vec![
            todo(1, "fig", TodoPriority::Low, false),
            todo(2, "éclair", TodoPriority::Low, false),
            todo(3, "apple", TodoPriority::Low, false),
            todo(4, "Zebra", TodoPriority::Low, false),
            todo(5, "eel", TodoPriority::Low, false),
        ];
        assert_eq!(ids(&sort_todos(todos, SortKey::Name)), vec![3, 2, 5, 1, 4]);
    }

    #[test]
    fn test_name_sort_is_stable_for_identical_names() {
        let todos = vec![
            todo(1, "same", TodoPriority::Low, false),
            todo(2, "other", TodoPriority::Low, false),
            todo(3, "same", TodoPriority::Low, false),
        ];
        assert_eq!(ids(&sort_todos(todos, SortKey::Name)), vec![2, 1, 3]);
    }

    #[test]
    fn test_filters_combine() {
        let todos = sample();
        let high_pending = filter_todos(&todos, PriorityFilter::High, StatusFilter::Pending);
        assert_eq!(ids(&high_pending), vec![4]);

        let completed = filter_todos(&todos, PriorityFilter::All, StatusFilter::Completed);
        assert_eq!(ids(&completed), vec![2]);
    }

    #[test]
    fn test_view_echoes_resolved_parameters_and_counts_everything() {
        let query = TodoQuery {
            filter: Some("high".to_string()),
            status: Some("nonsense".to_string()),
            sort: Some("date-asc".to_string()),
        };
        let view = build_view(&sample(), &query);

        assert_eq!(view.filter, PriorityFilter::High);
        assert_eq!(view.status, StatusFilter::All);
        assert_eq!(view.sort, SortKey::DateAsc);
        assert_eq!(ids(&view.todos), vec![2, 4]);
        assert_eq!(view.stats.total, 4);
        assert_eq!(view.stats.completed + view.stats.pending, view.stats.total);
    }

    #[test]
    fn test_export_keeps_stored_order() {
        let export = build_export(sample(), Utc::now());
        assert_eq!(ids(&export.todos), vec![1, 2, 3, 4]);
        assert_eq!(export.total_tasks, 4);
        assert_eq!(export.completed_tasks, 1);
        assert_eq!(export.pending_tasks, 3);
    }
}

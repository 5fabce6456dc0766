//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for all domain crates:
//! - `TempDataDir`: scratch directory holding a data file, removed on drop
//! - `TestDataBuilder`: Deterministic test data generation
//! - `assertions`: Custom assertion helpers
//!
//! # Usage
//!
//! ```rust
//! use test_utils::{TempDataDir, TestDataBuilder};
//!
//! let dir = TempDataDir::new();
//! let builder = TestDataBuilder::from_test_name("my_test");
//!
//! let path = dir.data_file();
//! let task = builder.task("main");
//! assert!(!path.exists());
//! assert!(task.contains("main"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory for file-backed storage tests.
///
/// The directory and everything in it is deleted when the value is dropped.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    /// Create a fresh, empty directory
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("todo-test-")
            .tempdir()
            .expect("Failed to create temporary directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default data file location inside the directory (not created)
    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("todos.json")
    }

    /// Data file location below a not-yet-existing subdirectory
    pub fn nested_data_file(&self) -> PathBuf {
        self.dir.path().join("nested").join("state").join("todos.json")
    }

    /// Write raw contents to the default data file
    pub fn write_data_file(&self, contents: &str) -> PathBuf {
        let path = self.data_file();
        fs::write(&path, contents).expect("Failed to write data file");
        path
    }

    /// Parse the default data file as JSON
    pub fn read_data_file(&self) -> serde_json::Value {
        let raw = fs::read_to_string(self.data_file()).expect("Failed to read data file");
        serde_json::from_str(&raw).expect("Data file is not valid JSON")
    }

    /// Names of all entries in the directory, sorted
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("Failed to list temporary directory")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_todo");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique task text for testing
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.task("main"), "Task 7 main");
    /// ```
    pub fn task(&self, suffix: &str) -> String {
        format!("Task {} {}", self.seed, suffix)
    }

    /// `count` distinct task texts
    pub fn tasks(&self, count: usize) -> Vec<String> {
        (1..=count).map(|i| self.task(&i.to_string())).collect()
    }

    /// Task text of exactly `len` characters
    pub fn task_of_length(&self, len: usize) -> String {
        "x".repeat(len)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that ids are strictly increasing in the given order
    pub fn assert_strictly_increasing(ids: &[u64], context: &str) {
        for pair in ids.windows(2) {
            assert!(
                pair[0] < pair[1],
                "{}: expected strictly increasing ids, got {:?}",
                context,
                ids
            );
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.task("a"), builder2.task("a"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.task("a"), builder2.task("a"));
    }

    #[test]
    fn test_tasks_are_distinct() {
        let tasks = TestDataBuilder::new(1).tasks(3);
        assert_eq!(tasks, vec!["Task 1 1", "Task 1 2", "Task 1 3"]);
        assert_eq!(TestDataBuilder::new(1).task_of_length(201).chars().count(), 201);
    }

    #[test]
    fn test_temp_data_dir_round_trip() {
        let dir = TempDataDir::new();
        let path = dir.write_data_file(r#"{"todos": [], "counter": 4}"#);

        assert!(path.exists());
        assert_eq!(dir.read_data_file()["counter"], 4);
        assert_eq!(dir.entries(), vec!["todos.json"]);
    }

    #[test]
    fn test_temp_data_dir_is_removed_on_drop() {
        let dir = TempDataDir::new();
        let path = dir.path().to_path_buf();
        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn test_assert_strictly_increasing_rejects_repeats() {
        assertions::assert_strictly_increasing(&[1, 2, 2], "ids");
    }
}

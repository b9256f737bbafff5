//! Batch data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::error::BatchError;
use crate::sanitize::{sanitize_filename, with_counter};

/// Extension used for derived file names.
pub const DEFAULT_EXTENSION: &str = "mp3";

/// Opaque identifier of a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Mints a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BatchId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BatchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One requested acquisition inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub title: String,
    /// Artist or other grouping label.
    pub source_identifier: String,
    pub search_query: String,
    /// Sanitized file name, unique within its batch.
    pub desired_filename: String,
}

impl WorkItem {
    /// Builds an item from a title and artist, deriving query and file name.
    pub fn new(title: impl Into<String>, source_identifier: impl Into<String>) -> Self {
        let title = title.into();
        let source_identifier = source_identifier.into();
        let search_query = format!("{} {} official audio", title, source_identifier);
        let desired_filename = format!(
            "{}.{}",
            sanitize_filename(&format!("{} - {}", title, source_identifier)),
            DEFAULT_EXTENSION
        );

        Self {
            title,
            source_identifier,
            search_query,
            desired_filename,
        }
    }

    /// Overrides the derived search query.
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    /// Overrides the derived file name (sanitized).
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.desired_filename = sanitize_filename(filename);
        self
    }

    /// Human readable name used in progress and failure reports.
    pub fn display_name(&self) -> String {
        if self.source_identifier.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.source_identifier)
        }
    }
}

/// Validates a submission and makes file names unique.
///
/// Fails with `InvalidInput` when the list is empty or an item lacks a
/// title or search query.
pub fn prepare_items(items: Vec<WorkItem>) -> Result<Vec<WorkItem>, BatchError> {
    if items.is_empty() {
        return Err(BatchError::InvalidInput("No songs provided".to_string()));
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut prepared = Vec::with_capacity(items.len());

    for (idx, mut item) in items.into_iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(BatchError::InvalidInput(format!(
                "Item {} has an empty title",
                idx + 1
            )));
        }
        if item.search_query.trim().is_empty() {
            return Err(BatchError::InvalidInput(format!(
                "Item {} has an empty search query",
                idx + 1
            )));
        }

        if item.desired_filename.is_empty() {
            item.desired_filename = format!("item-{}.{}", idx + 1, DEFAULT_EXTENSION);
        }

        let base = item.desired_filename.clone();
        let mut candidate = base.clone();
        let mut counter = 2;
        while !seen.insert(candidate.to_lowercase()) {
            candidate = with_counter(&base, counter);
            counter += 1;
        }
        item.desired_filename = candidate;

        prepared.push(item);
    }

    Ok(prepared)
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Running,
    Completed,
    /// Stopped by shutdown before every item was attempted.
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A work item whose fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Pollable progress of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub current_item: String,
    pub status: BatchStatus,
    pub failures: Vec<ItemFailure>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchProgress {
    /// Initial record for a batch of `total` items.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            current_item: String::new(),
            status: BatchStatus::Running,
            failures: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Items that have been attempted so far (success or failure).
    pub fn attempted(&self) -> usize {
        self.completed + self.failures.len()
    }
}

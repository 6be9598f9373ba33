//! Work item, category and board snapshot models.

use crate::error::SnapshotError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A card on the board: a task, ticket, incident or any other unit of work.
///
/// Only `id` and `category` matter to the reordering engine. Everything else
/// is display payload that is carried along untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    /// Stable identifier, unique within a board.
    pub id: String,

    /// Human-readable title.
    pub title: String,

    /// Column the item currently sits in.
    pub category: String,

    /// Assigned person (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Priority label (e.g. "high").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Due date (ISO 8601 UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,

    /// Creation timestamp (ISO 8601 UTC).
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (ISO 8601 UTC).
    pub updated_at: DateTime<Utc>,

    /// Custom fields.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, Value>,
}

impl WorkItem {
    /// Create a new work item in the given category.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            assignee: None,
            tags: Vec::new(),
            priority: None,
            due: None,
            created_at: now,
            updated_at: now,
            fields: HashMap::new(),
        }
    }

    /// Move the item to another category.
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add an assignee to the work item.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Replace the item's tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the priority label.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Set the due date.
    #[must_use]
    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    /// Set a custom field value.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check if the item carries a tag (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A board column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Identifier referenced by `WorkItem::category`.
    pub id: String,
    /// Display label.
    pub label: String,
}

impl Category {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Everything an engine needs to lay out one board: the columns in display
/// order and the items in master order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoardSnapshot {
    pub categories: Vec<Category>,
    pub items: Vec<WorkItem>,
}

impl BoardSnapshot {
    #[must_use]
    pub const fn new(categories: Vec<Category>, items: Vec<WorkItem>) -> Self {
        Self { categories, items }
    }

    /// Check the snapshot's structural invariants.
    ///
    /// # Errors
    /// Returns the first duplicate category, duplicate item, or item whose
    /// category is not on the board.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut categories = HashSet::new();
        for category in &self.categories {
            if !categories.insert(category.id.as_str()) {
                return Err(SnapshotError::DuplicateCategory(category.id.clone()));
            }
        }

        let mut ids = HashSet::new();
        for item in &self.items {
            if !ids.insert(item.id.as_str()) {
                return Err(SnapshotError::DuplicateItem(item.id.clone()));
            }
            if !categories.contains(item.category.as_str()) {
                return Err(SnapshotError::UnknownCategory {
                    item: item.id.clone(),
                    category: item.category.clone(),
                });
            }
        }

        Ok(())
    }
}

//! Per-column view derived from the master item sequence.

use crate::item::{Category, WorkItem};
use serde::Serialize;
use std::collections::HashMap;

/// One column of the board with its items in display order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Column {
    pub id: String,
    pub label: String,
    pub items: Vec<WorkItem>,
}

/// The board grouped by category.
///
/// Columns follow the category order and items inside a column keep their
/// relative order from the master sequence. Items whose category is not on
/// the board are left out.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Projection {
    pub columns: Vec<Column>,
}

impl Projection {
    /// Group `items` by `categories`.
    pub fn build<'a>(
        categories: &[Category],
        items: impl IntoIterator<Item = &'a WorkItem>,
    ) -> Self {
        let mut columns: Vec<Column> = categories
            .iter()
            .map(|c| Column {
                id: c.id.clone(),
                label: c.label.clone(),
                items: Vec::new(),
            })
            .collect();

        let slots: HashMap<&str, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        for item in items {
            if let Some(&slot) = slots.get(item.category.as_str()) {
                columns[slot].items.push(item.clone());
            }
        }

        Self { columns }
    }

    /// Look up a column by category id.
    #[must_use]
    pub fn column(&self, category: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == category)
    }

    /// Item ids of one column, in display order.
    #[must_use]
    pub fn ids(&self, category: &str) -> Vec<&str> {
        self.column(category)
            .map(|c| c.items.iter().map(|i| i.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// All item ids, column by column.
    #[must_use]
    pub fn flatten(&self) -> Vec<&str> {
        self.columns
            .iter()
            .flat_map(|c| c.items.iter().map(|i| i.id.as_str()))
            .collect()
    }

    /// Total number of items across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.items.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

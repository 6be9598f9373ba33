//! Workspace configuration.

use boardwalk_core::Category;
use serde::{Deserialize, Serialize};

/// Workspace configuration stored in `.boardwalk/config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Board settings.
    #[serde(default)]
    pub board: BoardSettings,

    /// Columns in display order.
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,

    /// Default values for new items.
    #[serde(default)]
    pub defaults: ItemDefaults,
}

fn default_version() -> u32 {
    1
}

fn default_categories() -> Vec<Category> {
    vec![
        Category::new("todo", "To do"),
        Category::new("in-progress", "In progress"),
        Category::new("done", "Done"),
    ]
}

/// Board-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Board name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Default values for new work items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefaults {
    /// Column new items land in.
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "todo".to_string()
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            category: default_category(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            board: BoardSettings::default(),
            categories: default_categories(),
            defaults: ItemDefaults::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Create a new config with the given board name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            board: BoardSettings {
                name: Some(name.into()),
            },
            ..Default::default()
        }
    }

    /// Check whether a category id is one of the board's columns.
    #[must_use]
    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }
}

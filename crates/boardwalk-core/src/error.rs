//! Error types for boardwalk-core.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors reported by the reordering engine.
///
/// A call that fails leaves the board exactly as it was, so callers may
/// either bubble these up with `?` or log and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The referenced work item is not on the board.
    #[error("work item not found: {0}")]
    UnknownItem(String),

    /// The referenced category is not one of the board's columns.
    #[error("category not found: {0}")]
    UnknownCategory(String),

    /// `move_over` or `end` was called with no gesture in progress.
    #[error("no drag gesture in progress")]
    NotDragging,

    /// `start` was called while another gesture is still active.
    #[error("drag gesture already in progress for '{active}'")]
    AlreadyDragging { active: String },
}

/// Errors found while validating a board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Two columns share an identifier.
    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    /// Two work items share an identifier.
    #[error("duplicate work item: {0}")]
    DuplicateItem(String),

    /// A work item sits in a column the board does not define.
    #[error("work item '{item}' references unknown category '{category}'")]
    UnknownCategory { item: String, category: String },
}

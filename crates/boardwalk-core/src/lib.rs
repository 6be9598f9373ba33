//! boardwalk-core: Board model and drag-and-drop reordering for kanban boards.
//!
//! This crate provides:
//! - `WorkItem`, `Category`, `BoardSnapshot`: the board model
//! - `BoardEngine`: the reordering state machine driven by drag gestures
//! - `Projection`: the per-column view of a board
//! - `GestureDriver`: adapts serialized, raw-id and keyboard drag events
//! - `BoardEvent`: append-only history entries for persisted changes

pub mod engine;
pub mod error;
pub mod event;
pub mod gesture;
pub mod item;
pub mod projection;

pub use engine::{BoardEngine, Commit, CommitLog, CommitSink, EndOutcome, MoveOutcome, Phase};
pub use error::{EngineError, Result, SnapshotError};
pub use event::{
    BoardEvent, CreatedPayload, EventPayload, EventType, MovedPayload, ReorderedPayload,
};
pub use gesture::{
    keyboard_target, resolve_target, DragEvent, DropTarget, GestureDriver, GestureStep, Key,
};
pub use item::{BoardSnapshot, Category, WorkItem};
pub use projection::{Column, Projection};

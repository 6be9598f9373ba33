//! Filesystem backend for boardwalk boards.
//!
//! A workspace stores one board:
//! - `.boardwalk/config.yml`: board name, columns and defaults
//! - `board/items.yml`: every item, in master order
//! - `board/events.ndjson`: append-only history

pub mod config;
pub mod error;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use error::{FsError, Result};
pub use workspace::{ItemFilter, Workspace};

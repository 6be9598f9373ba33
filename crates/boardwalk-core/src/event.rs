//! Board event model for append-only change tracking.

use crate::engine::Commit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of event recorded for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Item was created.
    Created,
    /// Item moved to another category.
    Moved,
    /// Item changed position within its category.
    Reordered,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Moved => write!(f, "MOVED"),
            Self::Reordered => write!(f, "REORDERED"),
        }
    }
}

/// Creation payload data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CreatedPayload {
    pub title: String,
    pub category: String,
}

/// Category change payload data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MovedPayload {
    pub from: String,
    pub to: String,
    pub position: usize,
}

/// In-column reorder payload data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReorderedPayload {
    pub category: String,
    pub position: usize,
}

/// Payload for different event types.
///
/// Variants are tried in order during deserialization; each payload struct
/// denies unknown fields so only the right one matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventPayload {
    Created(CreatedPayload),
    Moved(MovedPayload),
    Reordered(ReorderedPayload),
}

/// A single entry in a board's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEvent {
    /// Unique event identifier.
    pub id: String,

    /// Item the event is about.
    pub item_id: String,

    /// Type of event.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// When the event occurred (ISO 8601 UTC).
    pub timestamp: DateTime<Utc>,

    /// Who or what caused this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Event-specific payload.
    pub payload: EventPayload,
}

impl BoardEvent {
    /// Create a new event with auto-generated ID and current timestamp.
    #[must_use]
    pub fn new(item_id: impl Into<String>, event_type: EventType, payload: EventPayload) -> Self {
        Self {
            id: format!("evt_{}", Uuid::new_v4().as_simple()),
            item_id: item_id.into(),
            event_type,
            timestamp: Utc::now(),
            actor: None,
            payload,
        }
    }

    /// Set the actor for this event.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Create a CREATED event.
    #[must_use]
    pub fn created(item_id: impl Into<String>, title: &str, category: &str) -> Self {
        Self::new(
            item_id,
            EventType::Created,
            EventPayload::Created(CreatedPayload {
                title: title.to_string(),
                category: category.to_string(),
            }),
        )
    }

    /// Record a persisted commit. `from` is the category the item was stored
    /// in before the commit was applied.
    #[must_use]
    pub fn from_commit(commit: &Commit, from: &str) -> Self {
        if commit.category == from {
            Self::new(
                &commit.item_id,
                EventType::Reordered,
                EventPayload::Reordered(ReorderedPayload {
                    category: commit.category.clone(),
                    position: commit.position,
                }),
            )
        } else {
            Self::new(
                &commit.item_id,
                EventType::Moved,
                EventPayload::Moved(MovedPayload {
                    from: from.to_string(),
                    to: commit.category.clone(),
                    position: commit.position,
                }),
            )
        }
    }
}

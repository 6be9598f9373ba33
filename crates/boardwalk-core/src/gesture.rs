//! Input plumbing between drag sources and the reordering engine.
//!
//! Pointer and keyboard drag sources only ever talk to the engine through
//! `start`, `move_over` and `end`. This module maps their events onto those
//! three calls: serialized [`DragEvent`]s (from a script or an HTTP request),
//! raw hover ids as reported by drag libraries, and arrow-key navigation.

use crate::engine::{BoardEngine, CommitSink, EndOutcome, MoveOutcome};
use crate::error::{EngineError, Result, SnapshotError};
use crate::item::BoardSnapshot;
use serde::{Deserialize, Serialize};

/// What the dragged item is currently over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropTarget {
    /// Another card.
    Item(String),
    /// The empty area of a column.
    Category(String),
}

impl DropTarget {
    #[must_use]
    pub fn item(id: impl Into<String>) -> Self {
        Self::Item(id.into())
    }

    #[must_use]
    pub fn category(id: impl Into<String>) -> Self {
        Self::Category(id.into())
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Item(id) | Self::Category(id) => id,
        }
    }
}

/// A single drag event, in the shape drag sources report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum DragEvent {
    Start {
        item: String,
    },
    Over {
        target: DropTarget,
    },
    End {
        #[serde(default)]
        target: Option<DropTarget>,
    },
    Cancel,
}

/// Result of feeding one event to a [`GestureDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureStep {
    Started,
    Moved { outcome: MoveOutcome },
    Ended(EndOutcome),
}

/// Keys understood by the keyboard drag source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    /// Pick up the focused card.
    Pick,
    /// Drop over the current hover target.
    Drop,
    /// Abort the gesture.
    Cancel,
    Up,
    Down,
    Left,
    Right,
}

/// Resolve the bare id a drag library reports for the hovered element.
///
/// Cards and columns share one id space in most drag libraries, so cards
/// win when an id names both.
pub fn resolve_target<S>(engine: &BoardEngine<S>, raw: &str) -> Option<DropTarget> {
    if engine.item(raw).is_some() {
        Some(DropTarget::item(raw))
    } else if engine.has_category(raw) {
        Some(DropTarget::category(raw))
    } else {
        None
    }
}

/// Next hover target for an arrow key while dragging.
///
/// Up and Down step over the neighbouring card in the active card's column.
/// Left and Right move to the neighbouring column, landing at its end.
/// Returns `None` when idle or at the edge of the board.
pub fn keyboard_target<S>(engine: &BoardEngine<S>, key: Key) -> Option<DropTarget> {
    let active = engine.active()?;
    let category = engine.item(active)?.category.clone();

    match key {
        Key::Up | Key::Down => {
            let projection = engine.projection();
            let ids = projection.ids(&category);
            let here = ids.iter().position(|id| *id == active)?;
            let there = if key == Key::Up {
                here.checked_sub(1)?
            } else {
                here + 1
            };
            ids.get(there).map(|id| DropTarget::item(*id))
        }
        Key::Left | Key::Right => {
            let categories = engine.categories();
            let here = categories.iter().position(|c| c.id == category)?;
            let there = if key == Key::Left {
                here.checked_sub(1)?
            } else {
                here + 1
            };
            categories.get(there).map(|c| DropTarget::category(c.id.clone()))
        }
        Key::Pick | Key::Drop | Key::Cancel => None,
    }
}

/// Owns an engine and feeds it events from any drag source.
///
/// The driver remembers the last accepted hover target so sources that only
/// report "released" (keyboard drop, pointer up without a target id) can
/// still drop where the card was last shown.
#[derive(Debug)]
pub struct GestureDriver<S> {
    engine: BoardEngine<S>,
    hover: Option<DropTarget>,
}

impl<S: CommitSink> GestureDriver<S> {
    #[must_use]
    pub const fn new(engine: BoardEngine<S>) -> Self {
        Self {
            engine,
            hover: None,
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &BoardEngine<S> {
        &self.engine
    }

    /// Adopt a fresh snapshot, abandoning any gesture and its hover target.
    ///
    /// # Errors
    /// Returns `SnapshotError` if the snapshot is invalid; the driver then
    /// keeps its current state.
    pub fn reset(&mut self, snapshot: BoardSnapshot) -> std::result::Result<(), SnapshotError> {
        self.engine.reset(snapshot)?;
        self.hover = None;
        Ok(())
    }

    pub fn into_engine(self) -> BoardEngine<S> {
        self.engine
    }

    /// The last target accepted by `move_over` in the current gesture.
    #[must_use]
    pub const fn hover(&self) -> Option<&DropTarget> {
        self.hover.as_ref()
    }

    /// Apply one event.
    ///
    /// # Errors
    /// Propagates engine errors; the engine's state rules apply unchanged.
    pub fn dispatch(&mut self, event: &DragEvent) -> Result<GestureStep> {
        match event {
            DragEvent::Start { item } => self.start(item),
            DragEvent::Over { target } => self.over(target),
            DragEvent::End { target } => self.end(target.as_ref()),
            DragEvent::Cancel => self.end(None),
        }
    }

    /// Apply a sequence of events, stopping at the first error.
    ///
    /// # Errors
    /// Returns the first engine error together with the index of the event
    /// that caused it.
    pub fn replay<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a DragEvent>,
    ) -> std::result::Result<Vec<GestureStep>, (usize, EngineError)> {
        events
            .into_iter()
            .enumerate()
            .map(|(i, event)| self.dispatch(event).map_err(|e| (i, e)))
            .collect()
    }

    /// Hover over an element identified only by its raw id.
    ///
    /// # Errors
    /// `UnknownItem` if the id names neither a card nor a column.
    pub fn over_raw(&mut self, raw: &str) -> Result<GestureStep> {
        let target = resolve_target(&self.engine, raw)
            .ok_or_else(|| EngineError::UnknownItem(raw.to_string()))?;
        self.over(&target)
    }

    /// Release over an element identified only by its raw id, or over
    /// nothing at all.
    ///
    /// # Errors
    /// An id that names neither a card nor a column cancels the gesture and
    /// reports `UnknownItem`.
    pub fn end_raw(&mut self, raw: Option<&str>) -> Result<GestureStep> {
        let target = raw.map(|raw| {
            resolve_target(&self.engine, raw).unwrap_or_else(|| DropTarget::item(raw))
        });
        self.end(target.as_ref())
    }

    /// Handle a key press from the keyboard drag source. `focused` is the
    /// card that has keyboard focus; it is only used by `Key::Pick`.
    ///
    /// Arrow keys at the edge of the board do nothing and return `None`.
    ///
    /// # Errors
    /// `NotDragging` for keys other than `Pick` while idle, plus any engine
    /// error.
    pub fn key(&mut self, key: Key, focused: &str) -> Result<Option<GestureStep>> {
        match key {
            Key::Pick => self.start(focused).map(Some),
            Key::Cancel => self.end(None).map(Some),
            Key::Drop => {
                let target = match (&self.hover, self.engine.active()) {
                    (Some(hover), _) => Some(hover.clone()),
                    (None, Some(active)) => Some(DropTarget::item(active)),
                    (None, None) => None,
                };
                let Some(target) = target else {
                    return Err(EngineError::NotDragging);
                };
                self.end(Some(&target)).map(Some)
            }
            Key::Up | Key::Down | Key::Left | Key::Right => {
                if !self.engine.is_dragging() {
                    return Err(EngineError::NotDragging);
                }
                match keyboard_target(&self.engine, key) {
                    Some(target) => self.over(&target).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    fn start(&mut self, item: &str) -> Result<GestureStep> {
        self.engine.start(item)?;
        self.hover = None;
        Ok(GestureStep::Started)
    }

    fn over(&mut self, target: &DropTarget) -> Result<GestureStep> {
        let outcome = self.engine.move_over(target)?;
        self.hover = Some(target.clone());
        Ok(GestureStep::Moved { outcome })
    }

    fn end(&mut self, target: Option<&DropTarget>) -> Result<GestureStep> {
        let result = self.engine.end(target);
        self.hover = None;
        result.map(GestureStep::Ended)
    }
}

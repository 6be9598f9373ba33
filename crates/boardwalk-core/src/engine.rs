//! Drag-and-drop reordering engine for one board view.
//!
//! The engine holds the board's master item sequence and moves a single
//! active item around while a drag gesture is in progress:
//!
//! - `start` picks an item up and takes a working copy of the sequence
//! - `move_over` rearranges the working copy as the pointer hovers targets
//! - `end` either adopts the working copy (drop) or discards it (cancel)
//!
//! A drop that changed the item's category or position is reported once to
//! the injected [`CommitSink`]. The idle sequence is never mutated while a
//! gesture is in progress; both sequences are persistent vectors so taking
//! and discarding the working copy is cheap.

use crate::error::{EngineError, Result, SnapshotError};
use crate::gesture::DropTarget;
use crate::item::{BoardSnapshot, Category, WorkItem};
use crate::projection::Projection;
use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Notification that a gesture moved an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The item that was dropped.
    pub item_id: String,
    /// Category the item ended up in.
    pub category: String,
    /// Index of the item within its category after the drop.
    pub position: usize,
}

/// Receiver for commits produced by [`BoardEngine::end`].
///
/// Persisting the change (and dealing with failures) is entirely the
/// receiver's job. Any `FnMut(Commit)` closure is a sink.
pub trait CommitSink {
    fn commit(&mut self, commit: Commit);
}

impl<F> CommitSink for F
where
    F: FnMut(Commit),
{
    fn commit(&mut self, commit: Commit) {
        self(commit);
    }
}

/// Sink that keeps every commit in memory, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitLog {
    commits: Vec<Commit>,
}

impl CommitLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commits: Vec::new(),
        }
    }

    #[must_use]
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Drain the recorded commits.
    pub fn take(&mut self) -> Vec<Commit> {
        std::mem::take(&mut self.commits)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

impl CommitSink for CommitLog {
    fn commit(&mut self, commit: Commit) {
        self.commits.push(commit);
    }
}

/// Whether a gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Dragging,
}

/// Effect of a single `move_over` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveOutcome {
    /// Nothing moved (hovering the item itself or its own column).
    Unchanged,
    /// The item moved within its category.
    Reordered,
    /// The item moved into another category.
    Recategorized,
}

/// How a gesture finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum EndOutcome {
    /// Dropped on nothing; the board is back to its pre-gesture state.
    Cancelled,
    /// Dropped where it started; no commit was emitted.
    Unchanged,
    /// The drop changed the board and this commit was emitted.
    Committed(Commit),
}

/// An in-progress drag.
#[derive(Debug, Clone)]
struct Gesture {
    active: String,
    origin_category: String,
    origin_index: usize,
    working: Vector<WorkItem>,
}

impl Gesture {
    fn active_index(&self) -> Result<usize> {
        index_of(&self.working, &self.active)
            .ok_or_else(|| EngineError::UnknownItem(self.active.clone()))
    }

    /// Apply one hover to the working copy. Validation happens before any
    /// mutation so a rejected target leaves the copy untouched.
    fn hover(&mut self, categories: &[Category], target: &DropTarget) -> Result<MoveOutcome> {
        let from = self.active_index()?;

        match target {
            DropTarget::Item(id) if *id == self.active => Ok(MoveOutcome::Unchanged),
            DropTarget::Item(id) => {
                let to = index_of(&self.working, id)
                    .ok_or_else(|| EngineError::UnknownItem(id.clone()))?;
                let category = self.working[to].category.clone();

                let mut item = self.working.remove(from);
                if item.category == category {
                    self.working.insert(to, item);
                    Ok(MoveOutcome::Reordered)
                } else {
                    // Land directly in front of the target.
                    let to = if from < to { to - 1 } else { to };
                    item.category = category;
                    self.working.insert(to, item);
                    Ok(MoveOutcome::Recategorized)
                }
            }
            DropTarget::Category(id) => {
                if !categories.iter().any(|c| c.id == *id) {
                    return Err(EngineError::UnknownCategory(id.clone()));
                }
                if self.working[from].category == *id {
                    return Ok(MoveOutcome::Unchanged);
                }

                let mut item = self.working.remove(from);
                item.category.clone_from(id);
                let at = self
                    .working
                    .iter()
                    .enumerate()
                    .filter(|(_, i)| i.category == *id)
                    .map(|(i, _)| i + 1)
                    .last()
                    .unwrap_or(self.working.len());
                self.working.insert(at, item);
                Ok(MoveOutcome::Recategorized)
            }
        }
    }

    /// Make sure the active item sits where the drop target says it should.
    fn settle(&mut self, categories: &[Category], target: &DropTarget) -> Result<()> {
        let from = self.active_index()?;
        let current = self.working[from].category.clone();

        let needs_move = match target {
            DropTarget::Item(id) if *id == self.active => false,
            DropTarget::Item(id) => {
                let to = index_of(&self.working, id)
                    .ok_or_else(|| EngineError::UnknownItem(id.clone()))?;
                self.working[to].category != current
            }
            DropTarget::Category(id) => {
                if !categories.iter().any(|c| c.id == *id) {
                    return Err(EngineError::UnknownCategory(id.clone()));
                }
                *id != current
            }
        };

        if needs_move {
            self.hover(categories, target)?;
        }
        Ok(())
    }
}

fn index_of(items: &Vector<WorkItem>, id: &str) -> Option<usize> {
    items.iter().position(|i| i.id == id)
}

/// Reordering engine for one board view.
#[derive(Debug)]
pub struct BoardEngine<S> {
    categories: Vec<Category>,
    items: Vector<WorkItem>,
    gesture: Option<Gesture>,
    sink: S,
}

impl<S: CommitSink> BoardEngine<S> {
    /// Create an idle engine over a snapshot.
    ///
    /// # Errors
    /// Returns `SnapshotError` if the snapshot violates board invariants.
    pub fn new(snapshot: BoardSnapshot, sink: S) -> std::result::Result<Self, SnapshotError> {
        snapshot.validate()?;
        debug!(
            categories = snapshot.categories.len(),
            items = snapshot.items.len(),
            "Loaded board snapshot"
        );
        Ok(Self {
            categories: snapshot.categories,
            items: snapshot.items.into_iter().collect(),
            gesture: None,
            sink,
        })
    }

    /// Adopt a fresh snapshot, abandoning any gesture without a commit.
    ///
    /// # Errors
    /// Returns `SnapshotError` if the snapshot is invalid; the engine then
    /// keeps its current state.
    pub fn reset(&mut self, snapshot: BoardSnapshot) -> std::result::Result<(), SnapshotError> {
        snapshot.validate()?;
        if let Some(gesture) = self.gesture.take() {
            debug!(item = %gesture.active, "Abandoned drag gesture on snapshot reset");
        }
        self.categories = snapshot.categories;
        self.items = snapshot.items.into_iter().collect();
        Ok(())
    }

    /// Pick up an item.
    ///
    /// # Errors
    /// `AlreadyDragging` if a gesture is active, `UnknownItem` if the item
    /// is not on the board.
    pub fn start(&mut self, item_id: &str) -> Result<()> {
        if let Some(gesture) = &self.gesture {
            warn!(item = item_id, active = %gesture.active, "Rejected drag start during gesture");
            return Err(EngineError::AlreadyDragging {
                active: gesture.active.clone(),
            });
        }

        let Some(index) = index_of(&self.items, item_id) else {
            warn!(item = item_id, "Rejected drag start for unknown item");
            return Err(EngineError::UnknownItem(item_id.to_string()));
        };

        self.gesture = Some(Gesture {
            active: item_id.to_string(),
            origin_category: self.items[index].category.clone(),
            origin_index: index,
            working: self.items.clone(),
        });

        debug!(item = item_id, "Drag started");
        Ok(())
    }

    /// Hover the active item over a target, rearranging the working copy.
    ///
    /// # Errors
    /// `NotDragging` while idle, `UnknownItem`/`UnknownCategory` for targets
    /// that are not on the board. Errors leave the working copy untouched.
    pub fn move_over(&mut self, target: &DropTarget) -> Result<MoveOutcome> {
        let Some(gesture) = self.gesture.as_mut() else {
            warn!(over = target.id(), "Rejected hover with no gesture in progress");
            return Err(EngineError::NotDragging);
        };

        let outcome = gesture.hover(&self.categories, target).inspect_err(|e| {
            warn!(item = %gesture.active, error = %e, "Rejected hover target");
        })?;

        debug!(item = %gesture.active, over = target.id(), ?outcome, "Drag moved");
        Ok(outcome)
    }

    /// Finish the gesture. The engine is idle afterwards whatever happens.
    ///
    /// `None` cancels: the board reverts to its pre-gesture state and no
    /// commit is emitted. Otherwise the working copy becomes the board and a
    /// commit is emitted if the item changed category or was dropped on
    /// something other than itself.
    ///
    /// # Errors
    /// `NotDragging` while idle. A target that is not on the board cancels
    /// the gesture and reports `UnknownItem`/`UnknownCategory`.
    pub fn end(&mut self, target: Option<&DropTarget>) -> Result<EndOutcome> {
        let Some(mut gesture) = self.gesture.take() else {
            warn!(
                on = target.map(DropTarget::id),
                "Rejected drop with no gesture in progress"
            );
            return Err(EngineError::NotDragging);
        };

        let Some(target) = target else {
            debug!(item = %gesture.active, "Drag cancelled");
            return Ok(EndOutcome::Cancelled);
        };

        if let Err(e) = gesture.settle(&self.categories, target) {
            warn!(item = %gesture.active, error = %e, "Drop target invalid, gesture cancelled");
            return Err(e);
        }

        let index = gesture.active_index()?;
        let category = gesture.working[index].category.clone();
        let category_changed = category != gesture.origin_category;
        let position_changed = match target {
            DropTarget::Item(id) => *id != gesture.active,
            DropTarget::Category(_) => index != gesture.origin_index,
        };

        self.items = gesture.working;

        if !(category_changed || position_changed) {
            debug!(item = %gesture.active, "Dropped in place");
            return Ok(EndOutcome::Unchanged);
        }

        let position = self
            .items
            .iter()
            .take(index)
            .filter(|i| i.category == category)
            .count();
        let commit = Commit {
            item_id: gesture.active,
            category,
            position,
        };

        info!(
            item = %commit.item_id,
            from = %gesture.origin_category,
            to = %commit.category,
            position = commit.position,
            "Drop committed"
        );
        self.sink.commit(commit.clone());
        Ok(EndOutcome::Committed(commit))
    }
}

impl<S> BoardEngine<S> {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.gesture.is_some() {
            Phase::Dragging
        } else {
            Phase::Idle
        }
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Id of the item being dragged, if any.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.gesture.as_ref().map(|g| g.active.as_str())
    }

    /// The displayed sequence: the working copy while dragging, otherwise
    /// the adopted board.
    #[must_use]
    pub fn items(&self) -> &Vector<WorkItem> {
        self.gesture.as_ref().map_or(&self.items, |g| &g.working)
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        self.items().iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    /// Current board grouped by column.
    #[must_use]
    pub fn projection(&self) -> Projection {
        Projection::build(&self.categories, self.items())
    }

    /// The displayed board as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::new(self.categories.clone(), self.items().iter().cloned().collect())
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ignore(_: Commit) {}

    fn board(items: &[(&str, &str)]) -> BoardEngine<fn(Commit)> {
        board_with(items, ignore as fn(Commit))
    }

    fn board_with<S: CommitSink>(items: &[(&str, &str)], sink: S) -> BoardEngine<S> {
        let categories = vec![
            Category::new("todo", "To do"),
            Category::new("doing", "Doing"),
            Category::new("done", "Done"),
        ];
        let items = items
            .iter()
            .map(|(id, category)| WorkItem::new(*id, id.to_uppercase(), *category))
            .collect();
        BoardEngine::new(BoardSnapshot::new(categories, items), sink).unwrap()
    }

    fn recording(items: &[(&str, &str)]) -> BoardEngine<CommitLog> {
        board_with(items, CommitLog::new())
    }

    fn order<S>(engine: &BoardEngine<S>) -> Vec<String> {
        engine.items().iter().map(|i| i.id.clone()).collect()
    }

    fn item(id: &str) -> DropTarget {
        DropTarget::Item(id.to_string())
    }

    fn column(id: &str) -> DropTarget {
        DropTarget::Category(id.to_string())
    }

    #[test]
    fn test_start_marks_active_without_moving() {
        let mut engine = board(&[("a", "todo"), ("b", "todo")]);

        engine.start("a").unwrap();

        assert_eq!(engine.phase(), Phase::Dragging);
        assert_eq!(engine.active(), Some("a"));
        assert_eq!(order(&engine), vec!["a", "b"]);
    }

    #[test]
    fn test_cross_category_move_lands_before_target() {
        let mut engine = recording(&[("a", "todo"), ("b", "todo"), ("c", "done")]);

        engine.start("a").unwrap();
        let outcome = engine.move_over(&item("c")).unwrap();

        assert_eq!(outcome, MoveOutcome::Recategorized);
        assert_eq!(order(&engine), vec!["b", "a", "c"]);
        assert_eq!(engine.item("a").unwrap().category, "done");

        let outcome = engine.end(Some(&item("c"))).unwrap();
        let projection = engine.projection();
        assert_eq!(projection.ids("todo"), vec!["b"]);
        assert_eq!(projection.ids("done"), vec!["a", "c"]);

        let expected = Commit {
            item_id: "a".to_string(),
            category: "done".to_string(),
            position: 0,
        };
        assert_eq!(outcome, EndOutcome::Committed(expected.clone()));
        assert_eq!(engine.sink().commits(), &[expected]);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_cross_category_move_backwards() {
        let mut engine = board(&[("a", "todo"), ("b", "done"), ("c", "done")]);

        engine.start("c").unwrap();
        engine.move_over(&item("a")).unwrap();

        assert_eq!(order(&engine), vec!["c", "a", "b"]);
        assert_eq!(engine.item("c").unwrap().category, "todo");
    }

    #[test]
    fn test_same_category_move_takes_target_slot() {
        let mut engine = board(&[("a", "todo"), ("x", "done"), ("b", "todo"), ("c", "todo")]);

        engine.start("a").unwrap();
        assert_eq!(engine.move_over(&item("b")).unwrap(), MoveOutcome::Reordered);
        assert_eq!(engine.projection().ids("todo"), vec!["b", "a", "c"]);

        engine.move_over(&item("c")).unwrap();
        assert_eq!(engine.projection().ids("todo"), vec!["b", "c", "a"]);
        assert_eq!(engine.projection().ids("done"), vec!["x"]);
    }

    #[test]
    fn test_hover_self_is_noop() {
        let mut engine = board(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        assert_eq!(engine.move_over(&item("a")).unwrap(), MoveOutcome::Unchanged);
        assert_eq!(order(&engine), vec!["a", "b"]);
    }

    #[test]
    fn test_hover_empty_column_appends_to_block() {
        let mut engine = board(&[("a", "todo"), ("b", "done"), ("c", "todo")]);

        engine.start("a").unwrap();
        engine.move_over(&column("doing")).unwrap();
        assert_eq!(engine.item("a").unwrap().category, "doing");
        assert_eq!(order(&engine), vec!["b", "c", "a"]);

        engine.move_over(&column("done")).unwrap();
        assert_eq!(order(&engine), vec!["b", "a", "c"]);
        assert_eq!(engine.projection().ids("done"), vec!["b", "a"]);

        assert_eq!(engine.move_over(&column("done")).unwrap(), MoveOutcome::Unchanged);
    }

    #[test]
    fn test_cancel_reverts_and_skips_commit() {
        let mut engine = recording(&[("a", "todo"), ("b", "todo"), ("c", "done")]);

        engine.start("a").unwrap();
        engine.move_over(&item("c")).unwrap();
        engine.move_over(&column("doing")).unwrap();

        assert_eq!(engine.end(None).unwrap(), EndOutcome::Cancelled);
        assert_eq!(order(&engine), vec!["a", "b", "c"]);
        assert_eq!(engine.item("a").unwrap().category, "todo");
        assert!(engine.sink().is_empty());
    }

    #[test]
    fn test_drop_on_self_without_moving_skips_commit() {
        let mut engine = recording(&[("a", "todo"), ("b", "todo")]);

        engine.start("a").unwrap();
        assert_eq!(engine.end(Some(&item("a"))).unwrap(), EndOutcome::Unchanged);
        assert!(engine.sink().is_empty());
    }

    #[test]
    fn test_drop_on_self_after_moving_commits() {
        let mut engine = recording(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        engine.move_over(&column("done")).unwrap();
        engine.end(Some(&item("a"))).unwrap();

        let commits = engine.sink().commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].category, "done");
        assert_eq!(commits[0].position, 1);
    }

    #[test]
    fn test_reorder_within_column_commits() {
        let mut engine = recording(&[("a", "todo"), ("b", "todo"), ("c", "todo")]);

        engine.start("c").unwrap();
        engine.move_over(&item("a")).unwrap();
        engine.end(Some(&item("a"))).unwrap();

        assert_eq!(order(&engine), vec!["c", "a", "b"]);
        assert_eq!(
            engine.sink().commits(),
            &[Commit {
                item_id: "c".to_string(),
                category: "todo".to_string(),
                position: 0,
            }]
        );
    }

    #[test]
    fn test_drop_on_column_without_hover_places_item() {
        let mut engine = recording(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        engine.end(Some(&column("done"))).unwrap();

        assert_eq!(engine.projection().ids("done"), vec!["b", "a"]);
        assert_eq!(engine.sink().commits()[0].position, 1);
    }

    #[test]
    fn test_drop_on_unhovered_item_in_other_column_lands_before_it() {
        let mut engine = recording(&[
            ("a", "todo"),
            ("b", "todo"),
            ("c", "done"),
            ("d", "done"),
        ]);

        engine.start("a").unwrap();
        let outcome = engine.end(Some(&item("d"))).unwrap();

        assert_eq!(order(&engine), vec!["b", "c", "a", "d"]);
        assert_eq!(engine.projection().ids("done"), vec!["c", "a", "d"]);
        assert_eq!(
            outcome,
            EndOutcome::Committed(Commit {
                item_id: "a".to_string(),
                category: "done".to_string(),
                position: 1,
            })
        );
        assert_eq!(engine.sink().len(), 1);
    }

    #[test]
    fn test_drop_on_own_column_in_place_skips_commit() {
        let mut engine = recording(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        assert_eq!(engine.end(Some(&column("todo"))).unwrap(), EndOutcome::Unchanged);
        assert!(engine.sink().is_empty());
    }

    #[test]
    fn test_protocol_violations_rejected() {
        let mut engine = board(&[("a", "todo"), ("b", "todo")]);

        assert_eq!(engine.move_over(&item("b")), Err(EngineError::NotDragging));
        assert_eq!(engine.end(None), Err(EngineError::NotDragging));

        engine.start("a").unwrap();
        assert_eq!(
            engine.start("b"),
            Err(EngineError::AlreadyDragging {
                active: "a".to_string()
            })
        );
        assert_eq!(engine.active(), Some("a"));
    }

    #[test]
    fn test_unknown_references_leave_board_intact() {
        let mut engine = board(&[("a", "todo"), ("b", "done")]);

        assert_eq!(engine.start("zzz"), Err(EngineError::UnknownItem("zzz".to_string())));
        assert_eq!(engine.phase(), Phase::Idle);

        engine.start("a").unwrap();
        engine.move_over(&item("b")).unwrap();
        let before = order(&engine);

        assert_eq!(
            engine.move_over(&item("zzz")),
            Err(EngineError::UnknownItem("zzz".to_string()))
        );
        assert_eq!(
            engine.move_over(&column("archived")),
            Err(EngineError::UnknownCategory("archived".to_string()))
        );
        assert_eq!(order(&engine), before);
        assert_eq!(engine.phase(), Phase::Dragging);
    }

    #[test]
    fn test_unknown_drop_target_cancels() {
        let mut engine = recording(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        engine.move_over(&item("b")).unwrap();

        assert_eq!(
            engine.end(Some(&item("zzz"))),
            Err(EngineError::UnknownItem("zzz".to_string()))
        );
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(order(&engine), vec!["a", "b"]);
        assert!(engine.sink().is_empty());
    }

    #[test]
    fn test_reset_abandons_gesture() {
        let mut engine = recording(&[("a", "todo"), ("b", "done")]);

        engine.start("a").unwrap();
        engine.move_over(&item("b")).unwrap();

        let snapshot = BoardSnapshot::new(
            engine.categories().to_vec(),
            vec![WorkItem::new("z", "Z", "doing")],
        );
        engine.reset(snapshot).unwrap();

        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(order(&engine), vec!["z"]);
        assert!(engine.sink().is_empty());
    }

    #[test]
    fn test_invalid_reset_keeps_state() {
        let mut engine = board(&[("a", "todo")]);

        let snapshot = BoardSnapshot::new(
            engine.categories().to_vec(),
            vec![WorkItem::new("z", "Z", "nowhere")],
        );
        assert!(engine.reset(snapshot).is_err());
        assert_eq!(order(&engine), vec!["a"]);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut engine = board_with(&[("a", "todo"), ("b", "done")], |c: Commit| seen.push(c));
            engine.start("a").unwrap();
            engine.move_over(&item("b")).unwrap();
            engine.end(Some(&item("b"))).unwrap();
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].item_id, "a");
    }
}

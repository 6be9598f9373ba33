//! Workspace management and board persistence.

use crate::config::WorkspaceConfig;
use crate::error::{FsError, Result};
use boardwalk_core::{BoardEvent, BoardSnapshot, Commit, WorkItem};
use chrono::{DateTime, Utc};
use slug::slugify;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name for boardwalk configuration.
const BOARDWALK_DIR: &str = ".boardwalk";
/// Configuration file name.
const CONFIG_FILE: &str = "config.yml";
/// Board directory name.
const BOARD_DIR: &str = "board";
/// Ordered item list within the board directory.
const ITEMS_FILE: &str = "items.yml";
/// Event log within the board directory.
const EVENTS_FILE: &str = "events.ndjson";

/// A workspace stores one board on the filesystem.
#[derive(Debug)]
pub struct Workspace {
    /// Root path of the workspace.
    root: PathBuf,
    /// Workspace configuration.
    config: WorkspaceConfig,
}

impl Workspace {
    /// Initialize a new workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace already exists or IO fails.
    pub fn init(path: impl AsRef<Path>, config: WorkspaceConfig) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let boardwalk_dir = root.join(BOARDWALK_DIR);

        if boardwalk_dir.exists() {
            return Err(FsError::WorkspaceExists(root));
        }

        fs::create_dir_all(&boardwalk_dir)?;
        fs::create_dir_all(root.join(BOARD_DIR))?;

        let config_content = serde_yaml::to_string(&config)?;
        fs::write(boardwalk_dir.join(CONFIG_FILE), config_content)?;

        let ws = Self { root, config };
        ws.write_items(&[])?;

        info!(path = %ws.root.display(), "Initialized workspace");

        Ok(ws)
    }

    /// Open an existing workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace doesn't exist or config is invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let config_path = root.join(BOARDWALK_DIR).join(CONFIG_FILE);

        if !config_path.exists() {
            return Err(FsError::WorkspaceNotFound(root));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: WorkspaceConfig = serde_yaml::from_str(&config_content)?;

        debug!(path = %root.display(), "Opened workspace");

        Ok(Self { root, config })
    }

    /// Get the workspace root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the workspace configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    fn board_dir(&self) -> PathBuf {
        self.root.join(BOARD_DIR)
    }

    /// Load the board as a validated snapshot.
    ///
    /// # Errors
    /// Returns error if the item file cannot be read or violates board
    /// invariants (e.g. after a column was removed from the config).
    pub fn snapshot(&self) -> Result<BoardSnapshot> {
        let snapshot = BoardSnapshot::new(self.config.categories.clone(), self.read_items()?);
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Create a new work item at the end of the board.
    ///
    /// # Errors
    /// Returns error if the category is unknown, the title has no usable
    /// characters, or IO fails.
    pub fn create_item(&self, title: &str, category: Option<&str>) -> Result<WorkItem> {
        self.create_item_with(title, category, |item| item)
    }

    /// Create a new work item, letting the caller fill in display attributes
    /// before it is stored.
    ///
    /// # Errors
    /// Same as [`Workspace::create_item`].
    pub fn create_item_with(
        &self,
        title: &str,
        category: Option<&str>,
        customize: impl FnOnce(WorkItem) -> WorkItem,
    ) -> Result<WorkItem> {
        let category = category.unwrap_or(&self.config.defaults.category);
        if !self.config.has_category(category) {
            return Err(FsError::CategoryNotFound(category.to_string()));
        }

        let base = slugify(title);
        if base.is_empty() {
            return Err(FsError::InvalidTitle(title.to_string()));
        }

        let mut items = self.read_items()?;
        let id = unique_id(&base, &items);

        let mut item = customize(WorkItem::new(&id, title, category));
        item.id.clone_from(&id);
        item.category = category.to_string();

        items.push(item.clone());
        self.write_items(&items)?;
        self.append_event(&BoardEvent::created(&id, title, category))?;

        info!(id = %id, title = %title, category = %category, "Created work item");

        Ok(item)
    }

    /// Get a work item by id.
    ///
    /// # Errors
    /// Returns error if the item doesn't exist or the item file is invalid.
    pub fn get_item(&self, id: &str) -> Result<WorkItem> {
        self.read_items()?
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| FsError::ItemNotFound(id.to_string()))
    }

    /// List work items in board order, optionally filtered.
    ///
    /// # Errors
    /// Returns error if the item file cannot be read.
    pub fn list_items(&self, filter: Option<&ItemFilter>) -> Result<Vec<WorkItem>> {
        let mut items = self.read_items()?;
        if let Some(filter) = filter {
            items.retain(|item| filter.matches(item));
        }
        Ok(items)
    }

    /// Persist the result of a drag gesture.
    ///
    /// The item moves to the commit's category and is placed at the commit's
    /// position within that category (clamped to the end of the column).
    ///
    /// # Errors
    /// Returns error if the item or category is unknown or IO fails.
    pub fn apply_commit(&self, commit: &Commit) -> Result<WorkItem> {
        if !self.config.has_category(&commit.category) {
            return Err(FsError::CategoryNotFound(commit.category.clone()));
        }

        let mut items = self.read_items()?;
        let index = items
            .iter()
            .position(|i| i.id == commit.item_id)
            .ok_or_else(|| FsError::ItemNotFound(commit.item_id.clone()))?;

        let mut item = items.remove(index);
        let from = std::mem::replace(&mut item.category, commit.category.clone());
        item.touch();

        let column: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.category == commit.category)
            .map(|(i, _)| i)
            .collect();
        let at = match column.get(commit.position) {
            Some(&slot) => slot,
            None => column.last().map_or(items.len(), |&last| last + 1),
        };

        items.insert(at, item.clone());
        self.write_items(&items)?;
        self.append_event(&BoardEvent::from_commit(commit, &from))?;

        info!(
            id = %commit.item_id,
            from = %from,
            to = %commit.category,
            position = commit.position,
            "Applied commit"
        );

        Ok(item)
    }

    /// Append an event to the board's event log.
    ///
    /// # Errors
    /// Returns error if the log cannot be written.
    pub fn append_event(&self, event: &BoardEvent) -> Result<()> {
        let events_path = self.board_dir().join(EVENTS_FILE);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)?;

        let json_line = serde_json::to_string(event)?;
        writeln!(file, "{json_line}")?;

        debug!(item = %event.item_id, event_type = %event.event_type, "Appended event");

        Ok(())
    }

    /// Read board events, optionally only those since a point in time.
    ///
    /// # Errors
    /// Returns error if the log cannot be read or contains invalid lines.
    pub fn read_events(&self, since: Option<DateTime<Utc>>) -> Result<Vec<BoardEvent>> {
        let events_path = self.board_dir().join(EVENTS_FILE);

        if !events_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&events_path)?);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event: BoardEvent = serde_json::from_str(&line)?;

            if since.is_none_or(|s| event.timestamp >= s) {
                events.push(event);
            }
        }

        Ok(events)
    }

    // Private helpers

    fn read_items(&self) -> Result<Vec<WorkItem>> {
        let content = fs::read_to_string(self.board_dir().join(ITEMS_FILE))?;
        let items: Option<Vec<WorkItem>> = serde_yaml::from_str(&content)?;
        Ok(items.unwrap_or_default())
    }

    fn write_items(&self, items: &[WorkItem]) -> Result<()> {
        let content = serde_yaml::to_string(items)?;
        fs::write(self.board_dir().join(ITEMS_FILE), content)?;
        Ok(())
    }
}

/// First of `base`, `base-2`, `base-3`, ... not already taken.
fn unique_id(base: &str, items: &[WorkItem]) -> String {
    let taken = |id: &str| items.iter().any(|i| i.id == id);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| base.to_string())
}

/// Filter criteria for listing work items.
#[derive(Debug, Default)]
pub struct ItemFilter {
    /// Filter by category.
    pub category: Option<String>,
    /// Filter by assignee.
    pub assignee: Option<String>,
    /// Filter by tag (item must carry this tag).
    pub tag: Option<String>,
}

impl ItemFilter {
    /// Check if an item matches this filter.
    #[must_use]
    pub fn matches(&self, item: &WorkItem) -> bool {
        if let Some(category) = &self.category {
            if !item.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if let Some(assignee) = &self.assignee {
            match &item.assignee {
                Some(a) if a.eq_ignore_ascii_case(assignee) => {}
                _ => return false,
            }
        }

        if let Some(tag) = &self.tag {
            if !item.has_tag(tag) {
                return false;
            }
        }

        true
    }
}

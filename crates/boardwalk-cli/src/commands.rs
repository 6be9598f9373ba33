//! CLI command implementations.

use crate::output::{self, OutputFormat, WorkItemSummary};
use anyhow::{anyhow, Context, Result};
use boardwalk_core::{BoardEngine, Commit, CommitLog, DragEvent, GestureDriver};
use boardwalk_fs::{ItemFilter, Workspace, WorkspaceConfig};
use chrono::{Duration, Utc};
use console::style;
use std::path::Path;
use tracing::{debug, warn};

/// Initialize a new board.
pub fn init(path: &Path, name: Option<String>, format: OutputFormat) -> Result<()> {
    let config = name.map_or_else(WorkspaceConfig::default, WorkspaceConfig::new);
    Workspace::init(path, config).context("Failed to initialize workspace")?;
    output::print_success(
        &format!("Initialized board at {}", path.display()),
        format,
    )
}

/// Create a new work item at the end of the board.
pub fn new_item(
    path: &Path,
    title: &str,
    category: Option<&str>,
    assignee: Option<String>,
    tags: Vec<String>,
    priority: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;

    let item = ws
        .create_item_with(title, category, |mut item| {
            if let Some(assignee) = assignee {
                item = item.with_assignee(assignee);
            }
            if let Some(priority) = priority {
                item = item.with_priority(priority);
            }
            item.with_tags(tags)
        })
        .context("Failed to create item")?;

    output::print(&item, format)
}

/// List work items in board order.
pub fn list(
    path: &Path,
    category: Option<String>,
    assignee: Option<String>,
    tag: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;

    let filter = if category.is_some() || assignee.is_some() || tag.is_some() {
        Some(ItemFilter {
            category,
            assignee,
            tag,
        })
    } else {
        None
    };

    let items = ws
        .list_items(filter.as_ref())
        .context("Failed to list items")?;

    if items.is_empty() {
        return output::print_success("No items found", format);
    }

    if matches!(format, OutputFormat::Human) {
        println!("{:<30} {:12} {:10} {}", "ID", "CATEGORY", "ASSIGNEE", "TITLE");
        println!("{}", "-".repeat(80));
    }

    let summaries: Vec<WorkItemSummary> = items.iter().map(WorkItemSummary::from).collect();
    output::print_list(&summaries, format)
}

/// Show the board column by column.
pub fn board(path: &Path, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let snapshot = ws.snapshot().context("Failed to load board")?;
    let engine = BoardEngine::new(snapshot, CommitLog::new()).context("Invalid board")?;
    output::print(&engine.projection(), format)
}

/// Drag one item over a series of targets and drop it.
pub fn move_item(
    path: &Path,
    id: &str,
    over: &[String],
    drop: Option<&str>,
    cancel: bool,
    format: OutputFormat,
) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let mut driver = open_driver(&ws)?;

    driver.dispatch(&DragEvent::Start {
        item: id.to_string(),
    })?;
    for target in over {
        driver.over_raw(target)?;
    }

    let release = if cancel {
        None
    } else {
        Some(drop.or_else(|| over.last().map(String::as_str)).unwrap_or(id))
    };
    let step = driver.end_raw(release)?;
    debug!(?step, "Gesture finished");

    let commits = driver.into_engine().into_sink().take();
    persist(&ws, &commits, format)
}

/// Replay a file of drag events against the board.
///
/// Commits produced before a failing event are still persisted.
pub fn replay(path: &Path, script: &Path, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let events = parse_script(&content)?;

    let ws = Workspace::open(path).context("Failed to open workspace")?;
    let mut driver = open_driver(&ws)?;

    let result = driver.replay(&events);
    let commits = driver.into_engine().into_sink().take();
    persist(&ws, &commits, format)?;

    result
        .map(|steps| debug!(steps = steps.len(), "Replayed script"))
        .map_err(|(index, err)| anyhow!("event {index}: {err}"))
}

/// Show board history.
pub fn events(path: &Path, since_days: Option<u32>, format: OutputFormat) -> Result<()> {
    let ws = Workspace::open(path).context("Failed to open workspace")?;

    let since = since_days.map(|days| Utc::now() - Duration::days(i64::from(days)));

    let events = ws.read_events(since).context("Failed to read events")?;

    if events.is_empty() {
        return output::print_success("No events found", format);
    }

    output::print_list(&events, format)
}

/// Start the board HTTP server.
pub fn serve(path: &Path, host: &str, port: u16) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { boardwalk_server::serve(path, host, port).await })
}

/// Parse a drag script. JSON is accepted since it is valid YAML.
pub fn parse_script(content: &str) -> Result<Vec<DragEvent>> {
    let events: Option<Vec<DragEvent>> =
        serde_yaml::from_str(content).context("Invalid drag script")?;
    Ok(events.unwrap_or_default())
}

fn open_driver(ws: &Workspace) -> Result<GestureDriver<CommitLog>> {
    let snapshot = ws.snapshot().context("Failed to load board")?;
    let engine = BoardEngine::new(snapshot, CommitLog::new()).context("Invalid board")?;
    Ok(GestureDriver::new(engine))
}

fn persist(ws: &Workspace, commits: &[Commit], format: OutputFormat) -> Result<()> {
    if commits.is_empty() {
        return output::print_success("Board unchanged", format);
    }

    let mut moved = Vec::with_capacity(commits.len());
    for commit in commits {
        let from = ws.get_item(&commit.item_id)?.category;
        let item = ws.apply_commit(commit).inspect_err(|e| {
            warn!(id = %commit.item_id, error = %e, "Failed to persist commit");
        })?;

        if matches!(format, OutputFormat::Human) {
            println!(
                "{}",
                style(format!(
                    "  {}: {} → {} (position {})",
                    item.id, from, commit.category, commit.position
                ))
                .green()
                .bold()
            );
        }
        moved.push(item);
    }

    match format {
        OutputFormat::Human => Ok(()),
        _ => output::print_list(&moved, format),
    }
}

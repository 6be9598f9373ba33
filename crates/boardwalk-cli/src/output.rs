//! Output formatting for the CLI.

use anyhow::Result;
use boardwalk_core::{BoardEvent, EventPayload, Projection, WorkItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Print output in the specified format.
pub fn print<T: Serialize + HumanDisplay + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", value.human_display()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Print a list in the specified format.
pub fn print_list<T: Serialize + HumanDisplay>(values: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for value in values {
                println!("{}", value.human_display());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(values)?),
    }
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{message}"),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "status": "ok", "message": message })
            );
        }
        OutputFormat::Yaml => println!("status: ok\nmessage: {message}"),
    }
    Ok(())
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

impl HumanDisplay for WorkItem {
    fn human_display(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "ID:        {}", self.id);
        let _ = writeln!(out, "Title:     {}", self.title);
        let _ = writeln!(out, "Category:  {}", self.category);

        if let Some(assignee) = &self.assignee {
            let _ = writeln!(out, "Assignee:  {assignee}");
        }
        if let Some(priority) = &self.priority {
            let _ = writeln!(out, "Priority:  {priority}");
        }
        if !self.tags.is_empty() {
            let _ = writeln!(out, "Tags:      {}", self.tags.join(", "));
        }
        if let Some(due) = &self.due {
            let _ = writeln!(out, "Due:       {}", format_time(due));
        }

        let _ = writeln!(out, "Created:   {}", format_time(&self.created_at));
        let _ = write!(out, "Updated:   {}", format_time(&self.updated_at));

        out
    }
}

impl HumanDisplay for BoardEvent {
    fn human_display(&self) -> String {
        let actor = self.actor.as_deref().unwrap_or("system");
        let time = format_time(&self.timestamp);

        format!(
            "[{time}] {actor}: {type} {item} - {payload}",
            type = self.event_type,
            item = self.item_id,
            payload = format_payload(&self.payload)
        )
    }
}

impl HumanDisplay for Projection {
    fn human_display(&self) -> String {
        let mut out = String::new();

        for column in &self.columns {
            let _ = writeln!(out, "{} ({})", column.label, column.items.len());
            let _ = writeln!(out, "{}", "-".repeat(40));
            for item in &column.items {
                let assignee = item.assignee.as_deref().unwrap_or("-");
                let _ = writeln!(out, "  {:<24} {:10} {}", item.id, assignee, item.title);
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_payload(payload: &EventPayload) -> String {
    match payload {
        EventPayload::Created(p) => format!("\"{}\" in {}", p.title, p.category),
        EventPayload::Moved(p) => format!("{} → {} at {}", p.from, p.to, p.position),
        EventPayload::Reordered(p) => format!("{} at {}", p.category, p.position),
    }
}

/// Summary view of a work item for list output.
#[derive(Debug, Serialize)]
pub struct WorkItemSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub assignee: Option<String>,
}

impl From<&WorkItem> for WorkItemSummary {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            assignee: item.assignee.clone(),
        }
    }
}

impl HumanDisplay for WorkItemSummary {
    fn human_display(&self) -> String {
        let assignee = self.assignee.as_deref().unwrap_or("-");
        format!(
            "{:<30} {:12} {:10} {}",
            self.id, self.category, assignee, self.title
        )
    }
}

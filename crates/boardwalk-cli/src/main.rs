//! boardwalk CLI - Kanban boards with drag-and-drop reordering from the command line.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "boardwalk")]
#[command(author, version, about = "Kanban board CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Workspace path (defaults to current directory)
    #[arg(long, short = 'C', global = true, env = "BOARDWALK_PATH")]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new board
    Init {
        /// Board name
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Create a new work item at the end of the board
    New {
        /// Title of the work item
        title: String,

        /// Column to create the item in
        #[arg(long, short = 'c')]
        category: Option<String>,

        /// Assignee
        #[arg(long, short = 'a')]
        assignee: Option<String>,

        /// Tags (can be specified multiple times)
        #[arg(long, short = 't')]
        tag: Vec<String>,

        /// Priority label
        #[arg(long, short = 'p')]
        priority: Option<String>,
    },

    /// List work items in board order
    #[command(alias = "ls")]
    List {
        /// Filter by column
        #[arg(long, short = 'c')]
        category: Option<String>,

        /// Filter by assignee
        #[arg(long, short = 'a')]
        assignee: Option<String>,

        /// Filter by tag
        #[arg(long, short = 't')]
        tag: Option<String>,
    },

    /// Show the board column by column
    Board,

    /// Drag a work item over targets and drop it
    Move {
        /// Work item to pick up
        id: String,

        /// Items or columns to hover, in order
        #[arg(long, short = 'o')]
        over: Vec<String>,

        /// Item or column to drop on (defaults to the last hover target)
        #[arg(long, short = 'd', conflicts_with = "cancel")]
        drop: Option<String>,

        /// Release over nothing, discarding the move
        #[arg(long)]
        cancel: bool,
    },

    /// Replay a YAML or JSON file of drag events
    Replay {
        /// Script file
        script: PathBuf,
    },

    /// Show board history
    Events {
        /// Show events from the last N days
        #[arg(long)]
        since: Option<u32>,
    },

    /// Start the board HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', default_value = "17474", env = "BOARDWALK_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let workspace_path = match cli.path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Init { name } => commands::init(&workspace_path, name, cli.format),
        Commands::New {
            title,
            category,
            assignee,
            tag,
            priority,
        } => commands::new_item(
            &workspace_path,
            &title,
            category.as_deref(),
            assignee,
            tag,
            priority,
            cli.format,
        ),
        Commands::List {
            category,
            assignee,
            tag,
        } => commands::list(&workspace_path, category, assignee, tag, cli.format),
        Commands::Board => commands::board(&workspace_path, cli.format),
        Commands::Move {
            id,
            over,
            drop,
            cancel,
        } => commands::move_item(&workspace_path, &id, &over, drop.as_deref(), cancel, cli.format),
        Commands::Replay { script } => commands::replay(&workspace_path, &script, cli.format),
        Commands::Events { since } => commands::events(&workspace_path, since, cli.format),
        Commands::Serve { port, host } => commands::serve(&workspace_path, &host, port),
    }
}

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Tasks, bookmarks, notes and prompts with spreadsheet sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull remote changes, then push the local queue
    Sync {
        /// Ignore the delta cursors and pull every row
        #[arg(long)]
        full: bool,
    },
    /// Show queue counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Requeue entries that exhausted their retries
    RetryFailed,
    /// Drop entries that exhausted their retries
    ClearFailed,
    /// Check that the spreadsheet endpoint answers
    TestConnection,
    /// Show or change sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run the auto-sync timer in the foreground
    Daemon,
    /// Manage tasks, bookmarks and notes
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Manage AI prompts
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings (secret redacted)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update sync settings
    Set {
        /// Apps Script web app URL
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Shared secret configured in the script
        #[arg(long, value_name = "SECRET")]
        secret: Option<String>,
        /// Enable or disable the auto-sync timer
        #[arg(long, value_name = "BOOL")]
        auto_sync: Option<bool>,
        /// Auto-sync period in minutes
        #[arg(long, value_name = "MINUTES")]
        interval: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Create an item
    #[command(alias = "new")]
    Add {
        /// Item title
        title: Vec<String>,
        /// task, bookmark or note
        #[arg(long = "type", default_value = "task")]
        item_type: String,
        /// Body text
        #[arg(long)]
        content: Option<String>,
        /// Link (bookmarks)
        #[arg(long)]
        url: Option<String>,
        /// high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
        /// Tag name (repeatable)
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Project name
        #[arg(long)]
        project: Option<String>,
    },
    /// List items
    List {
        /// Number of items to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as completed
    Complete {
        /// Item ID or unique ID prefix
        id: String,
    },
    /// Delete an item
    Delete {
        /// Item ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Create a prompt
    #[command(alias = "new")]
    Add {
        /// Prompt title
        title: String,
        /// Prompt text
        #[arg(long)]
        text: String,
        /// text, image or video
        #[arg(long = "type", default_value = "text")]
        prompt_type: String,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Tag name (repeatable)
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
    },
    /// List prompts
    List {
        /// Number of prompts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a prompt
    Delete {
        /// Prompt ID or unique ID prefix
        id: String,
    },
}

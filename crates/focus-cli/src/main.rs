//! Focus CLI - tasks, bookmarks, notes and prompts with spreadsheet sync
//!
//! Local edits land in the libSQL store and its outbox; `focus sync` and
//! `focus daemon` exchange them with the Google Sheets web app.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands, ItemCommands, PromptCommands};
use crate::commands::common::resolve_db_path;
use crate::commands::config::{run_config_set, run_config_show, SettingsUpdate};
use crate::commands::daemon::run_daemon;
use crate::commands::item::{
    run_item_add, run_item_complete, run_item_delete, run_item_list, NewItem,
};
use crate::commands::prompt::{run_prompt_add, run_prompt_delete, run_prompt_list, NewPrompt};
use crate::commands::sync::{
    run_clear_failed, run_retry_failed, run_status, run_sync, run_test_connection,
};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("focus=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync { full } => run_sync(full, &db_path).await?,
        Commands::Status { json } => run_status(json, &db_path).await?,
        Commands::RetryFailed => run_retry_failed(&db_path).await?,
        Commands::ClearFailed => run_clear_failed(&db_path).await?,
        Commands::TestConnection => run_test_connection(&db_path).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => run_config_show(json, &db_path).await?,
            ConfigCommands::Set {
                endpoint,
                secret,
                auto_sync,
                interval,
            } => {
                let update = SettingsUpdate {
                    endpoint,
                    secret,
                    auto_sync,
                    interval,
                };
                run_config_set(update, &db_path).await?;
            }
        },
        Commands::Daemon => run_daemon(&db_path).await?,
        Commands::Item { command } => match command {
            ItemCommands::Add {
                title,
                item_type,
                content,
                url,
                priority,
                deadline,
                tags,
                category,
                project,
            } => {
                let new_item = NewItem {
                    title,
                    item_type,
                    content,
                    url,
                    priority,
                    deadline,
                    tags,
                    category,
                    project,
                };
                run_item_add(new_item, &db_path).await?;
            }
            ItemCommands::List { limit, json } => run_item_list(limit, json, &db_path).await?,
            ItemCommands::Complete { id } => run_item_complete(&id, &db_path).await?,
            ItemCommands::Delete { id } => run_item_delete(&id, &db_path).await?,
        },
        Commands::Prompt { command } => match command {
            PromptCommands::Add {
                title,
                text,
                prompt_type,
                category,
                tags,
            } => {
                let new_prompt = NewPrompt {
                    title,
                    text,
                    prompt_type,
                    category,
                    tags,
                };
                run_prompt_add(new_prompt, &db_path).await?;
            }
            PromptCommands::List { limit, json } => run_prompt_list(limit, json, &db_path).await?,
            PromptCommands::Delete { id } => run_prompt_delete(&id, &db_path).await?,
        },
    }

    Ok(())
}

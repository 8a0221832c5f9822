use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use focus_core::models::{Item, Priority, Prompt, QueueStatus, Settings};
use focus_core::services::DatabaseService;
use focus_core::sheets::SheetsClient;
use focus_core::sync::{SyncResult, SyncService};
use focus_core::transform::MetadataSnapshot;
use focus_core::util::{is_http_url, normalize_text_option};
use serde::Serialize;

use crate::error::CliError;

/// Characters of an id shown in list output
const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct ItemListItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub completed: bool,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub tags: Vec<String>,
    pub updated_at: i64,
    pub relative_time: String,
    pub sync_status: String,
}

#[derive(Debug, Serialize)]
pub struct PromptListItem {
    pub id: String,
    #[serde(rename = "type")]
    pub prompt_type: String,
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub updated_at: i64,
    pub relative_time: String,
    pub sync_status: String,
}

/// Status as seen from the database file. Whether a daemon is mid-cycle
/// is not observable from another process, so it is not reported.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub queued: u64,
    pub syncing: u64,
    pub failed: u64,
    pub last_sync_at_items: Option<i64>,
    pub last_sync_at_prompts: Option<i64>,
}

impl StatusView {
    pub fn new(queue: &QueueStatus, settings: &Settings) -> Self {
        Self {
            queued: queue.queued,
            syncing: queue.syncing,
            failed: queue.failed,
            last_sync_at_items: settings.last_sync_at_items,
            last_sync_at_prompts: settings.last_sync_at_prompts,
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("FOCUS_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("focus")
        .join("focus.db")
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path).await?)
}

/// Sync engine over the spreadsheet client, refusing to start unconfigured.
pub async fn open_sync_service(path: &Path) -> Result<SyncService<SheetsClient>, CliError> {
    let db = open_database(path).await?;
    if !db.load_settings().await?.is_sync_configured() {
        return Err(CliError::SyncNotConfigured);
    }
    let client = SheetsClient::new(db.clone())?;
    Ok(SyncService::new(db, client))
}

pub fn normalize_title(parts: &[String]) -> Result<String, CliError> {
    normalize_text_option(Some(parts.join(" "))).ok_or(CliError::EmptyTitle)
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_endpoint(value: &str) -> Result<String, CliError> {
    let trimmed = value.trim();
    if is_http_url(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(CliError::Config(format!(
            "endpoint must be an http(s) URL, got '{trimmed}'"
        )))
    }
}

pub fn validate_interval(minutes: u32) -> Result<u32, CliError> {
    if minutes == 0 {
        Err(CliError::Config(
            "auto-sync interval must be at least 1 minute".to_string(),
        ))
    } else {
        Ok(minutes)
    }
}

/// Pick the single id equal to, or else starting with, `query`.
pub fn match_id_prefix<'a>(query: &str, ids: &[&'a str]) -> Result<&'a str, CliError> {
    if let Some(exact) = ids.iter().copied().find(|id| *id == query) {
        return Ok(exact);
    }

    let matches = ids
        .iter()
        .filter(|id| id.starts_with(query))
        .copied()
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::NotFound(query.to_string())),
        [only] => Ok(*only),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub async fn resolve_item(query: &str, db: &DatabaseService) -> Result<Item, CliError> {
    let query = normalize_identifier(query)?;
    let items = db.list_items().await?;
    let ids = items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();
    let id = match_id_prefix(&query, &ids)?.to_string();

    items
        .into_iter()
        .find(|item| item.id.as_str() == id)
        .ok_or(CliError::NotFound(query))
}

pub async fn resolve_prompt(query: &str, db: &DatabaseService) -> Result<Prompt, CliError> {
    let query = normalize_identifier(query)?;
    let prompts = db.list_prompts().await?;
    let ids = prompts
        .iter()
        .map(|prompt| prompt.id.as_str())
        .collect::<Vec<_>>();
    let id = match_id_prefix(&query, &ids)?.to_string();

    prompts
        .into_iter()
        .find(|prompt| prompt.id.as_str() == id)
        .ok_or(CliError::NotFound(query))
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn item_tag_names(item: &Item, metadata: &MetadataSnapshot) -> Vec<String> {
    item.tags
        .iter()
        .filter_map(|id| metadata.tag_name(id))
        .map(ToString::to_string)
        .collect()
}

pub fn item_to_list_item(item: &Item, metadata: &MetadataSnapshot) -> ItemListItem {
    let now_ms = Utc::now().timestamp_millis();
    ItemListItem {
        id: item.id.to_string(),
        item_type: item.item_type.to_string(),
        title: item.title.clone(),
        completed: item.completed,
        priority: item.priority.map(|priority| priority.to_string()),
        deadline: item.deadline.map(|date| date.to_string()),
        tags: item_tag_names(item, metadata),
        updated_at: item.updated_at,
        relative_time: format_relative_time(item.updated_at, now_ms),
        sync_status: item.sync_status.as_str().to_string(),
    }
}

pub fn format_item_lines(items: &[Item], metadata: &MetadataSnapshot) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    items
        .iter()
        .map(|item| {
            let check = match (item.completed, item.item_type.as_str()) {
                (true, _) => "[x]",
                (false, "task") => "[ ]",
                _ => "   ",
            };
            let marker = match item.priority {
                Some(Priority::High) => "!",
                _ => " ",
            };
            let tags = item_tag_names(item, metadata)
                .into_iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" ");
            let line = format!(
                "{:<13}  {check}{marker} {:<8} {:<40}  {}",
                short_id(item.id.as_str()),
                item.item_type.as_str(),
                preview(&item.title, 40),
                format_relative_time(item.updated_at, now_ms)
            );
            if tags.is_empty() {
                line
            } else {
                format!("{line}  {tags}")
            }
        })
        .collect()
}

pub fn prompt_to_list_item(prompt: &Prompt) -> PromptListItem {
    let now_ms = Utc::now().timestamp_millis();
    PromptListItem {
        id: prompt.id.to_string(),
        prompt_type: prompt.prompt_type.to_string(),
        title: prompt.title.clone(),
        category: prompt.category.clone(),
        tags: prompt.tags.clone(),
        updated_at: prompt.updated_at,
        relative_time: format_relative_time(prompt.updated_at, now_ms),
        sync_status: prompt.sync_status.as_str().to_string(),
    }
}

pub fn format_prompt_lines(prompts: &[Prompt]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    prompts
        .iter()
        .map(|prompt| {
            format!(
                "{:<13}  {:<6} {:<40}  {}",
                short_id(prompt.id.as_str()),
                prompt.prompt_type.as_str(),
                preview(&prompt.title, 40),
                format_relative_time(prompt.updated_at, now_ms)
            )
        })
        .collect()
}

pub fn format_sync_result(result: &SyncResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} created, {} updated, {} deleted",
        if result.success {
            "Sync completed"
        } else {
            "Sync failed"
        },
        result.created,
        result.updated,
        result.deleted
    )];
    lines.extend(result.errors.iter().map(|error| format!("  error: {error}")));
    lines
}

pub fn format_status_lines(view: &StatusView, remote_configured: bool) -> Vec<String> {
    let cursor = |value: Option<i64>| value.map_or_else(|| "never".to_string(), format_sync_timestamp);
    vec![
        format!(
            "Remote:       {}",
            if remote_configured {
                "configured"
            } else {
                "not configured"
            }
        ),
        format!("Queued:       {}", view.queued),
        format!("In flight:    {}", view.syncing),
        format!("Failed:       {}", view.failed),
        format!("Items pull:   {}", cursor(view.last_sync_at_items)),
        format!("Prompts pull: {}", cursor(view.last_sync_at_prompts)),
    ]
}

pub fn format_settings_lines(settings: &Settings) -> Vec<String> {
    vec![
        format!(
            "endpoint:      {}",
            settings.remote_endpoint_url.as_deref().unwrap_or("(unset)")
        ),
        format!(
            "secret:        {}",
            if settings.remote_secret.is_some() {
                "[REDACTED]"
            } else {
                "(unset)"
            }
        ),
        format!("auto-sync:     {}", settings.auto_sync_enabled),
        format!(
            "interval:      {} min",
            settings.auto_sync_interval_minutes
        ),
    ]
}

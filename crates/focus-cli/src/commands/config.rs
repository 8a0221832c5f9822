use std::path::Path;

use focus_core::models::Settings;
use focus_core::util::normalize_text_option;
use serde::Serialize;

use crate::commands::common::{
    format_settings_lines, normalize_endpoint, open_database, validate_interval,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SettingsView<'a> {
    endpoint: Option<&'a str>,
    secret_set: bool,
    auto_sync_enabled: bool,
    auto_sync_interval_minutes: u32,
    last_sync_at_items: Option<i64>,
    last_sync_at_prompts: Option<i64>,
}

pub async fn run_config_show(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let settings = db.load_settings().await?;

    if as_json {
        let view = SettingsView {
            endpoint: settings.remote_endpoint_url.as_deref(),
            secret_set: settings.remote_secret.is_some(),
            auto_sync_enabled: settings.auto_sync_enabled,
            auto_sync_interval_minutes: settings.auto_sync_interval_minutes,
            last_sync_at_items: settings.last_sync_at_items,
            last_sync_at_prompts: settings.last_sync_at_prompts,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for line in format_settings_lines(&settings) {
        println!("{line}");
    }
    Ok(())
}

/// Requested changes to sync settings; `None` leaves a field alone
#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub endpoint: Option<String>,
    pub secret: Option<String>,
    pub auto_sync: Option<bool>,
    pub interval: Option<u32>,
}

impl SettingsUpdate {
    pub const fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.secret.is_none()
            && self.auto_sync.is_none()
            && self.interval.is_none()
    }
}

/// Validate `update` and merge it into `settings`.
///
/// An empty endpoint or secret clears the stored value.
pub fn apply_settings_update(
    mut settings: Settings,
    update: SettingsUpdate,
) -> Result<Settings, CliError> {
    if let Some(endpoint) = update.endpoint {
        settings.remote_endpoint_url = match normalize_text_option(Some(endpoint)) {
            Some(value) => Some(normalize_endpoint(&value)?),
            None => None,
        };
    }
    if let Some(secret) = update.secret {
        settings.remote_secret = normalize_text_option(Some(secret));
    }
    if let Some(enabled) = update.auto_sync {
        settings.auto_sync_enabled = enabled;
    }
    if let Some(minutes) = update.interval {
        settings.auto_sync_interval_minutes = validate_interval(minutes)?;
    }
    Ok(settings)
}

pub async fn run_config_set(update: SettingsUpdate, db_path: &Path) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::Config(
            "nothing to change; pass --endpoint, --secret, --auto-sync or --interval".to_string(),
        ));
    }

    let db = open_database(db_path).await?;
    let settings = apply_settings_update(db.load_settings().await?, update)?;
    db.save_settings(&settings).await?;

    println!("Settings saved");
    for line in format_settings_lines(&settings) {
        println!("{line}");
    }
    Ok(())
}

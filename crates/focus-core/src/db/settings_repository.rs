//! Settings repository implementation

use crate::error::Result;
use crate::models::Settings;
use libsql::Connection;

const KEY_ENDPOINT_URL: &str = "remote_endpoint_url";
const KEY_SECRET: &str = "remote_secret";
const KEY_LAST_SYNC_ITEMS: &str = "last_sync_at_items";
const KEY_LAST_SYNC_PROMPTS: &str = "last_sync_at_prompts";
const KEY_AUTO_SYNC_ENABLED: &str = "auto_sync_enabled";
const KEY_AUTO_SYNC_INTERVAL: &str = "auto_sync_interval_minutes";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<Settings>;

    /// Save settings to the database
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        settings.remote_endpoint_url = self.get_setting(KEY_ENDPOINT_URL).await?;
        settings.remote_secret = self.get_setting(KEY_SECRET).await?;
        settings.last_sync_at_items = self
            .get_setting(KEY_LAST_SYNC_ITEMS)
            .await?
            .and_then(|value| value.parse().ok());
        settings.last_sync_at_prompts = self
            .get_setting(KEY_LAST_SYNC_PROMPTS)
            .await?
            .and_then(|value| value.parse().ok());

        if let Some(value) = self.get_setting(KEY_AUTO_SYNC_ENABLED).await? {
            settings.auto_sync_enabled = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Some(value) = self.get_setting(KEY_AUTO_SYNC_INTERVAL).await? {
            if let Ok(minutes) = value.trim().parse() {
                settings.auto_sync_interval_minutes = minutes;
            }
        }

        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        self.put_optional(KEY_ENDPOINT_URL, settings.remote_endpoint_url.as_deref())
            .await?;
        self.put_optional(KEY_SECRET, settings.remote_secret.as_deref())
            .await?;
        self.put_optional(
            KEY_LAST_SYNC_ITEMS,
            settings.last_sync_at_items.map(|v| v.to_string()).as_deref(),
        )
        .await?;
        self.put_optional(
            KEY_LAST_SYNC_PROMPTS,
            settings
                .last_sync_at_prompts
                .map(|v| v.to_string())
                .as_deref(),
        )
        .await?;
        self.set_setting(
            KEY_AUTO_SYNC_ENABLED,
            if settings.auto_sync_enabled {
                "true"
            } else {
                "false"
            },
        )
        .await?;
        self.set_setting(
            KEY_AUTO_SYNC_INTERVAL,
            &settings.auto_sync_interval_minutes.to_string(),
        )
        .await?;
        Ok(())
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn put_optional(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.set_setting(key, value).await,
            None => {
                self.conn
                    .execute("DELETE FROM settings WHERE key = ?", [key])
                    .await?;
                Ok(())
            }
        }
    }
}

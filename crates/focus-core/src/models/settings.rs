//! Sync settings model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::sync_queue::EntityFamily;
use crate::util::normalize_text_option;

/// Default auto-sync period
pub const DEFAULT_AUTO_SYNC_INTERVAL_MINUTES: u32 = 5;

/// Endpoint and shared secret of the spreadsheet web app
#[derive(Clone, PartialEq, Eq)]
pub struct SheetsCredentials {
    pub url: String,
    pub secret: String,
}

impl fmt::Debug for SheetsCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SheetsCredentials")
            .field("url", &self.url)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Application settings relevant to sync
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Deployed web app URL of the spreadsheet script
    pub remote_endpoint_url: Option<String>,
    /// Shared secret appended to every request
    pub remote_secret: Option<String>,
    /// Items pull cursor (Unix ms)
    pub last_sync_at_items: Option<i64>,
    /// Prompts pull cursor (Unix ms)
    pub last_sync_at_prompts: Option<i64>,
    pub auto_sync_enabled: bool,
    pub auto_sync_interval_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_endpoint_url: None,
            remote_secret: None,
            last_sync_at_items: None,
            last_sync_at_prompts: None,
            auto_sync_enabled: true,
            auto_sync_interval_minutes: DEFAULT_AUTO_SYNC_INTERVAL_MINUTES,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Settings")
            .field("remote_endpoint_url", &self.remote_endpoint_url)
            .field(
                "remote_secret",
                &self.remote_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("last_sync_at_items", &self.last_sync_at_items)
            .field("last_sync_at_prompts", &self.last_sync_at_prompts)
            .field("auto_sync_enabled", &self.auto_sync_enabled)
            .field(
                "auto_sync_interval_minutes",
                &self.auto_sync_interval_minutes,
            )
            .finish()
    }
}

impl Settings {
    /// Credentials for the remote store, when both endpoint and secret are set
    pub fn sheets_credentials(&self) -> Option<SheetsCredentials> {
        let url = normalize_text_option(self.remote_endpoint_url.clone())?;
        let secret = normalize_text_option(self.remote_secret.clone())?;
        Some(SheetsCredentials { url, secret })
    }

    pub fn is_sync_configured(&self) -> bool {
        self.sheets_credentials().is_some()
    }

    /// Pull cursor for a family; zero counts as never synced
    pub fn cursor(&self, family: EntityFamily) -> Option<i64> {
        let cursor = match family {
            EntityFamily::Items => self.last_sync_at_items,
            EntityFamily::Prompts => self.last_sync_at_prompts,
        };
        cursor.filter(|timestamp| *timestamp > 0)
    }

    pub fn set_cursor(&mut self, family: EntityFamily, timestamp_ms: i64) {
        match family {
            EntityFamily::Items => self.last_sync_at_items = Some(timestamp_ms),
            EntityFamily::Prompts => self.last_sync_at_prompts = Some(timestamp_ms),
        }
    }

    /// Auto-sync period in minutes, or `None` when the timer should not run
    pub fn auto_sync_period_minutes(&self) -> Option<u32> {
        (self.auto_sync_enabled && self.auto_sync_interval_minutes > 0)
            .then_some(self.auto_sync_interval_minutes)
    }
}

//! Prompt model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::PromptId;
use super::sync_queue::SyncStatus;
use crate::error::Error;
use crate::util::now_millis;

/// Media kind a prompt targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Text,
    Image,
    Video,
}

impl PromptType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(Error::InvalidInput(format!("unknown prompt type '{other}'"))),
        }
    }
}

/// Quality rating from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QualityRating(u8);

impl QualityRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` outside `1..=5`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for QualityRating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| Error::InvalidInput(format!("quality must be 1-5, got {value}")))
    }
}

impl From<QualityRating> for u8 {
    fn from(value: QualityRating) -> Self {
        value.0
    }
}

/// An AI prompt in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    pub description: String,
    /// Prompt text
    pub prompt: String,
    pub prompt_type: PromptType,
    pub category: Option<String>,
    /// Tag names (prompts do not reference tag records)
    pub tags: Vec<String>,
    pub note: String,
    pub approved: bool,
    pub favorite: bool,
    pub quality: Option<QualityRating>,
    pub text_demo: Option<String>,
    /// Local-only attachment, never sent to the remote store
    pub file_demo: Option<String>,
    pub url_demo: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms), the LWW clock
    pub updated_at: i64,
    pub sync_status: SyncStatus,
    pub legacy_external_id: Option<String>,
}

impl Prompt {
    /// Create a new pending text prompt
    #[must_use]
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: PromptId::new(),
            title: title.into(),
            description: String::new(),
            prompt: prompt.into(),
            prompt_type: PromptType::Text,
            category: None,
            tags: Vec::new(),
            note: String::new(),
            approved: false,
            favorite: false,
            quality: None,
            text_demo: None,
            file_demo: None,
            url_demo: None,
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Pending,
            legacy_external_id: None,
        }
    }

    /// Record a local mutation: advance the LWW clock and mark pending.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at.saturating_add(1));
        self.sync_status = SyncStatus::Pending;
    }
}

//! Item model (tasks, bookmarks and notes)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, ItemId, ProjectId, TagId};
use super::sync_queue::SyncStatus;
use crate::error::Error;
use crate::util::now_millis;

/// Kind of list item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Task,
    Bookmark,
    Note,
}

impl ItemType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Bookmark => "bookmark",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "bookmark" => Ok(Self::Bookmark),
            "note" => Ok(Self::Note),
            other => Err(Error::InvalidInput(format!("unknown item type '{other}'"))),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(Error::InvalidInput(format!("unknown priority '{other}'"))),
        }
    }
}

/// A task, bookmark or note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Item kind
    pub item_type: ItemType,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub favicon_url: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
    pub category_id: Option<CategoryId>,
    pub project_id: Option<ProjectId>,
    /// Tag ids, without duplicates
    pub tags: Vec<TagId>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms), the LWW clock
    pub updated_at: i64,
    pub sync_status: SyncStatus,
    /// Identifier from the retired Notion integration
    pub legacy_external_id: Option<String>,
}

impl Item {
    /// Create a new pending item with the given kind and title
    #[must_use]
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: ItemId::new(),
            item_type,
            title: title.into(),
            content: String::new(),
            url: None,
            favicon_url: None,
            priority: None,
            deadline: None,
            completed: false,
            category_id: None,
            project_id: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Pending,
            legacy_external_id: None,
        }
    }

    /// Add a tag id unless it is already present
    pub fn add_tag(&mut self, tag_id: TagId) {
        if !self.tags.contains(&tag_id) {
            self.tags.push(tag_id);
        }
    }

    /// Record a local mutation: advance the LWW clock and mark pending.
    ///
    /// The clock never moves backwards, even when the wall clock does.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at.saturating_add(1));
        self.sync_status = SyncStatus::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_new() {
        let item = Item::new(ItemType::Task, "Buy milk");
        assert_eq!(item.title, "Buy milk");
        assert!(!item.completed);
        assert_eq!(item.sync_status, SyncStatus::Pending);
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_touch_advances_clock() {
        let mut item = Item::new(ItemType::Note, "n");
        item.updated_at = i64::MAX / 2;
        item.sync_status = SyncStatus::Synced;
        item.touch();
        assert_eq!(item.updated_at, i64::MAX / 2 + 1);
        assert_eq!(item.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_add_tag_deduplicates() {
        let mut item = Item::new(ItemType::Bookmark, "b");
        item.add_tag(TagId::from("t1"));
        item.add_tag(TagId::from("t1"));
        assert_eq!(item.tags.len(), 1);
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!("Task".parse::<ItemType>().unwrap(), ItemType::Task);
        assert!("reminder".parse::<ItemType>().is_err());
        assert_eq!(" LOW ".parse::<Priority>().unwrap(), Priority::Low);
    }
}

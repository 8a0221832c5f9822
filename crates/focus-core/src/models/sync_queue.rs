//! Sync queue (outbox) model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Failures tolerated before an entry is parked as `failed`
pub const MAX_SYNC_RETRIES: u32 = 3;

/// Whether a local record has reached the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            other => Err(Error::Database(format!("unknown sync status '{other}'"))),
        }
    }
}

/// Entity families synchronized independently, each with its own queue and cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityFamily {
    Items,
    Prompts,
}

impl EntityFamily {
    pub const ALL: [Self; 2] = [Self::Items, Self::Prompts];

    /// Backing table of this family's queue
    pub const fn queue_table(self) -> &'static str {
        match self {
            Self::Items => "sync_queue",
            Self::Prompts => "prompt_sync_queue",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Prompts => "prompts",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::Database(format!("unknown sync operation '{other}'"))),
        }
    }
}

/// Lifecycle of a queue entry: `queued -> syncing -> (removed | queued | failed)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryStatus {
    Queued,
    Syncing,
    Failed,
}

impl QueueEntryStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Syncing => "syncing",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for QueueEntryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "syncing" => Ok(Self::Syncing),
            "failed" => Ok(Self::Failed),
            other => Err(Error::Database(format!("unknown queue status '{other}'"))),
        }
    }
}

/// One pending push operation for an item or prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueEntry {
    /// Queue row identifier
    pub id: i64,
    /// Id of the item or prompt the operation targets
    pub entity_id: String,
    pub operation: SyncOperation,
    pub status: QueueEntryStatus,
    pub retries: u32,
    /// Enqueue timestamp (Unix ms)
    pub timestamp: i64,
    /// Message of the most recent failed attempt
    pub last_error: Option<String>,
}

impl SyncQueueEntry {
    /// Status after one more failed attempt
    pub const fn status_after_failure(retries: u32) -> QueueEntryStatus {
        if retries >= MAX_SYNC_RETRIES {
            QueueEntryStatus::Failed
        } else {
            QueueEntryStatus::Queued
        }
    }
}

/// Queue counts across both families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queued: u64,
    pub syncing: u64,
    pub failed: u64,
}

impl QueueStatus {
    pub const fn total(&self) -> u64 {
        self.queued + self.syncing + self.failed
    }

    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        Self {
            queued: self.queued + other.queued,
            syncing: self.syncing + other.syncing,
            failed: self.failed + other.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_after_failure_threshold() {
        assert_eq!(
            SyncQueueEntry::status_after_failure(1),
            QueueEntryStatus::Queued
        );
        assert_eq!(
            SyncQueueEntry::status_after_failure(2),
            QueueEntryStatus::Queued
        );
        assert_eq!(
            SyncQueueEntry::status_after_failure(3),
            QueueEntryStatus::Failed
        );
    }

    #[test]
    fn test_queue_status_combine() {
        let items = QueueStatus {
            queued: 2,
            syncing: 0,
            failed: 1,
        };
        let prompts = QueueStatus {
            queued: 1,
            syncing: 1,
            failed: 0,
        };
        let combined = items.combine(prompts);
        assert_eq!(combined.queued, 3);
        assert_eq!(combined.total(), 5);
    }

    #[test]
    fn test_operation_roundtrip_str() {
        for op in [
            SyncOperation::Create,
            SyncOperation::Update,
            SyncOperation::Delete,
        ] {
            assert_eq!(op.as_str().parse::<SyncOperation>().unwrap(), op);
        }
    }
}

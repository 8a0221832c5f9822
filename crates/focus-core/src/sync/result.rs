use serde::{Deserialize, Serialize};

use crate::models::QueueStatus;

/// Error reported when a cycle is requested while another one runs
pub const SYNC_IN_PROGRESS: &str = "Sync already in progress";

/// Outcome of a sync phase or a whole cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub created: u32,
    pub updated: u32,
    pub deleted: u32,
    pub errors: Vec<String>,
}

impl SyncResult {
    /// Successful result with nothing changed
    pub const fn ok() -> Self {
        Self {
            success: true,
            created: 0,
            updated: 0,
            deleted: 0,
            errors: Vec::new(),
        }
    }

    pub fn busy() -> Self {
        Self::failure(SYNC_IN_PROGRESS)
    }

    /// Whole-phase failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
            ..Self::ok()
        }
    }

    /// Combine two phases: counts add up, success requires both
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.success &= other.success;
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.errors.extend(other.errors);
        self
    }

    pub const fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0 || self.deleted > 0
    }
}

/// Answer to a status request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusReport {
    pub is_syncing: bool,
    pub queued: u64,
    pub syncing: u64,
    pub failed: u64,
}

impl SyncStatusReport {
    pub const fn new(is_syncing: bool, queue: QueueStatus) -> Self {
        Self {
            is_syncing,
            queued: queue.queued,
            syncing: queue.syncing,
            failed: queue.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_adds_counts_and_ands_success() {
        let pulled = SyncResult {
            created: 2,
            ..SyncResult::ok()
        };
        let pushed = SyncResult {
            success: false,
            updated: 1,
            errors: vec!["update a1: HTTP 500".to_string()],
            ..SyncResult::ok()
        };

        let merged = pulled.merge(pushed);

        assert!(!merged.success);
        assert_eq!(merged.created, 2);
        assert_eq!(merged.updated, 1);
        assert_eq!(merged.errors, vec!["update a1: HTTP 500".to_string()]);
        assert!(merged.has_changes());
    }

    #[test]
    fn busy_result_shape() {
        let busy = SyncResult::busy();
        assert!(!busy.success);
        assert_eq!(busy.errors, vec![SYNC_IN_PROGRESS.to_string()]);
        assert!(!busy.has_changes());
    }

    #[test]
    fn status_report_serializes_camel_case() {
        let report = SyncStatusReport::new(
            true,
            QueueStatus {
                queued: 1,
                syncing: 0,
                failed: 2,
            },
        );
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["isSyncing"], true);
        assert_eq!(value["failed"], 2);
    }
}

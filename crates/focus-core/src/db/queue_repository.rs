//! Sync queue repository implementation
//!
//! Both families share one schema; the family selects the backing table.

use libsql::{params, Connection, Row};

use super::{nullable, optional_text};
use crate::error::{Error, Result};
use crate::models::{EntityFamily, QueueEntryStatus, QueueStatus, SyncOperation, SyncQueueEntry};
use crate::util::now_millis;

/// Trait for sync queue storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SyncQueueRepository {
    /// Append a `queued` entry for a local mutation
    async fn enqueue(
        &self,
        family: EntityFamily,
        entity_id: &str,
        operation: SyncOperation,
    ) -> Result<SyncQueueEntry>;

    /// Entries with the given status, oldest first
    async fn list_by_status(
        &self,
        family: EntityFamily,
        status: QueueEntryStatus,
    ) -> Result<Vec<SyncQueueEntry>>;

    /// Move an entry to `syncing`
    async fn mark_syncing(&self, family: EntityFamily, id: i64) -> Result<()>;

    /// Return entries left `syncing` by an interrupted drain to `queued`
    async fn requeue_syncing(&self, family: EntityFamily) -> Result<u64>;

    /// Remove an entry after it was applied (or found vacuous)
    async fn remove(&self, family: EntityFamily, id: i64) -> Result<()>;

    /// Store the outcome of a failed attempt
    async fn record_failure(
        &self,
        family: EntityFamily,
        id: i64,
        retries: u32,
        status: QueueEntryStatus,
        error: &str,
    ) -> Result<()>;

    /// Count entries per status
    async fn status_counts(&self, family: EntityFamily) -> Result<QueueStatus>;

    /// Requeue every failed entry with a fresh retry budget
    async fn reset_failed(&self, family: EntityFamily) -> Result<u64>;

    /// Drop every failed entry
    async fn clear_failed(&self, family: EntityFamily) -> Result<u64>;

    /// Whether a delete for this entity is still waiting to be pushed
    async fn has_pending_delete(&self, family: EntityFamily, entity_id: &str) -> Result<bool>;
}

/// libSQL implementation of `SyncQueueRepository`
pub struct LibSqlSyncQueueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_entry(row: &Row) -> Result<SyncQueueEntry> {
        let operation: String = row.get(2)?;
        let status: String = row.get(3)?;
        let retries: i64 = row.get(4)?;

        Ok(SyncQueueEntry {
            id: row.get(0)?,
            entity_id: row.get(1)?,
            operation: operation.parse()?,
            status: status.parse()?,
            retries: u32::try_from(retries)
                .map_err(|_| Error::Database(format!("invalid retry count {retries}")))?,
            timestamp: row.get(5)?,
            last_error: optional_text(row, 6)?,
        })
    }

    async fn count(&self, family: EntityFamily, status: QueueEntryStatus) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE status = ?",
                    family.queue_table()
                ),
                [status.as_str()],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl SyncQueueRepository for LibSqlSyncQueueRepository<'_> {
    async fn enqueue(
        &self,
        family: EntityFamily,
        entity_id: &str,
        operation: SyncOperation,
    ) -> Result<SyncQueueEntry> {
        let timestamp = now_millis();
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (entity_id, operation, status, retries, timestamp) \
                     VALUES (?, ?, ?, 0, ?)",
                    family.queue_table()
                ),
                params![
                    entity_id,
                    operation.as_str(),
                    QueueEntryStatus::Queued.as_str(),
                    timestamp
                ],
            )
            .await?;

        Ok(SyncQueueEntry {
            id: self.conn.last_insert_rowid(),
            entity_id: entity_id.to_string(),
            operation,
            status: QueueEntryStatus::Queued,
            retries: 0,
            timestamp,
            last_error: None,
        })
    }

    async fn list_by_status(
        &self,
        family: EntityFamily,
        status: QueueEntryStatus,
    ) -> Result<Vec<SyncQueueEntry>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT id, entity_id, operation, status, retries, timestamp, last_error
                     FROM {} WHERE status = ? ORDER BY timestamp, id",
                    family.queue_table()
                ),
                [status.as_str()],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_entry(&row)?);
        }
        Ok(entries)
    }

    async fn mark_syncing(&self, family: EntityFamily, id: i64) -> Result<()> {
        self.conn
            .execute(
                &format!("UPDATE {} SET status = ? WHERE id = ?", family.queue_table()),
                params![QueueEntryStatus::Syncing.as_str(), id],
            )
            .await?;
        Ok(())
    }

    async fn requeue_syncing(&self, family: EntityFamily) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET status = ? WHERE status = ?",
                    family.queue_table()
                ),
                params![
                    QueueEntryStatus::Queued.as_str(),
                    QueueEntryStatus::Syncing.as_str()
                ],
            )
            .await?;
        Ok(rows)
    }

    async fn remove(&self, family: EntityFamily, id: i64) -> Result<()> {
        self.conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", family.queue_table()),
                [id],
            )
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        family: EntityFamily,
        id: i64,
        retries: u32,
        status: QueueEntryStatus,
        error: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "UPDATE {} SET status = ?, retries = ?, last_error = ? WHERE id = ?",
                    family.queue_table()
                ),
                params![
                    status.as_str(),
                    i64::from(retries),
                    nullable(Some(error)),
                    id
                ],
            )
            .await?;
        Ok(())
    }

    async fn status_counts(&self, family: EntityFamily) -> Result<QueueStatus> {
        Ok(QueueStatus {
            queued: self.count(family, QueueEntryStatus::Queued).await?,
            syncing: self.count(family, QueueEntryStatus::Syncing).await?,
            failed: self.count(family, QueueEntryStatus::Failed).await?,
        })
    }

    async fn reset_failed(&self, family: EntityFamily) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET status = ?, retries = 0 WHERE status = ?",
                    family.queue_table()
                ),
                params![
                    QueueEntryStatus::Queued.as_str(),
                    QueueEntryStatus::Failed.as_str()
                ],
            )
            .await?;
        Ok(rows)
    }

    async fn clear_failed(&self, family: EntityFamily) -> Result<u64> {
        let rows = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE status = ?", family.queue_table()),
                [QueueEntryStatus::Failed.as_str()],
            )
            .await?;
        Ok(rows)
    }

    async fn has_pending_delete(&self, family: EntityFamily, entity_id: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE entity_id = ? AND operation = ?)",
                    family.queue_table()
                ),
                params![entity_id, SyncOperation::Delete.as_str()],
            )
            .await?;

        Ok(match rows.next().await? {
            Some(row) => row.get::<i64>(0)? != 0,
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_lists_fifo() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncQueueRepository::new(db.connection());

        let first = repo
            .enqueue(EntityFamily::Items, "a", SyncOperation::Create)
            .await
            .unwrap();
        let second = repo
            .enqueue(EntityFamily::Items, "b", SyncOperation::Update)
            .await
            .unwrap();

        let queued = repo
            .list_by_status(EntityFamily::Items, QueueEntryStatus::Queued)
            .await
            .unwrap();
        assert_eq!(queued, vec![first, second]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_families_are_independent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncQueueRepository::new(db.connection());

        repo.enqueue(EntityFamily::Prompts, "p1", SyncOperation::Create)
            .await
            .unwrap();

        let items = repo.status_counts(EntityFamily::Items).await.unwrap();
        let prompts = repo.status_counts(EntityFamily::Prompts).await.unwrap();
        assert_eq!(items.total(), 0);
        assert_eq!(prompts.queued, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_reset_and_clear() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncQueueRepository::new(db.connection());

        let entry = repo
            .enqueue(EntityFamily::Items, "a", SyncOperation::Update)
            .await
            .unwrap();
        repo.mark_syncing(EntityFamily::Items, entry.id).await.unwrap();
        repo.record_failure(
            EntityFamily::Items,
            entry.id,
            3,
            QueueEntryStatus::Failed,
            "HTTP 500",
        )
        .await
        .unwrap();

        let failed = repo
            .list_by_status(EntityFamily::Items, QueueEntryStatus::Failed)
            .await
            .unwrap();
        assert_eq!(failed[0].retries, 3);
        assert_eq!(failed[0].last_error.as_deref(), Some("HTTP 500"));

        assert_eq!(repo.reset_failed(EntityFamily::Items).await.unwrap(), 1);
        let queued = repo
            .list_by_status(EntityFamily::Items, QueueEntryStatus::Queued)
            .await
            .unwrap();
        assert_eq!(queued[0].retries, 0);

        repo.record_failure(
            EntityFamily::Items,
            entry.id,
            3,
            QueueEntryStatus::Failed,
            "HTTP 500",
        )
        .await
        .unwrap();
        assert_eq!(repo.clear_failed(EntityFamily::Items).await.unwrap(), 1);
        assert_eq!(
            repo.status_counts(EntityFamily::Items).await.unwrap().total(),
            0
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_requeue_syncing_keeps_retries_and_order() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncQueueRepository::new(db.connection());

        let first = repo
            .enqueue(EntityFamily::Items, "a", SyncOperation::Create)
            .await
            .unwrap();
        let second = repo
            .enqueue(EntityFamily::Items, "b", SyncOperation::Update)
            .await
            .unwrap();
        repo.record_failure(
            EntityFamily::Items,
            first.id,
            1,
            QueueEntryStatus::Queued,
            "timeout",
        )
        .await
        .unwrap();
        repo.mark_syncing(EntityFamily::Items, first.id).await.unwrap();

        assert_eq!(repo.requeue_syncing(EntityFamily::Items).await.unwrap(), 1);
        assert_eq!(repo.requeue_syncing(EntityFamily::Prompts).await.unwrap(), 0);

        let queued = repo
            .list_by_status(EntityFamily::Items, QueueEntryStatus::Queued)
            .await
            .unwrap();
        assert_eq!(
            queued.iter().map(|entry| entry.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        assert_eq!(queued[0].retries, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_has_pending_delete() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlSyncQueueRepository::new(db.connection());

        repo.enqueue(EntityFamily::Items, "a", SyncOperation::Update)
            .await
            .unwrap();
        assert!(!repo
            .has_pending_delete(EntityFamily::Items, "a")
            .await
            .unwrap());

        let entry = repo
            .enqueue(EntityFamily::Items, "a", SyncOperation::Delete)
            .await
            .unwrap();
        assert!(repo
            .has_pending_delete(EntityFamily::Items, "a")
            .await
            .unwrap());

        repo.remove(EntityFamily::Items, entry.id).await.unwrap();
        assert!(!repo
            .has_pending_delete(EntityFamily::Items, "a")
            .await
            .unwrap());
    }
}

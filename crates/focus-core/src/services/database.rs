//! Shared database service wrapper used by the sync engine and the CLI.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, ItemRepository, LibSqlItemRepository, LibSqlMetadataRepository,
    LibSqlPromptRepository, LibSqlSettingsRepository, LibSqlSyncQueueRepository,
    MetadataRepository, PromptRepository, SettingsRepository, SyncQueueRepository,
};
use crate::models::{
    Category, EntityFamily, Item, ItemId, Project, Prompt, PromptId, QueueEntryStatus,
    QueueStatus, Settings, SyncOperation, SyncQueueEntry, Tag,
};
use crate::transform::MetadataSnapshot;
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    // Items

    /// List items, most recently updated first.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlItemRepository::new(db.connection());
        repo.list().await
    }

    /// Fetch an item by id.
    pub async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        let db = self.db.lock().await;
        let repo = LibSqlItemRepository::new(db.connection());
        repo.get(id).await
    }

    /// Store a new local item and queue its creation.
    pub async fn create_item(&self, mut item: Item) -> Result<Item> {
        item.touch();
        let db = self.db.lock().await;
        LibSqlItemRepository::new(db.connection())
            .insert(&item)
            .await?;
        LibSqlSyncQueueRepository::new(db.connection())
            .enqueue(EntityFamily::Items, item.id.as_str(), SyncOperation::Create)
            .await?;
        Ok(item)
    }

    /// Store a local edit and queue an update.
    pub async fn update_item(&self, mut item: Item) -> Result<Item> {
        item.touch();
        let db = self.db.lock().await;
        LibSqlItemRepository::new(db.connection())
            .replace(&item)
            .await?;
        LibSqlSyncQueueRepository::new(db.connection())
            .enqueue(EntityFamily::Items, item.id.as_str(), SyncOperation::Update)
            .await?;
        Ok(item)
    }

    /// Remove a local item and queue the remote delete.
    ///
    /// Returns `false` when no such item exists; nothing is queued then.
    pub async fn delete_item(&self, id: &ItemId) -> Result<bool> {
        let db = self.db.lock().await;
        let deleted = LibSqlItemRepository::new(db.connection()).delete(id).await?;
        if deleted {
            LibSqlSyncQueueRepository::new(db.connection())
                .enqueue(EntityFamily::Items, id.as_str(), SyncOperation::Delete)
                .await?;
        }
        Ok(deleted)
    }

    /// Insert an item received from the remote store (not queued).
    pub async fn insert_item(&self, item: &Item) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlItemRepository::new(db.connection()).insert(item).await
    }

    /// Overwrite an item with the remote version (not queued).
    pub async fn replace_item(&self, item: &Item) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlItemRepository::new(db.connection())
            .replace(item)
            .await
    }

    pub async fn mark_item_synced(&self, id: &ItemId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlItemRepository::new(db.connection())
            .mark_synced(id)
            .await
    }

    // Prompts

    /// List prompts, most recently updated first.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let db = self.db.lock().await;
        let repo = LibSqlPromptRepository::new(db.connection());
        repo.list().await
    }

    /// Fetch a prompt by id.
    pub async fn get_prompt(&self, id: &PromptId) -> Result<Option<Prompt>> {
        let db = self.db.lock().await;
        let repo = LibSqlPromptRepository::new(db.connection());
        repo.get(id).await
    }

    /// Store a new local prompt and queue its creation.
    pub async fn create_prompt(&self, mut prompt: Prompt) -> Result<Prompt> {
        prompt.touch();
        let db = self.db.lock().await;
        LibSqlPromptRepository::new(db.connection())
            .insert(&prompt)
            .await?;
        LibSqlSyncQueueRepository::new(db.connection())
            .enqueue(
                EntityFamily::Prompts,
                prompt.id.as_str(),
                SyncOperation::Create,
            )
            .await?;
        Ok(prompt)
    }

    /// Store a local prompt edit and queue an update.
    pub async fn update_prompt(&self, mut prompt: Prompt) -> Result<Prompt> {
        prompt.touch();
        let db = self.db.lock().await;
        LibSqlPromptRepository::new(db.connection())
            .replace(&prompt)
            .await?;
        LibSqlSyncQueueRepository::new(db.connection())
            .enqueue(
                EntityFamily::Prompts,
                prompt.id.as_str(),
                SyncOperation::Update,
            )
            .await?;
        Ok(prompt)
    }

    /// Remove a local prompt and queue the remote delete.
    pub async fn delete_prompt(&self, id: &PromptId) -> Result<bool> {
        let db = self.db.lock().await;
        let deleted = LibSqlPromptRepository::new(db.connection())
            .delete(id)
            .await?;
        if deleted {
            LibSqlSyncQueueRepository::new(db.connection())
                .enqueue(EntityFamily::Prompts, id.as_str(), SyncOperation::Delete)
                .await?;
        }
        Ok(deleted)
    }

    /// Insert a prompt received from the remote store (not queued).
    pub async fn insert_prompt(&self, prompt: &Prompt) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlPromptRepository::new(db.connection())
            .insert(prompt)
            .await
    }

    /// Overwrite a prompt with the remote version (not queued).
    pub async fn replace_prompt(&self, prompt: &Prompt) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlPromptRepository::new(db.connection())
            .replace(prompt)
            .await
    }

    pub async fn mark_prompt_synced(&self, id: &PromptId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlPromptRepository::new(db.connection())
            .mark_synced(id)
            .await
    }

    // Metadata

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .list_tags()
            .await
    }

    pub async fn create_tag(&self, tag: &Tag) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .create_tag(tag)
            .await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .list_categories()
            .await
    }

    pub async fn create_category(&self, category: &Category) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .create_category(category)
            .await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .list_projects()
            .await
    }

    pub async fn create_project(&self, project: &Project) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetadataRepository::new(db.connection())
            .create_project(project)
            .await
    }

    /// Snapshot of all tags, categories and projects.
    pub async fn load_metadata(&self) -> Result<MetadataSnapshot> {
        let db = self.db.lock().await;
        let repo = LibSqlMetadataRepository::new(db.connection());
        Ok(MetadataSnapshot {
            tags: repo.list_tags().await?,
            categories: repo.list_categories().await?,
            projects: repo.list_projects().await?,
        })
    }

    // Sync queue

    /// Queue an operation directly.
    pub async fn enqueue(
        &self,
        family: EntityFamily,
        entity_id: &str,
        operation: SyncOperation,
    ) -> Result<SyncQueueEntry> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .enqueue(family, entity_id, operation)
            .await
    }

    /// `queued` entries of a family in drain order.
    pub async fn queued_entries(&self, family: EntityFamily) -> Result<Vec<SyncQueueEntry>> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .list_by_status(family, QueueEntryStatus::Queued)
            .await
    }

    /// `failed` entries of a family, oldest first.
    pub async fn failed_entries(&self, family: EntityFamily) -> Result<Vec<SyncQueueEntry>> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .list_by_status(family, QueueEntryStatus::Failed)
            .await
    }

    pub async fn mark_entry_syncing(&self, family: EntityFamily, id: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .mark_syncing(family, id)
            .await
    }

    /// Requeue entries of a family stranded in `syncing`; returns how many.
    pub async fn requeue_stranded(&self, family: EntityFamily) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .requeue_syncing(family)
            .await
    }

    /// Drop an entry that was applied or turned out to be vacuous.
    pub async fn complete_entry(&self, family: EntityFamily, id: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .remove(family, id)
            .await
    }

    pub async fn record_entry_failure(
        &self,
        family: EntityFamily,
        id: i64,
        retries: u32,
        status: QueueEntryStatus,
        error: &str,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .record_failure(family, id, retries, status, error)
            .await
    }

    pub async fn has_pending_delete(&self, family: EntityFamily, entity_id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlSyncQueueRepository::new(db.connection())
            .has_pending_delete(family, entity_id)
            .await
    }

    /// Entry counts summed over both families.
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        let db = self.db.lock().await;
        let repo = LibSqlSyncQueueRepository::new(db.connection());
        let mut status = QueueStatus::default();
        for family in EntityFamily::ALL {
            status = status.combine(repo.status_counts(family).await?);
        }
        Ok(status)
    }

    /// Requeue failed entries of both families; returns how many.
    pub async fn reset_failed(&self) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlSyncQueueRepository::new(db.connection());
        let mut total = 0;
        for family in EntityFamily::ALL {
            total += repo.reset_failed(family).await?;
        }
        Ok(total)
    }

    /// Delete failed entries of both families; returns how many.
    pub async fn clear_failed(&self) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlSyncQueueRepository::new(db.connection());
        let mut total = 0;
        for family in EntityFamily::ALL {
            total += repo.clear_failed(family).await?;
        }
        Ok(total)
    }

    // Settings

    /// Load settings.
    pub async fn load_settings(&self) -> Result<Settings> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.load().await
    }

    /// Save settings.
    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.save(settings).await
    }

    /// Run raw SQL against the store, for tests that need to break it.
    #[cfg(test)]
    pub(crate) async fn execute_sql(&self, sql: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection().execute(sql, ()).await?;
        Ok(())
    }

    /// Persist the pull cursor of one family.
    pub async fn set_sync_cursor(&self, family: EntityFamily, timestamp_ms: i64) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        let mut settings = repo.load().await?;
        settings.set_cursor(family, timestamp_ms);
        repo.save(&settings).await
    }
}

//! Pull/push orchestration between the local store and the spreadsheet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::resolver::NameResolver;
use super::result::{SyncResult, SyncStatusReport};
use crate::error::Result;
use crate::models::{
    EntityFamily, Item, ItemId, ItemType, Prompt, PromptId, PromptType, QueueStatus,
    SyncOperation, SyncQueueEntry,
};
use crate::services::DatabaseService;
use crate::sheets::RemoteStore;
use crate::transform::{
    item_to_row, parse_item_row, parse_prompt_row, prompt_to_row, MetadataSnapshot, ParsedItem,
    ParsedPrompt, ResolvedLinks,
};
use crate::util::now_millis;

/// Releases the single-flight flag when a guarded operation ends
struct SyncGuard(Arc<AtomicBool>);

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// What applying one pulled row did
enum RowOutcome {
    Created,
    Updated,
    Skipped,
}

/// Sync engine for one local store and one remote
///
/// Clones share the same in-flight flag, so at most one guarded operation
/// runs at a time across all of them.
pub struct SyncService<R> {
    store: DatabaseService,
    remote: Arc<R>,
    syncing: Arc<AtomicBool>,
}

impl<R> Clone for SyncService<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
            syncing: Arc::clone(&self.syncing),
        }
    }
}

impl<R: RemoteStore> SyncService<R> {
    pub fn new(store: DatabaseService, remote: R) -> Self {
        Self {
            store,
            remote: Arc::new(remote),
            syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub const fn store(&self) -> &DatabaseService {
        &self.store
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<SyncGuard> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard(Arc::clone(&self.syncing)))
    }

    /// Pull one family from the remote, applying LWW per row.
    pub async fn pull(&self, family: EntityFamily, force_full: bool) -> SyncResult {
        let Some(_guard) = self.try_begin() else {
            return SyncResult::busy();
        };
        self.pull_phase(family, force_full).await
    }

    /// Drain one family's queue to the remote.
    pub async fn process_queue(&self, family: EntityFamily) -> SyncResult {
        let Some(_guard) = self.try_begin() else {
            return SyncResult::busy();
        };
        self.push_phase(family).await
    }

    /// Pull items, push items, pull prompts, push prompts.
    ///
    /// A failed items pull ends the cycle before anything is pushed.
    pub async fn full_sync(&self, force_full: bool) -> SyncResult {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("Sync requested while another cycle is running");
            return SyncResult::busy();
        };

        let pull_items = self.pull_phase(EntityFamily::Items, force_full).await;
        if !pull_items.success {
            return pull_items;
        }

        let push_items = self.push_phase(EntityFamily::Items).await;
        let pull_prompts = self.pull_phase(EntityFamily::Prompts, force_full).await;
        let push_prompts = self.push_phase(EntityFamily::Prompts).await;

        let result = pull_items
            .merge(push_items)
            .merge(pull_prompts)
            .merge(push_prompts);
        tracing::info!(
            "Sync finished: success={} created={} updated={} deleted={} errors={}",
            result.success,
            result.created,
            result.updated,
            result.deleted,
            result.errors.len()
        );
        result
    }

    pub async fn force_full_sync(&self) -> SyncResult {
        self.full_sync(true).await
    }

    /// Queue counts across both families.
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        self.store.queue_status().await
    }

    pub async fn status_report(&self) -> Result<SyncStatusReport> {
        let queue = self.queue_status().await?;
        Ok(SyncStatusReport::new(self.is_syncing(), queue))
    }

    /// Requeue every failed entry with a fresh retry budget.
    pub async fn retry_failed(&self) -> Result<u64> {
        let count = self.store.reset_failed().await?;
        tracing::info!("Requeued {count} failed sync entries");
        Ok(count)
    }

    /// Drop every failed entry.
    pub async fn clear_failed(&self) -> Result<u64> {
        let count = self.store.clear_failed().await?;
        tracing::info!("Cleared {count} failed sync entries");
        Ok(count)
    }

    pub async fn test_connection(&self) -> bool {
        self.remote.test_connection().await
    }

    async fn is_configured(&self) -> Result<bool> {
        Ok(self.store.load_settings().await?.is_sync_configured())
    }

    async fn pull_phase(&self, family: EntityFamily, force_full: bool) -> SyncResult {
        match self.try_pull(family, force_full).await {
            Ok(result) => result,
            Err(error) => {
                tracing::error!("Pull of {family} failed: {error}");
                SyncResult::failure(error.to_string())
            }
        }
    }

    async fn push_phase(&self, family: EntityFamily) -> SyncResult {
        match self.try_push(family).await {
            Ok(result) => result,
            Err(error) => {
                tracing::error!("Push of {family} failed: {error}");
                SyncResult::failure(error.to_string())
            }
        }
    }

    async fn try_pull(&self, family: EntityFamily, force_full: bool) -> Result<SyncResult> {
        let settings = self.store.load_settings().await?;
        if !settings.is_sync_configured() {
            tracing::info!("Sync not configured, skipping {family} pull");
            return Ok(SyncResult::ok());
        }

        let cursor = if force_full {
            None
        } else {
            settings.cursor(family)
        };

        let mut result = SyncResult::ok();
        match family {
            EntityFamily::Items => self.pull_items(cursor, &mut result).await?,
            EntityFamily::Prompts => self.pull_prompts(cursor, &mut result).await?,
        }

        self.store.set_sync_cursor(family, now_millis()).await?;
        Ok(result)
    }

    async fn pull_items(&self, cursor: Option<i64>, result: &mut SyncResult) -> Result<()> {
        let rows = match cursor {
            Some(since) => self.remote.get_modified_items_since(since).await?,
            None => self.remote.get_all_items().await?,
        };
        tracing::info!(
            "{} items pull fetched {} rows",
            if cursor.is_some() { "Delta" } else { "Full" },
            rows.len()
        );

        let mut metadata = self.store.load_metadata().await?;
        let mut local: HashMap<ItemId, Item> = self
            .store
            .list_items()
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let mut resolver = NameResolver::new(&self.store, &mut metadata);

        for row in rows {
            let parsed = match parse_item_row(&row) {
                Ok(parsed) => parsed,
                Err(error) => {
                    tracing::warn!("Skipping item row {:?}: {error}", row.row_index);
                    continue;
                }
            };

            let id = parsed.id.clone();
            match self.apply_item_row(parsed, &mut local, &mut resolver).await {
                Ok(RowOutcome::Created) => result.created += 1,
                Ok(RowOutcome::Updated) => result.updated += 1,
                Ok(RowOutcome::Skipped) => {}
                Err(error) => {
                    tracing::warn!("Could not apply pulled item {id}: {error}");
                    result.errors.push(format!("pull {id}: {error}"));
                }
            }
        }

        Ok(())
    }

    async fn apply_item_row(
        &self,
        parsed: ParsedItem,
        local: &mut HashMap<ItemId, Item>,
        resolver: &mut NameResolver<'_>,
    ) -> Result<RowOutcome> {
        let item_type: ItemType = parsed.item_type.parse()?;

        if self
            .store
            .has_pending_delete(EntityFamily::Items, parsed.id.as_str())
            .await?
        {
            tracing::debug!("Item {} is deleted locally, ignoring remote row", parsed.id);
            return Ok(RowOutcome::Skipped);
        }

        let existing = local.get(&parsed.id);
        if let Some(existing) = existing {
            if existing.updated_at > parsed.updated_at {
                tracing::debug!("Local item {} is newer, keeping it", parsed.id);
                return Ok(RowOutcome::Skipped);
            }
        }

        let links = ResolvedLinks {
            tags: resolver.resolve_tag_names(&parsed.tag_names).await?,
            category_id: resolver
                .resolve_category_name(parsed.category_name.as_deref())
                .await?,
            project_id: resolver
                .resolve_project_name(parsed.project_name.as_deref())
                .await?,
        };

        let is_new = existing.is_none();
        let item = parsed.into_item(item_type, links, existing);
        if is_new {
            self.store.insert_item(&item).await?;
        } else {
            self.store.replace_item(&item).await?;
        }
        local.insert(item.id.clone(), item);

        Ok(if is_new {
            RowOutcome::Created
        } else {
            RowOutcome::Updated
        })
    }

    async fn pull_prompts(&self, cursor: Option<i64>, result: &mut SyncResult) -> Result<()> {
        let rows = match cursor {
            Some(since) => self.remote.get_modified_prompts_since(since).await?,
            None => self.remote.get_all_prompts().await?,
        };
        tracing::info!(
            "{} prompts pull fetched {} rows",
            if cursor.is_some() { "Delta" } else { "Full" },
            rows.len()
        );

        let mut local: HashMap<PromptId, Prompt> = self
            .store
            .list_prompts()
            .await?
            .into_iter()
            .map(|prompt| (prompt.id.clone(), prompt))
            .collect();

        for row in rows {
            let parsed = match parse_prompt_row(&row) {
                Ok(parsed) => parsed,
                Err(error) => {
                    tracing::warn!("Skipping prompt row {:?}: {error}", row.row_index);
                    continue;
                }
            };

            let id = parsed.id.clone();
            match self.apply_prompt_row(parsed, &mut local).await {
                Ok(RowOutcome::Created) => result.created += 1,
                Ok(RowOutcome::Updated) => result.updated += 1,
                Ok(RowOutcome::Skipped) => {}
                Err(error) => {
                    tracing::warn!("Could not apply pulled prompt {id}: {error}");
                    result.errors.push(format!("pull {id}: {error}"));
                }
            }
        }

        Ok(())
    }

    async fn apply_prompt_row(
        &self,
        parsed: ParsedPrompt,
        local: &mut HashMap<PromptId, Prompt>,
    ) -> Result<RowOutcome> {
        let prompt_type: PromptType = parsed.prompt_type.parse()?;

        if self
            .store
            .has_pending_delete(EntityFamily::Prompts, parsed.id.as_str())
            .await?
        {
            tracing::debug!("Prompt {} is deleted locally, ignoring remote row", parsed.id);
            return Ok(RowOutcome::Skipped);
        }

        let existing = local.get(&parsed.id);
        if let Some(existing) = existing {
            if existing.updated_at > parsed.updated_at {
                tracing::debug!("Local prompt {} is newer, keeping it", parsed.id);
                return Ok(RowOutcome::Skipped);
            }
        }

        let is_new = existing.is_none();
        let prompt = parsed.into_prompt(prompt_type, existing);
        if is_new {
            self.store.insert_prompt(&prompt).await?;
        } else {
            self.store.replace_prompt(&prompt).await?;
        }
        local.insert(prompt.id.clone(), prompt);

        Ok(if is_new {
            RowOutcome::Created
        } else {
            RowOutcome::Updated
        })
    }

    async fn try_push(&self, family: EntityFamily) -> Result<SyncResult> {
        if !self.is_configured().await? {
            tracing::info!("Sync not configured, skipping {family} queue");
            return Ok(SyncResult::ok());
        }

        // Only a drain holding the guard marks entries `syncing`, so any left
        // over were stranded by an interrupted cycle.
        let stranded = self.store.requeue_stranded(family).await?;
        if stranded > 0 {
            tracing::warn!("Requeued {stranded} {family} entries left in flight");
        }

        let metadata = match family {
            EntityFamily::Items => self.store.load_metadata().await?,
            EntityFamily::Prompts => MetadataSnapshot::default(),
        };
        let entries = self.store.queued_entries(family).await?;
        tracing::info!("Processing {} queued {family}", entries.len());

        let mut result = SyncResult::ok();
        for entry in entries {
            if let Err(error) = self.push_entry(family, &entry, &metadata, &mut result).await {
                let retries = entry.retries.saturating_add(1);
                let status = SyncQueueEntry::status_after_failure(retries);
                let message = error.to_string();
                tracing::warn!(
                    "{} {} failed (attempt {retries}, now {}): {message}",
                    entry.operation,
                    entry.entity_id,
                    status.as_str()
                );
                self.store
                    .record_entry_failure(family, entry.id, retries, status, &message)
                    .await?;
                result
                    .errors
                    .push(format!("{} {}: {message}", entry.operation, entry.entity_id));
            }
        }

        Ok(result)
    }

    async fn push_entry(
        &self,
        family: EntityFamily,
        entry: &SyncQueueEntry,
        metadata: &MetadataSnapshot,
        result: &mut SyncResult,
    ) -> Result<()> {
        self.store.mark_entry_syncing(family, entry.id).await?;

        let applied = match family {
            EntityFamily::Items => self.push_item(entry, metadata).await?,
            EntityFamily::Prompts => self.push_prompt(entry).await?,
        };

        match applied {
            Some(SyncOperation::Create) => result.created += 1,
            Some(SyncOperation::Update) => result.updated += 1,
            Some(SyncOperation::Delete) => result.deleted += 1,
            None => tracing::debug!(
                "{} {} targets a record that no longer exists, dropping",
                entry.operation,
                entry.entity_id
            ),
        }

        self.store.complete_entry(family, entry.id).await
    }

    /// Returns the applied operation, or `None` when the entry was vacuous
    async fn push_item(
        &self,
        entry: &SyncQueueEntry,
        metadata: &MetadataSnapshot,
    ) -> Result<Option<SyncOperation>> {
        let id = ItemId::from(entry.entity_id.as_str());

        if entry.operation == SyncOperation::Delete {
            self.remote.delete_item(id.as_str()).await?;
            return Ok(Some(SyncOperation::Delete));
        }

        let Some(item) = self.store.get_item(&id).await? else {
            return Ok(None);
        };

        let row = item_to_row(&item, metadata);
        if entry.operation == SyncOperation::Create {
            self.remote.create_item(row).await?;
        } else {
            self.remote.update_item(row).await?;
        }
        if let Err(error) = self.store.mark_item_synced(&id).await {
            tracing::warn!("Pushed item {id} but could not mark it synced: {error}");
        }
        Ok(Some(entry.operation))
    }

    async fn push_prompt(&self, entry: &SyncQueueEntry) -> Result<Option<SyncOperation>> {
        let id = PromptId::from(entry.entity_id.as_str());

        if entry.operation == SyncOperation::Delete {
            self.remote.delete_prompt(id.as_str()).await?;
            return Ok(Some(SyncOperation::Delete));
        }

        let Some(prompt) = self.store.get_prompt(&id).await? else {
            return Ok(None);
        };

        let row = prompt_to_row(&prompt);
        if entry.operation == SyncOperation::Create {
            self.remote.create_prompt(row).await?;
        } else {
            self.remote.update_prompt(row).await?;
        }
        if let Err(error) = self.store.mark_prompt_synced(&id).await {
            tracing::warn!("Pushed prompt {id} but could not mark it synced: {error}");
        }
        Ok(Some(entry.operation))
    }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use super::*;
use crate::models::{
    EntityFamily, Item, ItemId, ItemType, Prompt, PromptId, QueueEntryStatus, Settings,
    SyncOperation, SyncStatus, Tag,
};
use crate::services::DatabaseService;
use crate::sheets::{
    BatchOperation, BatchOutcome, DeleteAck, ItemRow, PromptRow, RemoteStore, SheetsError,
    SheetsResult, WriteAck,
};
use crate::transform::format_timestamp;

#[derive(Default)]
struct FakeState {
    items: Vec<ItemRow>,
    prompts: Vec<PromptRow>,
    calls: Vec<String>,
    fail_pull: bool,
    fail_writes: bool,
    stall_writes: bool,
}

/// In-memory remote that records every call
#[derive(Clone, Default)]
struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeRemote {
    fn with_items(items: Vec<ItemRow>) -> Self {
        let remote = Self::default();
        remote.state.lock().unwrap().items = items;
        remote
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    fn pull_error(&self) -> SheetsResult<()> {
        if self.state.lock().unwrap().fail_pull {
            return Err(SheetsError::Api {
                status: 500,
                message: "sheet unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn write_error(&self) -> SheetsResult<()> {
        if self.state.lock().unwrap().fail_writes {
            return Err(SheetsError::Api {
                status: 500,
                message: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }

    /// Never returns once `stall_writes` is set, after signalling the gate
    async fn stall_if_requested(&self) {
        let stall = self.state.lock().unwrap().stall_writes;
        if stall {
            if let Some((entered, _)) = &self.gate {
                entered.notify_one();
            }
            std::future::pending::<()>().await;
        }
    }

    async fn wait_at_gate(&self) {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
    }
}

impl RemoteStore for FakeRemote {
    async fn get_all_items(&self) -> SheetsResult<Vec<ItemRow>> {
        self.record("get_all_items");
        self.wait_at_gate().await;
        self.pull_error()?;
        Ok(self.state.lock().unwrap().items.clone())
    }

    async fn get_modified_items_since(&self, since_ms: i64) -> SheetsResult<Vec<ItemRow>> {
        self.record(format!("get_modified_items_since {since_ms}"));
        self.pull_error()?;
        Ok(self.state.lock().unwrap().items.clone())
    }

    async fn create_item(&self, row: ItemRow) -> SheetsResult<WriteAck> {
        self.record(format!("create_item {}", row.id));
        self.stall_if_requested().await;
        self.write_error()?;
        Ok(WriteAck {
            id: row.id,
            row_index: Some(2),
        })
    }

    async fn update_item(&self, row: ItemRow) -> SheetsResult<WriteAck> {
        self.record(format!("update_item {}", row.id));
        self.write_error()?;
        Ok(WriteAck {
            id: row.id,
            row_index: Some(2),
        })
    }

    async fn delete_item(&self, id: &str) -> SheetsResult<DeleteAck> {
        self.record(format!("delete_item {id}"));
        self.write_error()?;
        Ok(DeleteAck {
            id: id.to_string(),
            deleted: true,
        })
    }

    async fn get_all_prompts(&self) -> SheetsResult<Vec<PromptRow>> {
        self.record("get_all_prompts");
        Ok(self.state.lock().unwrap().prompts.clone())
    }

    async fn get_modified_prompts_since(&self, since_ms: i64) -> SheetsResult<Vec<PromptRow>> {
        self.record(format!("get_modified_prompts_since {since_ms}"));
        Ok(self.state.lock().unwrap().prompts.clone())
    }

    async fn create_prompt(&self, row: PromptRow) -> SheetsResult<WriteAck> {
        self.record(format!("create_prompt {}", row.id));
        self.write_error()?;
        Ok(WriteAck {
            id: row.id,
            row_index: None,
        })
    }

    async fn update_prompt(&self, row: PromptRow) -> SheetsResult<WriteAck> {
        self.record(format!("update_prompt {}", row.id));
        self.write_error()?;
        Ok(WriteAck {
            id: row.id,
            row_index: None,
        })
    }

    async fn delete_prompt(&self, id: &str) -> SheetsResult<DeleteAck> {
        self.record(format!("delete_prompt {id}"));
        self.write_error()?;
        Ok(DeleteAck {
            id: id.to_string(),
            deleted: true,
        })
    }

    async fn batch(&self, operations: Vec<BatchOperation>) -> SheetsResult<Vec<BatchOutcome>> {
        self.record(format!("batch {}", operations.len()));
        Ok(Vec::new())
    }

    async fn test_connection(&self) -> bool {
        self.record("test_connection");
        true
    }
}

async fn configured_store() -> DatabaseService {
    let store = DatabaseService::open_in_memory().await.unwrap();
    let settings = Settings {
        remote_endpoint_url: Some("https://script.example/exec".to_string()),
        remote_secret: Some("s3cret".to_string()),
        ..Settings::default()
    };
    store.save_settings(&settings).await.unwrap();
    store
}

fn item_row(id: &str, title: &str, updated_at: i64) -> ItemRow {
    ItemRow {
        id: id.to_string(),
        item_type: "task".to_string(),
        title: title.to_string(),
        updated_at: format_timestamp(updated_at),
        ..ItemRow::default()
    }
}

fn prompt_row(id: &str, title: &str, updated_at: i64) -> PromptRow {
    PromptRow {
        id: id.to_string(),
        title: title.to_string(),
        prompt: "remote text".to_string(),
        prompt_type: "text".to_string(),
        updated_at: format_timestamp(updated_at),
        ..PromptRow::default()
    }
}

/// Store a prompt with a local attachment as if it had been pulled earlier
async fn seed_prompt(store: &DatabaseService, id: &str, title: &str, updated_at: i64) -> Prompt {
    let mut prompt = Prompt::new(title, "local text");
    prompt.id = PromptId::from(id);
    prompt.file_demo = Some("demo/portrait.png".to_string());
    prompt.created_at = 500;
    prompt.updated_at = updated_at;
    prompt.sync_status = SyncStatus::Synced;
    store.insert_prompt(&prompt).await.unwrap();
    prompt
}

/// Store an item as if it had been pulled earlier (nothing queued)
async fn seed_item(store: &DatabaseService, id: &str, title: &str, updated_at: i64) -> Item {
    let mut item = Item::new(ItemType::Task, title);
    item.id = ItemId::from(id);
    item.updated_at = updated_at;
    item.sync_status = SyncStatus::Synced;
    store.insert_item(&item).await.unwrap();
    item
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_creates_missing_items_and_resolves_names() {
    let store = configured_store().await;
    let mut row = item_row("a1", "Buy milk", 1_700_000_000_000);
    row.tags = "errand,Errand,home".to_string();
    row.category = "Chores".to_string();
    row.project = "House".to_string();
    let remote = FakeRemote::with_items(vec![row]);
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.pull(EntityFamily::Items, false).await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.created, 1);
    let item = store.get_item(&ItemId::from("a1")).await.unwrap().unwrap();
    assert_eq!(item.title, "Buy milk");
    assert_eq!(item.tags.len(), 2);
    assert_eq!(item.sync_status, SyncStatus::Synced);
    assert!(item.category_id.is_some());
    assert!(item.project_id.is_some());
    assert_eq!(store.list_tags().await.unwrap().len(), 2);
    assert_eq!(remote.calls(), vec!["get_all_items".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_keeps_newer_local_rows() {
    let store = configured_store().await;
    seed_item(&store, "a1", "local edit", 2_000).await;
    let before = store.get_item(&ItemId::from("a1")).await.unwrap().unwrap();
    let mut stale = item_row("a1", "stale remote", 1_000);
    stale.tags = "remote-only".to_string();
    stale.category = "Elsewhere".to_string();
    let remote = FakeRemote::with_items(vec![stale]);
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Items, false).await;

    assert!(result.success);
    assert_eq!(result.updated, 0);
    let after = store.get_item(&ItemId::from("a1")).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert!(store.list_tags().await.unwrap().is_empty());
    assert!(store.list_categories().await.unwrap().is_empty());
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_applies_newer_or_equal_remote_rows() {
    let store = configured_store().await;
    seed_item(&store, "a1", "old", 1_000).await;
    seed_item(&store, "a2", "tied", 5_000).await;
    let remote = FakeRemote::with_items(vec![
        item_row("a1", "newer remote", 2_000),
        item_row("a2", "tie goes remote", 5_000),
    ]);
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Items, false).await;

    assert_eq!(result.updated, 2);
    let a1 = store.get_item(&ItemId::from("a1")).await.unwrap().unwrap();
    let a2 = store.get_item(&ItemId::from("a2")).await.unwrap().unwrap();
    assert_eq!(a1.title, "newer remote");
    assert_eq!(a1.updated_at, 2_000);
    assert_eq!(a2.title, "tie goes remote");
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_skips_bad_rows_and_reports_unknown_types() {
    let store = configured_store().await;
    let mut unknown = item_row("a2", "recipe", 1_000);
    unknown.item_type = "recipe".to_string();
    let remote = FakeRemote::with_items(vec![
        item_row("", "no id", 1_000),
        unknown,
        item_row("a3", "fine", 1_000),
    ]);
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Items, false).await;

    assert!(result.success);
    assert_eq!(result.created, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("pull a2:"));
    assert_eq!(store.list_items().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_does_not_resurrect_locally_deleted_items() {
    let store = configured_store().await;
    seed_item(&store, "a1", "gone soon", 1_000).await;
    assert!(store.delete_item(&ItemId::from("a1")).await.unwrap());
    let remote = FakeRemote::with_items(vec![item_row("a1", "still on sheet", 9_000)]);
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Items, false).await;

    assert!(result.success);
    assert_eq!(result.created, 0);
    assert!(store.get_item(&ItemId::from("a1")).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_pull_applies_lww_and_keeps_local_fields() {
    let store = configured_store().await;
    seed_prompt(&store, "p1", "local edit", 2_000).await;
    seed_prompt(&store, "p2", "old", 1_000).await;
    seed_prompt(&store, "p3", "tied", 3_000).await;
    let kept = store.get_prompt(&PromptId::from("p1")).await.unwrap().unwrap();
    let remote = FakeRemote::default();
    remote.state.lock().unwrap().prompts = vec![
        prompt_row("p1", "stale remote", 1_000),
        prompt_row("p2", "newer remote", 2_000),
        prompt_row("p3", "tie goes remote", 3_000),
    ];
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Prompts, false).await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.created, 0);
    assert_eq!(result.updated, 2);
    assert_eq!(
        store.get_prompt(&PromptId::from("p1")).await.unwrap().unwrap(),
        kept
    );
    for (id, title, updated_at) in [("p2", "newer remote", 2_000), ("p3", "tie goes remote", 3_000)] {
        let prompt = store.get_prompt(&PromptId::from(id)).await.unwrap().unwrap();
        assert_eq!(prompt.title, title);
        assert_eq!(prompt.prompt, "remote text");
        assert_eq!(prompt.updated_at, updated_at);
        assert_eq!(prompt.created_at, 500);
        assert_eq!(prompt.file_demo.as_deref(), Some("demo/portrait.png"));
        assert_eq!(prompt.sync_status, SyncStatus::Synced);
    }
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_pull_does_not_resurrect_locally_deleted_prompts() {
    let store = configured_store().await;
    seed_prompt(&store, "p1", "gone soon", 1_000).await;
    assert!(store.delete_prompt(&PromptId::from("p1")).await.unwrap());
    let remote = FakeRemote::default();
    remote.state.lock().unwrap().prompts = vec![prompt_row("p1", "still on sheet", 9_000)];
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Prompts, false).await;

    assert!(result.success);
    assert_eq!(result.created, 0);
    assert!(store
        .get_prompt(&PromptId::from("p1"))
        .await
        .unwrap()
        .is_none());
    assert!(store
        .has_pending_delete(EntityFamily::Prompts, "p1")
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_uses_cursor_unless_forced_and_advances_it() {
    let store = configured_store().await;
    store
        .set_sync_cursor(EntityFamily::Items, 1_700_000_000_000)
        .await
        .unwrap();
    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());

    service.pull(EntityFamily::Items, false).await;
    service.pull(EntityFamily::Items, true).await;

    let calls = remote.calls();
    assert_eq!(calls[0], "get_modified_items_since 1700000000000");
    assert_eq!(calls[1], "get_all_items");
    let settings = store.load_settings().await.unwrap();
    assert!(settings.last_sync_at_items.unwrap() > 1_700_000_000_000);
    assert_eq!(settings.last_sync_at_prompts, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_pull_keeps_cursor() {
    let store = configured_store().await;
    let remote = FakeRemote::default();
    remote.state.lock().unwrap().fail_pull = true;
    let service = SyncService::new(store.clone(), remote);

    let result = service.pull(EntityFamily::Items, false).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["sheet unavailable (500)".to_string()]);
    let settings = store.load_settings().await.unwrap();
    assert_eq!(settings.last_sync_at_items, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn process_queue_drains_in_order() {
    let store = configured_store().await;
    let first = store
        .create_item(Item::new(ItemType::Task, "first"))
        .await
        .unwrap();
    let mut second = store
        .create_item(Item::new(ItemType::Note, "second"))
        .await
        .unwrap();
    second.title = "second, edited".to_string();
    let second = store.update_item(second).await.unwrap();
    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.process_queue(EntityFamily::Items).await;

    assert!(result.success);
    assert_eq!(result.created, 2);
    assert_eq!(result.updated, 1);
    assert_eq!(
        remote.calls(),
        vec![
            format!("create_item {}", first.id),
            format!("create_item {}", second.id),
            format!("update_item {}", second.id),
        ]
    );
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
    let stored = store.get_item(&first.id).await.unwrap().unwrap();
    assert_eq!(stored.sync_status, SyncStatus::Synced);
}

#[tokio::test(flavor = "multi_thread")]
async fn deletes_are_pushed_and_vacuous_entries_dropped() {
    let store = configured_store().await;
    let item = store
        .create_item(Item::new(ItemType::Task, "short lived"))
        .await
        .unwrap();
    store.delete_item(&item.id).await.unwrap();
    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.process_queue(EntityFamily::Items).await;

    assert!(result.success);
    assert_eq!(result.created, 0);
    assert_eq!(result.deleted, 1);
    assert_eq!(remote.calls(), vec![format!("delete_item {}", item.id)]);
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_pushes_retry_then_park() {
    let store = configured_store().await;
    let item = store
        .create_item(Item::new(ItemType::Task, "stubborn"))
        .await
        .unwrap();
    let remote = FakeRemote::default();
    remote.set_fail_writes(true);
    let service = SyncService::new(store.clone(), remote.clone());

    for attempt in 1..=3 {
        let result = service.process_queue(EntityFamily::Items).await;
        assert!(result.success);
        assert_eq!(
            result.errors,
            vec![format!("create {}: quota exceeded (500)", item.id)]
        );
        let status = store.queue_status().await.unwrap();
        if attempt < 3 {
            assert_eq!(status.queued, 1);
        } else {
            assert_eq!(status.failed, 1);
        }
    }

    let failed = store.failed_entries(EntityFamily::Items).await.unwrap();
    assert_eq!(failed[0].retries, 3);
    assert_eq!(failed[0].status, QueueEntryStatus::Failed);
    assert_eq!(failed[0].last_error.as_deref(), Some("quota exceeded (500)"));

    // Parked entries are not retried automatically
    let idle = service.process_queue(EntityFamily::Items).await;
    assert!(idle.errors.is_empty());
    assert_eq!(remote.calls().len(), 3);

    remote.set_fail_writes(false);
    assert_eq!(service.retry_failed().await.unwrap(), 1);
    let result = service.process_queue(EntityFamily::Items).await;
    assert_eq!(result.created, 1);
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn interrupted_drain_is_resumed_by_next_cycle() {
    let store = configured_store().await;
    let item = store
        .create_item(Item::new(ItemType::Task, "in flight"))
        .await
        .unwrap();
    let entered = Arc::new(Notify::new());
    let stalled = FakeRemote {
        gate: Some((Arc::clone(&entered), Arc::new(Notify::new()))),
        ..FakeRemote::default()
    };
    stalled.state.lock().unwrap().stall_writes = true;
    let stalled_service = SyncService::new(store.clone(), stalled);

    let running = tokio::spawn({
        let service = stalled_service.clone();
        async move { service.process_queue(EntityFamily::Items).await }
    });
    entered.notified().await;
    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());
    assert_eq!(store.queue_status().await.unwrap().syncing, 1);
    assert!(!stalled_service.is_syncing());

    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());
    let result = service.full_sync(false).await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.created, 1);
    assert_eq!(
        remote.calls(),
        vec![
            "get_all_items".to_string(),
            format!("create_item {}", item.id),
            "get_all_prompts".to_string(),
        ]
    );
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn pushed_entry_completes_when_local_status_write_fails() {
    let store = configured_store().await;
    let item = store
        .create_item(Item::new(ItemType::Task, "pushed once"))
        .await
        .unwrap();
    store
        .execute_sql(
            "CREATE TRIGGER items_status_locked BEFORE UPDATE OF sync_status ON items \
             BEGIN SELECT RAISE(ABORT, 'sync_status is locked'); END",
        )
        .await
        .unwrap();
    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.process_queue(EntityFamily::Items).await;
    let again = service.process_queue(EntityFamily::Items).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.created, 1);
    assert_eq!(again.created, 0);
    assert_eq!(remote.calls(), vec![format!("create_item {}", item.id)]);
    assert_eq!(store.queue_status().await.unwrap().total(), 0);
    let stored = store.get_item(&item.id).await.unwrap().unwrap();
    assert_eq!(stored.sync_status, SyncStatus::Pending);
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_failed_drops_parked_entries() {
    let store = configured_store().await;
    let entry = store
        .enqueue(EntityFamily::Prompts, "p1", SyncOperation::Update)
        .await
        .unwrap();
    store
        .record_entry_failure(
            EntityFamily::Prompts,
            entry.id,
            3,
            QueueEntryStatus::Failed,
            "boom",
        )
        .await
        .unwrap();
    let service = SyncService::new(store.clone(), FakeRemote::default());

    assert_eq!(service.status_report().await.unwrap().failed, 1);
    assert_eq!(service.clear_failed().await.unwrap(), 1);
    assert_eq!(service.queue_status().await.unwrap().total(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_sync_touches_nothing() {
    let store = DatabaseService::open_in_memory().await.unwrap();
    store
        .create_item(Item::new(ItemType::Task, "offline"))
        .await
        .unwrap();
    let remote = FakeRemote::default();
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.full_sync(false).await;

    assert_eq!(result, SyncResult::ok());
    assert!(remote.calls().is_empty());
    assert_eq!(store.queue_status().await.unwrap().queued, 1);
    assert_eq!(store.load_settings().await.unwrap().last_sync_at_items, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn full_sync_runs_both_families() {
    let store = configured_store().await;
    let prompt = store
        .create_prompt(Prompt::new("Haiku", "write a haiku"))
        .await
        .unwrap();
    let remote = FakeRemote::with_items(vec![item_row("a1", "from sheet", 1_000)]);
    remote.state.lock().unwrap().prompts = vec![PromptRow {
        id: "p-remote".to_string(),
        title: "Remote prompt".to_string(),
        prompt_type: "image".to_string(),
        ..PromptRow::default()
    }];
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.full_sync(false).await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.created, 3);
    assert_eq!(
        remote.calls(),
        vec![
            "get_all_items".to_string(),
            "get_all_prompts".to_string(),
            format!("create_prompt {}", prompt.id),
        ]
    );
    let pulled = store
        .get_prompt(&PromptId::from("p-remote"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pulled.title, "Remote prompt");
    assert!(!service.is_syncing());
}

#[tokio::test(flavor = "multi_thread")]
async fn full_sync_stops_when_items_pull_fails() {
    let store = configured_store().await;
    store
        .create_item(Item::new(ItemType::Task, "waiting"))
        .await
        .unwrap();
    let remote = FakeRemote::default();
    remote.state.lock().unwrap().fail_pull = true;
    let service = SyncService::new(store.clone(), remote.clone());

    let result = service.full_sync(false).await;

    assert!(!result.success);
    assert_eq!(remote.calls(), vec!["get_all_items".to_string()]);
    assert_eq!(store.queue_status().await.unwrap().queued, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_cycles_are_rejected() {
    let store = configured_store().await;
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let remote = FakeRemote {
        gate: Some((Arc::clone(&entered), Arc::clone(&release))),
        ..FakeRemote::default()
    };
    let service = SyncService::new(store, remote);

    let running = tokio::spawn({
        let service = service.clone();
        async move { service.full_sync(true).await }
    });
    entered.notified().await;

    assert!(service.is_syncing());
    let busy = service.full_sync(false).await;
    assert_eq!(busy, SyncResult::busy());
    let busy_pull = service.pull(EntityFamily::Prompts, false).await;
    assert_eq!(busy_pull.errors, vec![SYNC_IN_PROGRESS.to_string()]);

    release.notify_one();
    let first = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();
    assert!(first.success);
    assert!(!service.is_syncing());
}

#[tokio::test(flavor = "multi_thread")]
async fn pulled_tags_are_reused_across_rows() {
    let store = configured_store().await;
    let existing = Tag::new("Work", "#000000");
    store.create_tag(&existing).await.unwrap();
    let mut first = item_row("a1", "one", 1_000);
    first.tags = "work".to_string();
    let mut second = item_row("a2", "two", 1_000);
    second.tags = "WORK,Later".to_string();
    let mut third = item_row("a3", "three", 1_000);
    third.tags = "later".to_string();
    let service = SyncService::new(
        store.clone(),
        FakeRemote::with_items(vec![first, second, third]),
    );

    service.pull(EntityFamily::Items, false).await;

    let tags = store.list_tags().await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "Work");
    assert_eq!(tags[1].name, "Later");
    let a3 = store.get_item(&ItemId::from("a3")).await.unwrap().unwrap();
    assert_eq!(a3.tags, vec![tags[1].id.clone()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_delegates_to_remote() {
    let remote = FakeRemote::default();
    let service = SyncService::new(configured_store().await, remote.clone());

    assert!(service.test_connection().await);
    assert_eq!(remote.calls(), vec!["test_connection".to_string()]);
}

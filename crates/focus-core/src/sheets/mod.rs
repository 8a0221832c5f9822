//! Remote store backed by a Google Sheets Apps Script web app.

mod client;
mod error;
mod wire;

use std::future::Future;

pub use client::SheetsClient;
pub use error::{SheetsError, SheetsResult};
pub use wire::{
    BatchOperation, BatchOutcome, ConnectionCheck, DeleteAck, ItemRow, PromptRow, WriteAck,
};

/// Operations the sync engine needs from the remote store
///
/// Futures are `Send` so a sync cycle can run on a spawned task.
pub trait RemoteStore: Send + Sync {
    fn get_all_items(&self) -> impl Future<Output = SheetsResult<Vec<ItemRow>>> + Send;

    fn get_modified_items_since(
        &self,
        since_ms: i64,
    ) -> impl Future<Output = SheetsResult<Vec<ItemRow>>> + Send;

    fn create_item(&self, row: ItemRow) -> impl Future<Output = SheetsResult<WriteAck>> + Send;

    fn update_item(&self, row: ItemRow) -> impl Future<Output = SheetsResult<WriteAck>> + Send;

    fn delete_item(&self, id: &str) -> impl Future<Output = SheetsResult<DeleteAck>> + Send;

    fn get_all_prompts(&self) -> impl Future<Output = SheetsResult<Vec<PromptRow>>> + Send;

    fn get_modified_prompts_since(
        &self,
        since_ms: i64,
    ) -> impl Future<Output = SheetsResult<Vec<PromptRow>>> + Send;

    fn create_prompt(&self, row: PromptRow)
        -> impl Future<Output = SheetsResult<WriteAck>> + Send;

    fn update_prompt(&self, row: PromptRow)
        -> impl Future<Output = SheetsResult<WriteAck>> + Send;

    fn delete_prompt(&self, id: &str) -> impl Future<Output = SheetsResult<DeleteAck>> + Send;

    fn batch(
        &self,
        operations: Vec<BatchOperation>,
    ) -> impl Future<Output = SheetsResult<Vec<BatchOutcome>>> + Send;

    /// Never fails; any error reads as `false`
    fn test_connection(&self) -> impl Future<Output = bool> + Send;
}

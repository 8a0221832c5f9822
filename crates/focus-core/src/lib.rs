//! focus-core - Core library for Focus
//!
//! Models, the local libSQL store with its sync outbox, the Google Sheets
//! remote client, record transformers and the sync engine shared by the
//! Focus interfaces.

pub mod background;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sheets;
pub mod sync;
pub mod transform;
pub mod util;

pub use background::{spawn_sync_worker, SyncEvent, SyncHandle};
pub use error::{Error, Result};
pub use models::{Item, ItemId, Prompt, PromptId, Settings};
pub use services::DatabaseService;
pub use sheets::{RemoteStore, SheetsClient};
pub use sync::{SyncResult, SyncService, SyncStatusReport};

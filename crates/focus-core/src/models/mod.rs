//! Data models for Focus

mod ids;
mod item;
mod metadata;
mod prompt;
mod settings;
mod sync_queue;

pub use ids::{CategoryId, ItemId, ProjectId, PromptId, TagId};
pub use item::{Item, ItemType, Priority};
pub use metadata::{names_match, Category, Project, Tag};
pub use prompt::{Prompt, PromptType, QualityRating};
pub use settings::{SheetsCredentials, Settings, DEFAULT_AUTO_SYNC_INTERVAL_MINUTES};
pub use sync_queue::{
    EntityFamily, QueueEntryStatus, QueueStatus, SyncOperation, SyncQueueEntry, SyncStatus,
    MAX_SYNC_RETRIES,
};

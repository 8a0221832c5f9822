//! Bidirectional sync between the local store and the spreadsheet.
//!
//! A cycle pulls remote rows (last-writer-wins on `updated_at`), then drains
//! the local outbox. Items and prompts each have their own queue and cursor.

mod orchestrator;
mod resolver;
mod result;

#[cfg(test)]
mod tests;

pub use orchestrator::SyncService;
pub use resolver::{
    NameResolver, DEFAULT_CATEGORY_ICON, DEFAULT_PROJECT_COLORS, DEFAULT_TAG_COLORS,
};
pub use result::{SyncResult, SyncStatusReport, SYNC_IN_PROGRESS};

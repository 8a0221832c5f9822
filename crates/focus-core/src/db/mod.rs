//! Database layer for Focus

mod connection;
mod item_repository;
mod metadata_repository;
mod migrations;
mod prompt_repository;
mod queue_repository;
mod settings_repository;

pub use connection::Database;
pub use item_repository::{ItemRepository, LibSqlItemRepository};
pub use metadata_repository::{LibSqlMetadataRepository, MetadataRepository};
pub use prompt_repository::{LibSqlPromptRepository, PromptRepository};
pub use queue_repository::{LibSqlSyncQueueRepository, SyncQueueRepository};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};

use crate::error::{Error, Result};
use libsql::{Row, Value};

/// Read a nullable text column
pub(crate) fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "expected text in column {idx}, found {other:?}"
        ))),
    }
}

/// Read a nullable integer column
pub(crate) fn optional_integer(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(Error::Database(format!(
            "expected integer in column {idx}, found {other:?}"
        ))),
    }
}

/// Bind an optional string, mapping `None` to SQL NULL
pub(crate) fn nullable(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

/// Bind a boolean as 0/1
pub(crate) fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

//! Wire shapes of the spreadsheet web app
//!
//! Rows keep every cell as text. Spreadsheet cells are user-editable, so a
//! column meant to hold text may arrive as a number, a boolean or nothing at
//! all; the lenient deserializers below normalize those to strings and leave
//! interpretation to the transformers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One row of the `Items` sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    #[serde(rename = "ID", default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient_text")]
    pub item_type: String,
    #[serde(rename = "Title", default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "Content", default, deserialize_with = "lenient_text")]
    pub content: String,
    #[serde(rename = "URL", default, deserialize_with = "lenient_text")]
    pub url: String,
    #[serde(rename = "Priority", default, deserialize_with = "lenient_text")]
    pub priority: String,
    #[serde(rename = "Deadline", default, deserialize_with = "lenient_text")]
    pub deadline: String,
    #[serde(rename = "Completed", default, deserialize_with = "lenient_text")]
    pub completed: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient_text")]
    pub tags: String,
    #[serde(rename = "Category", default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(rename = "Project", default, deserialize_with = "lenient_text")]
    pub project: String,
    #[serde(rename = "UpdatedAt", default, deserialize_with = "lenient_text")]
    pub updated_at: String,
    /// Sheet row number reported by the server
    #[serde(
        rename = "_rowIndex",
        default,
        deserialize_with = "lenient_row_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_index: Option<i64>,
    /// Columns this client does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One row of the `Prompts` sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptRow {
    #[serde(rename = "ID", default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "Title", default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(rename = "Prompt", default, deserialize_with = "lenient_text")]
    pub prompt: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient_text")]
    pub prompt_type: String,
    #[serde(rename = "Category", default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(rename = "Tags", default, deserialize_with = "lenient_text")]
    pub tags: String,
    #[serde(rename = "Note", default, deserialize_with = "lenient_text")]
    pub note: String,
    #[serde(rename = "Approved", default, deserialize_with = "lenient_text")]
    pub approved: String,
    #[serde(rename = "Favorite", default, deserialize_with = "lenient_text")]
    pub favorite: String,
    #[serde(rename = "Quality", default, deserialize_with = "lenient_text")]
    pub quality: String,
    #[serde(rename = "TextDemo", default, deserialize_with = "lenient_text")]
    pub text_demo: String,
    #[serde(rename = "URLDemo", default, deserialize_with = "lenient_text")]
    pub url_demo: String,
    #[serde(rename = "UpdatedAt", default, deserialize_with = "lenient_text")]
    pub updated_at: String,
    #[serde(
        rename = "_rowIndex",
        default,
        deserialize_with = "lenient_row_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_index: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One write in a batch request; also the body of single-action POSTs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BatchOperation {
    CreateItem { data: ItemRow },
    UpdateItem { data: ItemRow },
    DeleteItem { id: String },
    CreatePrompt { data: PromptRow },
    UpdatePrompt { data: PromptRow },
    DeletePrompt { id: String },
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub action: &'static str,
    pub operations: &'a [BatchOperation],
}

/// Result of a create or update
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_row_index")]
    pub row_index: Option<i64>,
}

/// Result of a delete
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteAck {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Per-operation result of a batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload of `action=test`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionCheck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub version: Option<String>,
}

/// Response envelope shared by every action
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    })
}

fn lenient_row_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

//! Prompt <-> `Prompts` sheet row

use super::{format_bool, format_timestamp, non_empty, parse_bool, parse_timestamp, split_names};
use crate::error::{Error, Result};
use crate::models::{Prompt, PromptId, PromptType, QualityRating, SyncStatus};
use crate::sheets::PromptRow;
use crate::util::now_millis;

/// Render a prompt as a sheet row. `file_demo` stays local.
pub fn prompt_to_row(prompt: &Prompt) -> PromptRow {
    PromptRow {
        id: prompt.id.to_string(),
        title: prompt.title.clone(),
        description: prompt.description.clone(),
        prompt: prompt.prompt.clone(),
        prompt_type: prompt.prompt_type.as_str().to_string(),
        category: prompt.category.clone().unwrap_or_default(),
        tags: prompt.tags.join(","),
        note: prompt.note.clone(),
        approved: format_bool(prompt.approved).to_string(),
        favorite: format_bool(prompt.favorite).to_string(),
        quality: prompt
            .quality
            .map(|quality| quality.get().to_string())
            .unwrap_or_default(),
        text_demo: prompt.text_demo.clone().unwrap_or_default(),
        url_demo: prompt.url_demo.clone().unwrap_or_default(),
        updated_at: format_timestamp(prompt.updated_at),
        ..PromptRow::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrompt {
    pub id: PromptId,
    /// Raw type cell; validated by the caller
    pub prompt_type: String,
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub note: String,
    pub approved: bool,
    pub favorite: bool,
    pub quality: Option<QualityRating>,
    pub text_demo: Option<String>,
    pub url_demo: Option<String>,
    pub updated_at: i64,
    pub row_index: Option<i64>,
}

/// Parse a `Prompts` row. Fails only when the row has no `ID`.
pub fn parse_prompt_row(row: &PromptRow) -> Result<ParsedPrompt> {
    let id = non_empty(&row.id)
        .ok_or_else(|| Error::InvalidInput("sheet row is missing an ID".to_string()))?;

    Ok(ParsedPrompt {
        id: PromptId::from(id),
        prompt_type: non_empty(&row.prompt_type).unwrap_or_else(|| "text".to_string()),
        title: row.title.clone(),
        description: row.description.clone(),
        prompt: row.prompt.clone(),
        category: non_empty(&row.category),
        tags: split_names(&row.tags),
        note: row.note.clone(),
        approved: parse_bool(&row.approved),
        favorite: parse_bool(&row.favorite),
        quality: parse_quality(&row.quality),
        text_demo: non_empty(&row.text_demo),
        url_demo: non_empty(&row.url_demo),
        updated_at: parse_timestamp(&row.updated_at).unwrap_or_else(now_millis),
        row_index: row.row_index,
    })
}

/// Integer part of the cell, kept only inside 1..=5
fn parse_quality(value: &str) -> Option<QualityRating> {
    let whole = value.trim().split('.').next()?;
    whole.parse::<u8>().ok().and_then(QualityRating::new)
}

impl ParsedPrompt {
    /// Build the local record, keeping `file_demo`, creation time and
    /// legacy id from `existing`.
    pub fn into_prompt(self, prompt_type: PromptType, existing: Option<&Prompt>) -> Prompt {
        Prompt {
            id: self.id,
            title: self.title,
            description: self.description,
            prompt: self.prompt,
            prompt_type,
            category: self.category,
            tags: self.tags,
            note: self.note,
            approved: self.approved,
            favorite: self.favorite,
            quality: self.quality,
            text_demo: self.text_demo,
            file_demo: existing.and_then(|prompt| prompt.file_demo.clone()),
            url_demo: self.url_demo,
            created_at: existing.map_or_else(now_millis, |prompt| prompt.created_at),
            updated_at: self.updated_at,
            sync_status: SyncStatus::Synced,
            legacy_external_id: existing.and_then(|prompt| prompt.legacy_external_id.clone()),
        }
    }
}

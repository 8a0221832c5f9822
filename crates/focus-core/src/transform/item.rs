//! Item <-> `Items` sheet row

use chrono::NaiveDate;

use super::{
    format_bool, format_date, format_timestamp, non_empty, parse_bool, parse_date,
    parse_timestamp, split_names, MetadataSnapshot,
};
use crate::error::{Error, Result};
use crate::models::{
    CategoryId, Item, ItemId, ItemType, Priority, ProjectId, SyncStatus, TagId,
};
use crate::sheets::ItemRow;
use crate::util::{favicon_url, now_millis};

/// Render an item as a sheet row, turning ids into names.
///
/// Ids missing from the snapshot are dropped.
pub fn item_to_row(item: &Item, metadata: &MetadataSnapshot) -> ItemRow {
    let tags = item
        .tags
        .iter()
        .filter_map(|id| metadata.tag_name(id))
        .collect::<Vec<_>>()
        .join(",");

    ItemRow {
        id: item.id.to_string(),
        item_type: item.item_type.as_str().to_string(),
        title: item.title.clone(),
        content: item.content.clone(),
        url: item.url.clone().unwrap_or_default(),
        priority: item
            .priority
            .map(|priority| priority.as_str().to_string())
            .unwrap_or_default(),
        deadline: item.deadline.map(format_date).unwrap_or_default(),
        completed: format_bool(item.completed).to_string(),
        tags,
        category: item
            .category_id
            .as_ref()
            .and_then(|id| metadata.category_name(id))
            .unwrap_or_default()
            .to_string(),
        project: item
            .project_id
            .as_ref()
            .and_then(|id| metadata.project_name(id))
            .unwrap_or_default()
            .to_string(),
        updated_at: format_timestamp(item.updated_at),
        ..ItemRow::default()
    }
}

/// A sheet row after lenient parsing, with names not yet resolved to ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub id: ItemId,
    /// Raw type cell; validated by the caller
    pub item_type: String,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
    pub tag_names: Vec<String>,
    pub category_name: Option<String>,
    pub project_name: Option<String>,
    pub updated_at: i64,
    pub row_index: Option<i64>,
}

/// Local ids resolved from a row's names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    pub tags: Vec<TagId>,
    pub category_id: Option<CategoryId>,
    pub project_id: Option<ProjectId>,
}

/// Parse an `Items` row. Fails only when the row has no `ID`.
pub fn parse_item_row(row: &ItemRow) -> Result<ParsedItem> {
    let id = non_empty(&row.id)
        .ok_or_else(|| Error::InvalidInput("sheet row is missing an ID".to_string()))?;

    Ok(ParsedItem {
        id: ItemId::from(id),
        item_type: non_empty(&row.item_type).unwrap_or_else(|| "note".to_string()),
        title: row.title.clone(),
        content: row.content.clone(),
        url: non_empty(&row.url),
        priority: row.priority.parse().ok(),
        deadline: parse_date(&row.deadline),
        completed: parse_bool(&row.completed),
        tag_names: split_names(&row.tags),
        category_name: non_empty(&row.category),
        project_name: non_empty(&row.project),
        updated_at: parse_timestamp(&row.updated_at).unwrap_or_else(now_millis),
        row_index: row.row_index,
    })
}

impl ParsedItem {
    /// Build the local record for this row.
    ///
    /// `existing` supplies what the sheet does not carry: creation time,
    /// legacy id and a favicon when none can be derived.
    pub fn into_item(self, item_type: ItemType, links: ResolvedLinks, existing: Option<&Item>) -> Item {
        let derived_favicon = match (item_type, self.url.as_deref()) {
            (ItemType::Bookmark, Some(url)) => favicon_url(url),
            _ => None,
        };

        Item {
            id: self.id,
            item_type,
            title: self.title,
            content: self.content,
            url: self.url,
            favicon_url: derived_favicon
                .or_else(|| existing.and_then(|item| item.favicon_url.clone())),
            priority: self.priority,
            deadline: self.deadline,
            completed: self.completed,
            category_id: links.category_id,
            project_id: links.project_id,
            tags: links.tags,
            created_at: existing.map_or_else(now_millis, |item| item.created_at),
            updated_at: self.updated_at,
            sync_status: SyncStatus::Synced,
            legacy_external_id: existing.and_then(|item| item.legacy_external_id.clone()),
        }
    }
}

//! Item repository implementation

use chrono::NaiveDate;
use libsql::{params, Connection, Row};

use super::{flag, nullable, optional_text};
use crate::error::{Error, Result};
use crate::models::{Item, ItemId, SyncStatus, TagId};

const ITEM_COLUMNS: &str = "id, item_type, title, content, url, favicon_url, priority, deadline, \
     completed, category_id, project_id, tags, created_at, updated_at, sync_status, legacy_external_id";

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Trait for item storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ItemRepository {
    /// List all items, most recently updated first
    async fn list(&self) -> Result<Vec<Item>>;

    /// Get an item by ID
    async fn get(&self, id: &ItemId) -> Result<Option<Item>>;

    /// Insert a new item as-is
    async fn insert(&self, item: &Item) -> Result<()>;

    /// Overwrite every column of an existing item
    async fn replace(&self, item: &Item) -> Result<()>;

    /// Remove an item; returns whether a row was deleted
    async fn delete(&self, id: &ItemId) -> Result<bool>;

    /// Flag an item as synced without touching its clock
    async fn mark_synced(&self, id: &ItemId) -> Result<()>;
}

/// libSQL implementation of `ItemRepository`
pub struct LibSqlItemRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlItemRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an item from a database row
    fn parse_item(row: &Row) -> Result<Item> {
        let id: String = row.get(0)?;
        let item_type: String = row.get(1)?;
        let priority = optional_text(row, 6)?
            .map(|value| value.parse())
            .transpose()?;
        let deadline = optional_text(row, 7)?
            .map(|value| {
                NaiveDate::parse_from_str(&value, DEADLINE_FORMAT)
                    .map_err(|e| Error::Database(format!("invalid deadline '{value}': {e}")))
            })
            .transpose()?;
        let tags: String = row.get(11)?;
        let tags: Vec<TagId> = serde_json::from_str(&tags)?;
        let sync_status: String = row.get(14)?;

        Ok(Item {
            id: ItemId::from(id),
            item_type: item_type.parse()?,
            title: row.get(2)?,
            content: row.get(3)?,
            url: optional_text(row, 4)?,
            favicon_url: optional_text(row, 5)?,
            priority,
            deadline,
            completed: row.get::<i64>(8)? != 0,
            category_id: optional_text(row, 9)?.map(Into::into),
            project_id: optional_text(row, 10)?.map(Into::into),
            tags,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            sync_status: sync_status.parse()?,
            legacy_external_id: optional_text(row, 15)?,
        })
    }

    fn deadline_text(item: &Item) -> Option<String> {
        item.deadline
            .map(|date| date.format(DEADLINE_FORMAT).to_string())
    }
}

impl ItemRepository for LibSqlItemRepository<'_> {
    async fn list(&self) -> Result<Vec<Item>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY updated_at DESC, id"),
                (),
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::parse_item(&row)?);
        }
        Ok(items)
    }

    async fn get(&self, id: &ItemId) -> Result<Option<Item>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, item: &Item) -> Result<()> {
        let tags = serde_json::to_string(&item.tags)?;
        let deadline = Self::deadline_text(item);

        self.conn
            .execute(
                &format!(
                    "INSERT INTO items ({ITEM_COLUMNS}) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    item.id.as_str(),
                    item.item_type.as_str(),
                    item.title.as_str(),
                    item.content.as_str(),
                    nullable(item.url.as_deref()),
                    nullable(item.favicon_url.as_deref()),
                    nullable(item.priority.map(|p| p.as_str())),
                    nullable(deadline.as_deref()),
                    flag(item.completed),
                    nullable(item.category_id.as_ref().map(|id| id.as_str())),
                    nullable(item.project_id.as_ref().map(|id| id.as_str())),
                    tags,
                    item.created_at,
                    item.updated_at,
                    item.sync_status.as_str(),
                    nullable(item.legacy_external_id.as_deref()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, item: &Item) -> Result<()> {
        let tags = serde_json::to_string(&item.tags)?;
        let deadline = Self::deadline_text(item);

        let rows = self
            .conn
            .execute(
                "UPDATE items SET item_type = ?, title = ?, content = ?, url = ?, favicon_url = ?,
                 priority = ?, deadline = ?, completed = ?, category_id = ?, project_id = ?,
                 tags = ?, created_at = ?, updated_at = ?, sync_status = ?, legacy_external_id = ?
                 WHERE id = ?",
                params![
                    item.item_type.as_str(),
                    item.title.as_str(),
                    item.content.as_str(),
                    nullable(item.url.as_deref()),
                    nullable(item.favicon_url.as_deref()),
                    nullable(item.priority.map(|p| p.as_str())),
                    nullable(deadline.as_deref()),
                    flag(item.completed),
                    nullable(item.category_id.as_ref().map(|id| id.as_str())),
                    nullable(item.project_id.as_ref().map(|id| id.as_str())),
                    tags,
                    item.created_at,
                    item.updated_at,
                    item.sync_status.as_str(),
                    nullable(item.legacy_external_id.as_deref()),
                    item.id.as_str(),
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(item.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ItemId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM items WHERE id = ?", [id.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn mark_synced(&self, id: &ItemId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE items SET sync_status = ? WHERE id = ?",
                params![SyncStatus::Synced.as_str(), id.as_str()],
            )
            .await?;
        Ok(())
    }
}

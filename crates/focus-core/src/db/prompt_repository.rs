//! Prompt repository implementation

use libsql::{params, Connection, Row, Value};

use super::{flag, nullable, optional_integer, optional_text};
use crate::error::{Error, Result};
use crate::models::{Prompt, PromptId, QualityRating, SyncStatus};

const PROMPT_COLUMNS: &str = "id, title, description, prompt, prompt_type, category, tags, note, \
     approved, favorite, quality, text_demo, file_demo, url_demo, created_at, updated_at, \
     sync_status, legacy_external_id";

/// Trait for prompt storage operations (async)
#[allow(async_fn_in_trait)]
pub trait PromptRepository {
    /// List all prompts, most recently updated first
    async fn list(&self) -> Result<Vec<Prompt>>;

    /// Get a prompt by ID
    async fn get(&self, id: &PromptId) -> Result<Option<Prompt>>;

    /// Insert a new prompt as-is
    async fn insert(&self, prompt: &Prompt) -> Result<()>;

    /// Overwrite every column of an existing prompt
    async fn replace(&self, prompt: &Prompt) -> Result<()>;

    /// Remove a prompt; returns whether a row was deleted
    async fn delete(&self, id: &PromptId) -> Result<bool>;

    /// Flag a prompt as synced without touching its clock
    async fn mark_synced(&self, id: &PromptId) -> Result<()>;
}

/// libSQL implementation of `PromptRepository`
pub struct LibSqlPromptRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPromptRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_prompt(row: &Row) -> Result<Prompt> {
        let id: String = row.get(0)?;
        let prompt_type: String = row.get(4)?;
        let tags: String = row.get(6)?;
        let quality = optional_integer(row, 10)?
            .map(|value| {
                u8::try_from(value)
                    .ok()
                    .and_then(QualityRating::new)
                    .ok_or_else(|| Error::Database(format!("invalid stored quality {value}")))
            })
            .transpose()?;
        let sync_status: String = row.get(16)?;

        Ok(Prompt {
            id: PromptId::from(id),
            title: row.get(1)?,
            description: row.get(2)?,
            prompt: row.get(3)?,
            prompt_type: prompt_type.parse()?,
            category: optional_text(row, 5)?,
            tags: serde_json::from_str(&tags)?,
            note: row.get(7)?,
            approved: row.get::<i64>(8)? != 0,
            favorite: row.get::<i64>(9)? != 0,
            quality,
            text_demo: optional_text(row, 11)?,
            file_demo: optional_text(row, 12)?,
            url_demo: optional_text(row, 13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
            sync_status: sync_status.parse()?,
            legacy_external_id: optional_text(row, 17)?,
        })
    }

    fn quality_value(prompt: &Prompt) -> Value {
        prompt
            .quality
            .map_or(Value::Null, |quality| Value::Integer(i64::from(quality.get())))
    }
}

impl PromptRepository for LibSqlPromptRepository<'_> {
    async fn list(&self) -> Result<Vec<Prompt>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY updated_at DESC, id"),
                (),
            )
            .await?;

        let mut prompts = Vec::new();
        while let Some(row) = rows.next().await? {
            prompts.push(Self::parse_prompt(&row)?);
        }
        Ok(prompts)
    }

    async fn get(&self, id: &PromptId) -> Result<Option<Prompt>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_prompt(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, prompt: &Prompt) -> Result<()> {
        let tags = serde_json::to_string(&prompt.tags)?;

        self.conn
            .execute(
                &format!(
                    "INSERT INTO prompts ({PROMPT_COLUMNS}) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    prompt.id.as_str(),
                    prompt.title.as_str(),
                    prompt.description.as_str(),
                    prompt.prompt.as_str(),
                    prompt.prompt_type.as_str(),
                    nullable(prompt.category.as_deref()),
                    tags,
                    prompt.note.as_str(),
                    flag(prompt.approved),
                    flag(prompt.favorite),
                    Self::quality_value(prompt),
                    nullable(prompt.text_demo.as_deref()),
                    nullable(prompt.file_demo.as_deref()),
                    nullable(prompt.url_demo.as_deref()),
                    prompt.created_at,
                    prompt.updated_at,
                    prompt.sync_status.as_str(),
                    nullable(prompt.legacy_external_id.as_deref()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, prompt: &Prompt) -> Result<()> {
        let tags = serde_json::to_string(&prompt.tags)?;

        let rows = self
            .conn
            .execute(
                "UPDATE prompts SET title = ?, description = ?, prompt = ?, prompt_type = ?,
                 category = ?, tags = ?, note = ?, approved = ?, favorite = ?, quality = ?,
                 text_demo = ?, file_demo = ?, url_demo = ?, created_at = ?, updated_at = ?,
                 sync_status = ?, legacy_external_id = ?
                 WHERE id = ?",
                params![
                    prompt.title.as_str(),
                    prompt.description.as_str(),
                    prompt.prompt.as_str(),
                    prompt.prompt_type.as_str(),
                    nullable(prompt.category.as_deref()),
                    tags,
                    prompt.note.as_str(),
                    flag(prompt.approved),
                    flag(prompt.favorite),
                    Self::quality_value(prompt),
                    nullable(prompt.text_demo.as_deref()),
                    nullable(prompt.file_demo.as_deref()),
                    nullable(prompt.url_demo.as_deref()),
                    prompt.created_at,
                    prompt.updated_at,
                    prompt.sync_status.as_str(),
                    nullable(prompt.legacy_external_id.as_deref()),
                    prompt.id.as_str(),
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(prompt.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &PromptId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM prompts WHERE id = ?", [id.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn mark_synced(&self, id: &PromptId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE prompts SET sync_status = ? WHERE id = ?",
                params![SyncStatus::Synced.as_str(), id.as_str()],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::PromptType;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get_keeps_local_only_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlPromptRepository::new(db.connection());

        let mut prompt = Prompt::new("Cinematic city", "a neon city at dusk");
        prompt.prompt_type = PromptType::Image;
        prompt.tags = vec!["art".to_string(), "city".to_string()];
        prompt.quality = QualityRating::new(4);
        prompt.file_demo = Some("/tmp/demo.png".to_string());
        prompt.favorite = true;
        repo.insert(&prompt).await.unwrap();

        let loaded = repo.get(&prompt.id).await.unwrap().unwrap();
        assert_eq!(loaded, prompt);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replace_and_delete() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlPromptRepository::new(db.connection());

        let mut prompt = Prompt::new("Summarize", "Summarize the text");
        repo.insert(&prompt).await.unwrap();

        prompt.quality = None;
        prompt.approved = true;
        prompt.category = Some("Writing".to_string());
        repo.replace(&prompt).await.unwrap();
        assert_eq!(repo.list().await.unwrap(), vec![prompt.clone()]);

        assert!(repo.delete(&prompt.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_synced() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlPromptRepository::new(db.connection());

        let prompt = Prompt::new("Draft", "Draft an email");
        repo.insert(&prompt).await.unwrap();
        repo.mark_synced(&prompt.id).await.unwrap();

        let loaded = repo.get(&prompt.id).await.unwrap().unwrap();
        assert_eq!(loaded.sync_status, SyncStatus::Synced);
    }
}

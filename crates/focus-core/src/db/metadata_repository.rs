//! Tag, category and project repository implementation

use libsql::{params, Connection};

use super::{nullable, optional_text};
use crate::error::Result;
use crate::models::{Category, Project, Tag};
use crate::util::now_millis;

/// Trait for metadata storage operations (async)
///
/// Metadata is append-only from the point of view of sync.
#[allow(async_fn_in_trait)]
pub trait MetadataRepository {
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn create_tag(&self, tag: &Tag) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, category: &Category) -> Result<()>;

    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_project(&self, project: &Project) -> Result<()>;
}

/// libSQL implementation of `MetadataRepository`
pub struct LibSqlMetadataRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMetadataRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MetadataRepository for LibSqlMetadataRepository<'_> {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, color FROM tags ORDER BY created_at, rowid",
                (),
            )
            .await?;

        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(Tag {
                id: row.get::<String>(0)?.into(),
                name: row.get(1)?,
                color: row.get(2)?,
            });
        }
        Ok(tags)
    }

    async fn create_tag(&self, tag: &Tag) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tags (id, name, color, created_at) VALUES (?, ?, ?, ?)",
                params![
                    tag.id.as_str(),
                    tag.name.as_str(),
                    tag.color.as_str(),
                    now_millis()
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, icon, parent_id FROM categories ORDER BY created_at, rowid",
                (),
            )
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(Category {
                id: row.get::<String>(0)?.into(),
                name: row.get(1)?,
                icon: row.get(2)?,
                parent_id: optional_text(&row, 3)?.map(Into::into),
            });
        }
        Ok(categories)
    }

    async fn create_category(&self, category: &Category) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO categories (id, name, icon, parent_id, created_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    category.id.as_str(),
                    category.name.as_str(),
                    category.icon.as_str(),
                    nullable(category.parent_id.as_ref().map(|id| id.as_str())),
                    now_millis()
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, color FROM projects ORDER BY created_at, rowid",
                (),
            )
            .await?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(Project {
                id: row.get::<String>(0)?.into(),
                name: row.get(1)?,
                color: row.get(2)?,
            });
        }
        Ok(projects)
    }

    async fn create_project(&self, project: &Project) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO projects (id, name, color, created_at) VALUES (?, ?, ?, ?)",
                params![
                    project.id.as_str(),
                    project.name.as_str(),
                    project.color.as_str(),
                    now_millis()
                ],
            )
            .await?;
        Ok(())
    }
}

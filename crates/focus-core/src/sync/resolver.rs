//! Name -> id resolution for pulled rows
//!
//! Lookups are case-insensitive against a per-pull cache. A miss creates the
//! record and appends it to the cache, so a name repeated within one pull
//! maps to the same new id. Nothing is ever renamed, merged or deleted.

use crate::error::Result;
use crate::models::{Category, CategoryId, Project, ProjectId, Tag, TagId};
use crate::services::DatabaseService;
use crate::transform::MetadataSnapshot;

/// Colors for tags created during a pull, picked by position in the row
pub const DEFAULT_TAG_COLORS: [&str; 5] = ["#3b82f6", "#ef4444", "#22c55e", "#f59e0b", "#8b5cf6"];

/// Colors assigned round-robin to projects created during a pull
pub const DEFAULT_PROJECT_COLORS: [&str; 5] =
    ["#06b6d4", "#ec4899", "#14b8a6", "#f97316", "#6366f1"];

pub const DEFAULT_CATEGORY_ICON: &str = "folder";

pub struct NameResolver<'a> {
    store: &'a DatabaseService,
    metadata: &'a mut MetadataSnapshot,
}

impl<'a> NameResolver<'a> {
    pub fn new(store: &'a DatabaseService, metadata: &'a mut MetadataSnapshot) -> Self {
        Self { store, metadata }
    }

    /// Ids for the given tag names, in order and without duplicates
    pub async fn resolve_tag_names(&mut self, names: &[String]) -> Result<Vec<TagId>> {
        let mut ids: Vec<TagId> = Vec::with_capacity(names.len());

        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let id = if let Some(tag) = self.metadata.find_tag(name) {
                tag.id.clone()
            } else {
                let color = DEFAULT_TAG_COLORS[ids.len() % DEFAULT_TAG_COLORS.len()];
                let tag = Tag::new(name, color);
                self.store.create_tag(&tag).await?;
                tracing::debug!("Created tag '{}' while resolving pulled rows", tag.name);
                let id = tag.id.clone();
                self.metadata.tags.push(tag);
                id
            };

            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    pub async fn resolve_category_name(&mut self, name: Option<&str>) -> Result<Option<CategoryId>> {
        let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        if let Some(category) = self.metadata.find_category(name) {
            return Ok(Some(category.id.clone()));
        }

        let category = Category::new(name, DEFAULT_CATEGORY_ICON);
        self.store.create_category(&category).await?;
        tracing::debug!("Created category '{}' while resolving pulled rows", category.name);
        let id = category.id.clone();
        self.metadata.categories.push(category);
        Ok(Some(id))
    }

    pub async fn resolve_project_name(&mut self, name: Option<&str>) -> Result<Option<ProjectId>> {
        let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        if let Some(project) = self.metadata.find_project(name) {
            return Ok(Some(project.id.clone()));
        }

        let color =
            DEFAULT_PROJECT_COLORS[self.metadata.projects.len() % DEFAULT_PROJECT_COLORS.len()];
        let project = Project::new(name, color);
        self.store.create_project(&project).await?;
        tracing::debug!("Created project '{}' while resolving pulled rows", project.name);
        let id = project.id.clone();
        self.metadata.projects.push(project);
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn same_name_twice_creates_one_tag() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let mut metadata = store.load_metadata().await.unwrap();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        let first = resolver.resolve_tag_names(&names(&["errand"])).await.unwrap();
        let second = resolver.resolve_tag_names(&names(&["Errand"])).await.unwrap();

        assert_eq!(first, second);
        let tags = store.list_tags().await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "errand");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn existing_tags_are_reused_with_original_casing() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let work = Tag::new("Work", "#000000");
        store.create_tag(&work).await.unwrap();
        let mut metadata = store.load_metadata().await.unwrap();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        let ids = resolver
            .resolve_tag_names(&names(&["work", "WORK", "home"]))
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], work.id);
        let stored = store.list_tags().await.unwrap();
        assert_eq!(stored[0].name, "Work");
        assert_eq!(stored[1].name, "home");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn new_tags_cycle_through_colors() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let mut metadata = MetadataSnapshot::default();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        resolver
            .resolve_tag_names(&names(&["a", "b", "c", "d", "e", "f"]))
            .await
            .unwrap();

        let colors: Vec<String> = metadata.tags.iter().map(|tag| tag.color.clone()).collect();
        assert_eq!(colors[0], DEFAULT_TAG_COLORS[0]);
        assert_eq!(colors[4], DEFAULT_TAG_COLORS[4]);
        assert_eq!(colors[5], DEFAULT_TAG_COLORS[0]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn new_tag_color_follows_row_position() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let known = Tag::new("Known", "#000000");
        store.create_tag(&known).await.unwrap();
        store
            .create_tag(&Tag::new("Other", "#111111"))
            .await
            .unwrap();
        let mut metadata = store.load_metadata().await.unwrap();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        let ids = resolver
            .resolve_tag_names(&names(&["known", "Fresh"]))
            .await
            .unwrap();

        assert_eq!(ids[0], known.id);
        let fresh = metadata.find_tag("fresh").unwrap();
        assert_eq!(fresh.color, DEFAULT_TAG_COLORS[1]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_single_values_resolve_to_none() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let mut metadata = MetadataSnapshot::default();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        assert_eq!(resolver.resolve_category_name(None).await.unwrap(), None);
        assert_eq!(resolver.resolve_project_name(Some("  ")).await.unwrap(), None);
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn new_category_gets_folder_icon() {
        let store = DatabaseService::open_in_memory().await.unwrap();
        let mut metadata = MetadataSnapshot::default();
        let mut resolver = NameResolver::new(&store, &mut metadata);

        let first = resolver.resolve_category_name(Some("Reading")).await.unwrap();
        let again = resolver.resolve_category_name(Some("reading")).await.unwrap();
        let project = resolver.resolve_project_name(Some("Launch")).await.unwrap();

        assert_eq!(first, again);
        assert!(project.is_some());
        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].icon, DEFAULT_CATEGORY_ICON);
        assert_eq!(
            store.list_projects().await.unwrap()[0].color,
            DEFAULT_PROJECT_COLORS[0]
        );
    }
}

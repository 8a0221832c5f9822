use std::path::Path;

use chrono::NaiveDate;
use focus_core::models::{Item, ItemType, Priority};
use focus_core::sync::NameResolver;
use focus_core::util::normalize_text_option;

use crate::commands::common::{
    format_item_lines, item_to_list_item, normalize_title, open_database, resolve_item,
    ItemListItem,
};
use crate::error::CliError;

/// Fields of `focus item add`
#[derive(Debug, Default)]
pub struct NewItem {
    pub title: Vec<String>,
    pub item_type: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub project: Option<String>,
}

pub async fn run_item_add(new_item: NewItem, db_path: &Path) -> Result<(), CliError> {
    let title = normalize_title(&new_item.title)?;
    let item_type: ItemType = new_item.item_type.parse()?;
    let priority = new_item
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()?;

    let db = open_database(db_path).await?;
    let mut metadata = db.load_metadata().await?;
    let mut resolver = NameResolver::new(&db, &mut metadata);

    let mut item = Item::new(item_type, title);
    item.content = new_item.content.unwrap_or_default();
    item.url = normalize_text_option(new_item.url);
    item.priority = priority;
    item.deadline = new_item.deadline;
    for tag in resolver.resolve_tag_names(&new_item.tags).await? {
        item.add_tag(tag);
    }
    item.category_id = resolver
        .resolve_category_name(new_item.category.as_deref())
        .await?;
    item.project_id = resolver
        .resolve_project_name(new_item.project.as_deref())
        .await?;

    let item = db.create_item(item).await?;
    println!("{}", item.id);
    Ok(())
}

pub async fn run_item_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let metadata = db.load_metadata().await?;
    let items = db
        .list_items()
        .await?
        .into_iter()
        .take(limit)
        .collect::<Vec<_>>();

    if as_json {
        let json_items = items
            .iter()
            .map(|item| item_to_list_item(item, &metadata))
            .collect::<Vec<ItemListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_item_lines(&items, &metadata) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_item_complete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let mut item = resolve_item(id, &db).await?;

    if item.completed {
        println!("{} already completed", item.id);
        return Ok(());
    }

    item.completed = true;
    let item = db.update_item(item).await?;
    println!("{}", item.id);
    Ok(())
}

pub async fn run_item_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let item = resolve_item(id, &db).await?;

    db.delete_item(&item.id).await?;
    println!("{}", item.id);
    Ok(())
}

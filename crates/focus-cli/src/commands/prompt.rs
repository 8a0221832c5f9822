use std::path::Path;

use focus_core::models::{Prompt, PromptType};
use focus_core::transform::split_names;
use focus_core::util::normalize_text_option;

use crate::commands::common::{
    format_prompt_lines, open_database, prompt_to_list_item, resolve_prompt, PromptListItem,
};
use crate::error::CliError;

/// Fields of `focus prompt add`
#[derive(Debug, Default)]
pub struct NewPrompt {
    pub title: String,
    pub text: String,
    pub prompt_type: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

pub fn build_prompt(new_prompt: NewPrompt) -> Result<Prompt, CliError> {
    let title = normalize_text_option(Some(new_prompt.title)).ok_or(CliError::EmptyTitle)?;
    let text = normalize_text_option(Some(new_prompt.text)).ok_or(CliError::EmptyPromptText)?;
    let prompt_type: PromptType = new_prompt.prompt_type.parse()?;

    let mut prompt = Prompt::new(title, text);
    prompt.prompt_type = prompt_type;
    prompt.category = normalize_text_option(new_prompt.category);
    prompt.tags = split_names(&new_prompt.tags.join(","));
    Ok(prompt)
}

pub async fn run_prompt_add(new_prompt: NewPrompt, db_path: &Path) -> Result<(), CliError> {
    let prompt = build_prompt(new_prompt)?;
    let db = open_database(db_path).await?;
    let prompt = db.create_prompt(prompt).await?;
    println!("{}", prompt.id);
    Ok(())
}

pub async fn run_prompt_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let prompts = db
        .list_prompts()
        .await?
        .into_iter()
        .take(limit)
        .collect::<Vec<_>>();

    if as_json {
        let json_items = prompts
            .iter()
            .map(prompt_to_list_item)
            .collect::<Vec<PromptListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_prompt_lines(&prompts) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_prompt_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let prompt = resolve_prompt(id, &db).await?;

    db.delete_prompt(&prompt.id).await?;
    println!("{}", prompt.id);
    Ok(())
}

use std::path::Path;

use crate::commands::common::{
    format_status_lines, format_sync_result, open_database, open_sync_service, StatusView,
};
use crate::error::CliError;

pub async fn run_sync(full: bool, db_path: &Path) -> Result<(), CliError> {
    let service = open_sync_service(db_path).await?;
    let result = service.full_sync(full).await;

    for line in format_sync_result(&result) {
        println!("{line}");
    }

    if result.success {
        Ok(())
    } else {
        Err(CliError::SyncFailed(result.errors.join("; ")))
    }
}

pub async fn run_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let queue = db.queue_status().await?;
    let settings = db.load_settings().await?;
    let view = StatusView::new(&queue, &settings);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for line in format_status_lines(&view, settings.is_sync_configured()) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_retry_failed(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let count = db.reset_failed().await?;
    println!("Requeued {count} failed entries");
    Ok(())
}

pub async fn run_clear_failed(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let count = db.clear_failed().await?;
    println!("Cleared {count} failed entries");
    Ok(())
}

pub async fn run_test_connection(db_path: &Path) -> Result<(), CliError> {
    let service = open_sync_service(db_path).await?;
    if service.test_connection().await {
        println!("Connection OK");
        Ok(())
    } else {
        Err(CliError::SyncFailed(
            "remote endpoint did not answer the connection test".to_string(),
        ))
    }
}

use std::path::Path;

use focus_core::background::{spawn_sync_worker, SyncEvent};
use tokio::sync::broadcast::error::RecvError;

use crate::commands::common::{format_sync_result, open_sync_service};
use crate::error::CliError;

/// Sync once, then keep the auto-sync timer running until Ctrl-C.
pub async fn run_daemon(db_path: &Path) -> Result<(), CliError> {
    let service = open_sync_service(db_path).await?;
    let (handle, worker) = spawn_sync_worker(service);

    let initial = handle.sync_now(false).await?;
    for line in format_sync_result(&initial) {
        println!("{line}");
    }
    let mut events = handle.subscribe();
    match handle.update_auto_sync().await? {
        Some(minutes) => println!("Auto-sync every {minutes} minutes; press Ctrl-C to stop"),
        None => println!("Auto-sync is disabled; press Ctrl-C to stop"),
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SyncEvent::Completed(result)) => {
                    for line in format_sync_result(&result) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {skipped} sync notifications");
                }
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                println!("Stopping");
                break;
            }
        }
    }

    drop(handle);
    worker
        .await
        .map_err(|error| CliError::SyncFailed(format!("sync worker panicked: {error}")))?;
    Ok(())
}

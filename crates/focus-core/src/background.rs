//! Background sync worker driven by control requests and an auto-sync timer.

use std::future;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::sheets::RemoteStore;
use crate::sync::{SyncResult, SyncService, SyncStatusReport};

const REQUEST_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 16;

/// Notification published by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A cycle finished after changing local or remote data
    Completed(SyncResult),
}

enum SyncRequest {
    SyncNow {
        force_full: bool,
        reply: oneshot::Sender<SyncResult>,
    },
    GetStatus {
        reply: oneshot::Sender<Result<SyncStatusReport>>,
    },
    RetryFailed {
        reply: oneshot::Sender<Result<u64>>,
    },
    ClearFailed {
        reply: oneshot::Sender<Result<u64>>,
    },
    UpdateAutoSync {
        reply: oneshot::Sender<Result<Option<u32>>>,
    },
}

/// Cloneable sender side of the worker
///
/// The worker stops once every handle is dropped.
#[derive(Clone)]
pub struct SyncHandle {
    requests: mpsc::Sender<SyncRequest>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncHandle {
    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> SyncRequest) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(build(reply))
            .await
            .map_err(|_| Error::WorkerStopped)?;
        response.await.map_err(|_| Error::WorkerStopped)
    }

    /// Run a full cycle now and wait for its result.
    pub async fn sync_now(&self, force_full: bool) -> Result<SyncResult> {
        self.call(|reply| SyncRequest::SyncNow { force_full, reply })
            .await
    }

    pub async fn sync_status(&self) -> Result<SyncStatusReport> {
        self.call(|reply| SyncRequest::GetStatus { reply }).await?
    }

    pub async fn retry_failed(&self) -> Result<u64> {
        self.call(|reply| SyncRequest::RetryFailed { reply }).await?
    }

    pub async fn clear_failed(&self) -> Result<u64> {
        self.call(|reply| SyncRequest::ClearFailed { reply }).await?
    }

    /// Re-read auto-sync settings and reschedule the timer.
    ///
    /// Returns the new period in minutes, or `None` when the timer is off.
    pub async fn update_auto_sync(&self) -> Result<Option<u32>> {
        self.call(|reply| SyncRequest::UpdateAutoSync { reply })
            .await?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }
}

/// Spawn the worker on the current runtime.
pub fn spawn_sync_worker<R>(service: SyncService<R>) -> (SyncHandle, JoinHandle<()>)
where
    R: RemoteStore + 'static,
{
    let (requests, receiver) = mpsc::channel(REQUEST_BUFFER);
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    let worker = SyncWorker {
        service,
        events: events.clone(),
        timer: None,
    };
    let task = tokio::spawn(worker.run(receiver));
    (SyncHandle { requests, events }, task)
}

struct SyncWorker<R> {
    service: SyncService<R>,
    events: broadcast::Sender<SyncEvent>,
    timer: Option<Interval>,
}

impl<R: RemoteStore + 'static> SyncWorker<R> {
    async fn run(mut self, mut requests: mpsc::Receiver<SyncRequest>) {
        if let Err(error) = self.reschedule().await {
            tracing::warn!("Could not read auto-sync settings: {error}");
        }

        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(request) = request else {
                        tracing::debug!("All sync handles dropped, stopping worker");
                        break;
                    };
                    self.handle(request).await;
                }
                () = next_tick(&mut self.timer) => self.on_tick().await,
            }
        }
    }

    async fn handle(&mut self, request: SyncRequest) {
        match request {
            SyncRequest::SyncNow { force_full, reply } => {
                self.spawn_cycle(force_full, Some(reply));
            }
            SyncRequest::GetStatus { reply } => {
                let _ = reply.send(self.service.status_report().await);
            }
            SyncRequest::RetryFailed { reply } => {
                let _ = reply.send(self.service.retry_failed().await);
            }
            SyncRequest::ClearFailed { reply } => {
                let _ = reply.send(self.service.clear_failed().await);
            }
            SyncRequest::UpdateAutoSync { reply } => {
                let _ = reply.send(self.reschedule().await);
            }
        }
    }

    async fn reschedule(&mut self) -> Result<Option<u32>> {
        let settings = self.service.store().load_settings().await?;
        let period = settings.auto_sync_period_minutes();

        self.timer = period.map(|minutes| {
            let every = Duration::from_secs(u64::from(minutes) * 60);
            let mut timer = time::interval_at(Instant::now() + every, every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        match period {
            Some(minutes) => tracing::info!("Auto-sync every {minutes} minutes"),
            None => tracing::info!("Auto-sync disabled"),
        }
        Ok(period)
    }

    async fn on_tick(&mut self) {
        let settings = match self.service.store().load_settings().await {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!("Skipping auto-sync, settings unavailable: {error}");
                return;
            }
        };

        if !settings.auto_sync_enabled || !settings.is_sync_configured() {
            tracing::debug!("Auto-sync tick skipped");
            return;
        }

        tracing::debug!("Auto-sync tick");
        self.spawn_cycle(false, None);
    }

    /// Run a cycle off the request loop so status requests stay responsive.
    fn spawn_cycle(&self, force_full: bool, reply: Option<oneshot::Sender<SyncResult>>) {
        let service = self.service.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = service.full_sync(force_full).await;
            if result.has_changes() {
                // No subscribers is fine
                let _ = events.send(SyncEvent::Completed(result.clone()));
            }
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        });
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => future::pending().await,
    }
}

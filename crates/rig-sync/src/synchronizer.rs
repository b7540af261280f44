//! The reconciliation loop.
//!
//! One task per client session owns the debounce deadline, the in-flight
//! fetch and the snapshot cache. Triggers arrive on an mpsc channel; store
//! change notifications are forwarded into it by a second task.
//!
//! ```text
//! Change ──► (re)arm deadline ──► deadline elapses ──┐
//! FocusRegained / Online / Lagged ───────────────────┼──► start fetch
//! Refresh (cache stale) ─────────────────────────────┘      │
//!                                  abort previous fetch ◄───┘
//! ```
//!
//! While the platform reports the network as offline nothing is fetched:
//! changes only invalidate the cache, and `Online` reconciles.

use std::sync::Arc;
use std::time::Duration;

use rig_config::SyncConfig;
use rig_core::entities::ChangeEvent;
use rig_core::responses::Snapshot;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until};

use crate::backoff::BackoffPolicy;
use crate::cache::TtlCache;
use crate::error::SyncError;
use crate::source::SnapshotSource;

const SNAPSHOT_KEY: &str = "snapshot";
const TRIGGER_BUFFER: usize = 64;

/// Something that should lead to a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A row-level change notification. Debounced.
    Change(ChangeEvent),
    /// The notification stream dropped this many events.
    Lagged(u64),
    /// The application came back to the foreground.
    FocusRegained,
    /// The network came back. Always reconciles.
    Online,
    /// The network went away. Suppresses fetches until `Online`.
    Offline,
    /// Soft refresh, answered from cache while the cached view is fresh.
    Refresh,
}

/// Reachability of the store as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Online,
    /// The platform reported the network as gone.
    Offline,
    /// Fetches kept failing after every retry.
    Unreachable,
}

/// State published to the session after every reconciliation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub connectivity: Connectivity,
    pub last_error: Option<SyncError>,
    /// Completed reconciliations.
    pub fetches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub debounce: Duration,
    pub backoff: BackoffPolicy,
    pub cache_ttl: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl SyncSettings {
    #[must_use]
    pub const fn from_config(config: &SyncConfig) -> Self {
        Self {
            debounce: config.debounce(),
            backoff: BackoffPolicy::from_config(config),
            cache_ttl: config.cache_ttl(),
        }
    }
}

/// Builder for a session's reconciliation loop.
pub struct Synchronizer<S> {
    source: Arc<S>,
    settings: SyncSettings,
}

impl<S: SnapshotSource> Synchronizer<S> {
    #[must_use]
    pub const fn new(source: Arc<S>, settings: SyncSettings) -> Self {
        Self { source, settings }
    }

    /// Start the loop. When `changes` is given, its notifications are
    /// forwarded as triggers.
    #[must_use]
    pub fn spawn(self, changes: Option<broadcast::Receiver<ChangeEvent>>) -> SyncHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        let (state_tx, state_rx) = watch::channel(SyncState::default());

        let forwarder = changes.map(|rx| tokio::spawn(forward_changes(rx, trigger_tx.clone())));
        let worker = Worker {
            source: self.source,
            settings: self.settings,
            state: state_tx,
            cache: TtlCache::new(self.settings.cache_ttl),
            generation: 0,
        };
        let task = tokio::spawn(worker.run(trigger_rx));

        SyncHandle {
            triggers: trigger_tx,
            state: state_rx,
            task,
            forwarder,
        }
    }
}

/// Session-side handle to a running synchronizer.
pub struct SyncHandle {
    triggers: mpsc::Sender<Trigger>,
    state: watch::Receiver<SyncState>,
    task: JoinHandle<()>,
    forwarder: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Deliver a trigger to the loop.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Fatal` if the loop has stopped.
    pub async fn trigger(&self, trigger: Trigger) -> Result<(), SyncError> {
        self.triggers
            .send(trigger)
            .await
            .map_err(|_| SyncError::Fatal("synchronizer has stopped".into()))
    }

    /// Subscribe to state updates.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    #[must_use]
    pub fn current(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Stop forwarding notifications and wait for the loop to exit. An
    /// in-flight fetch is cancelled.
    pub async fn shutdown(self) {
        if let Some(forwarder) = self.forwarder {
            forwarder.abort();
        }
        drop(self.triggers);
        if let Err(error) = self.task.await {
            tracing::warn!(%error, "synchronizer task ended abnormally");
        }
    }
}

async fn forward_changes(
    mut changes: broadcast::Receiver<ChangeEvent>,
    triggers: mpsc::Sender<Trigger>,
) {
    loop {
        let trigger = match changes.recv().await {
            Ok(event) => Trigger::Change(event),
            Err(broadcast::error::RecvError::Lagged(missed)) => Trigger::Lagged(missed),
            Err(broadcast::error::RecvError::Closed) => break,
        };
        if triggers.send(trigger).await.is_err() {
            break;
        }
    }
}

struct InFlight {
    generation: u64,
    handle: JoinHandle<Result<Snapshot, SyncError>>,
}

async fn wait_in_flight(
    in_flight: &mut Option<InFlight>,
) -> Result<Result<Snapshot, SyncError>, JoinError> {
    match in_flight {
        Some(fetch) => (&mut fetch.handle).await,
        None => std::future::pending().await,
    }
}

/// Fetch a full snapshot, retrying transient failures with backoff.
async fn fetch_with_retry<S: SnapshotSource>(
    source: &S,
    backoff: BackoffPolicy,
    generation: u64,
) -> Result<Snapshot, SyncError> {
    let mut retries = 0;
    loop {
        tracing::debug!(generation, attempt = retries + 1, "reconciliation fetch");
        match source.fetch_snapshot().await {
            Ok(snapshot) => return Ok(snapshot),
            Err(error) if error.is_transient() && backoff.allows_retry(retries) => {
                retries += 1;
                let delay = backoff.delay_for_attempt(retries);
                tracing::warn!(generation, retry = retries, ?delay, %error, "transient fetch failure, backing off");
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                if error.is_transient() {
                    tracing::warn!(generation, retries, "retries exhausted, store unreachable");
                }
                return Err(error);
            }
        }
    }
}

struct Worker<S> {
    source: Arc<S>,
    settings: SyncSettings,
    state: watch::Sender<SyncState>,
    cache: TtlCache<&'static str, Arc<Snapshot>>,
    generation: u64,
}

impl<S: SnapshotSource> Worker<S> {
    async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>) {
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                trigger = triggers.recv() => {
                    let Some(trigger) = trigger else { break };
                    self.on_trigger(trigger, &mut deadline, &mut in_flight);
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    tracing::debug!("debounce window elapsed");
                    self.start_fetch(&mut in_flight);
                }
                joined = wait_in_flight(&mut in_flight), if in_flight.is_some() => {
                    let generation = in_flight.take().map_or(0, |fetch| fetch.generation);
                    self.on_fetch_done(generation, joined);
                }
            }
        }

        if let Some(fetch) = in_flight {
            fetch.handle.abort();
        }
        tracing::debug!("synchronizer stopped");
    }

    fn on_trigger(
        &mut self,
        trigger: Trigger,
        deadline: &mut Option<Instant>,
        in_flight: &mut Option<InFlight>,
    ) {
        if self.is_offline() && !matches!(trigger, Trigger::Online | Trigger::Offline) {
            if matches!(trigger, Trigger::Change(_) | Trigger::Lagged(_)) {
                self.cache.invalidate(&SNAPSHOT_KEY);
            }
            tracing::debug!(?trigger, "offline, deferring reconciliation until online");
            return;
        }

        match trigger {
            Trigger::Change(event) => {
                self.cache.invalidate(&SNAPSHOT_KEY);
                let rearmed = deadline.is_some();
                *deadline = Some(Instant::now() + self.settings.debounce);
                tracing::debug!(table = %event.table, kind = %event.kind, rearmed, "debounce armed");
            }
            Trigger::Lagged(missed) => {
                tracing::warn!(missed, "change feed lagged, forcing reconciliation");
                self.cache.invalidate(&SNAPSHOT_KEY);
                *deadline = None;
                self.start_fetch(in_flight);
            }
            Trigger::FocusRegained => {
                tracing::debug!("focus regained, forcing reconciliation");
                *deadline = None;
                self.start_fetch(in_flight);
            }
            Trigger::Online => {
                tracing::info!("back online, forcing reconciliation");
                self.state
                    .send_modify(|state| state.connectivity = Connectivity::Online);
                *deadline = None;
                self.start_fetch(in_flight);
            }
            Trigger::Offline => {
                tracing::info!("offline");
                *deadline = None;
                if let Some(fetch) = in_flight.take() {
                    fetch.handle.abort();
                }
                self.state
                    .send_modify(|state| state.connectivity = Connectivity::Offline);
            }
            Trigger::Refresh => {
                if self.cache.get(&SNAPSHOT_KEY).is_some() {
                    tracing::debug!("refresh served from cache");
                } else {
                    self.start_fetch(in_flight);
                }
            }
        }
    }

    fn is_offline(&self) -> bool {
        self.state.borrow().connectivity == Connectivity::Offline
    }

    fn start_fetch(&mut self, in_flight: &mut Option<InFlight>) {
        self.generation += 1;
        if let Some(previous) = in_flight.take() {
            previous.handle.abort();
            tracing::debug!(
                cancelled = previous.generation,
                replacement = self.generation,
                "cancel-and-replace in-flight reconciliation"
            );
        }

        let source = Arc::clone(&self.source);
        let backoff = self.settings.backoff;
        let generation = self.generation;
        let handle =
            tokio::spawn(async move { fetch_with_retry(source.as_ref(), backoff, generation).await });
        *in_flight = Some(InFlight { generation, handle });
    }

    fn on_fetch_done(
        &mut self,
        generation: u64,
        joined: Result<Result<Snapshot, SyncError>, JoinError>,
    ) {
        match joined {
            Ok(Ok(snapshot)) => {
                let snapshot = Arc::new(snapshot);
                self.cache.set(SNAPSHOT_KEY, Arc::clone(&snapshot));
                self.state.send_modify(|state| {
                    state.snapshot = Some(snapshot);
                    state.connectivity = Connectivity::Online;
                    state.last_error = None;
                    state.fetches += 1;
                });
                tracing::info!(generation, "reconciliation applied");
            }
            Ok(Err(error)) => {
                tracing::warn!(generation, %error, "reconciliation failed");
                self.state.send_modify(|state| {
                    if error.is_transient() {
                        state.connectivity = Connectivity::Unreachable;
                    }
                    state.last_error = Some(error);
                });
            }
            Err(join_error) if join_error.is_cancelled() => {}
            Err(join_error) => {
                tracing::error!(generation, error = %join_error, "reconciliation task panicked");
                self.state.send_modify(|state| {
                    state.last_error = Some(SyncError::Fatal(join_error.to_string()));
                });
            }
        }
    }
}

// ── Update coordinator ──
//
// Owns the polling lifecycle for one device: a single timer drives
// `StatusAggregator::refresh`, the latest snapshot replaces the previous
// one, and every registered observer is called after each cycle.
// Polling only runs while at least one observer is registered.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use intercom_api::{Credentials, DeviceClient, DeviceIdentity, ResponseFailure};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::StatusAggregator;
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::model::{ChannelId, StatusSnapshot, SubsystemHealth};
use crate::stream::SnapshotStream;

// ── State ────────────────────────────────────────────────────────

/// Coordinator lifecycle, observable through [`UpdateCoordinator::watch_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CoordinatorState {
    /// No observers; the timer is not running.
    Idle,
    /// Timer running, waiting for the next tick.
    Polling,
    /// One refresh in flight.
    Refreshing,
}

/// Handle returned by [`UpdateCoordinator::register_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = dyn Fn(&Arc<StatusSnapshot>) + Send + Sync;

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: IndexMap<ObserverId, Arc<ObserverFn>>,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

// ── UpdateCoordinator ────────────────────────────────────────────

/// Periodic poller and observer fan-out for one device.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Observer registration
/// starts the poll task, so it must happen inside a Tokio runtime. The
/// poll task holds only a weak reference: dropping the last handle stops
/// polling even without [`shutdown`](Self::shutdown), but only `shutdown`
/// waits for the task to finish.
#[derive(Clone)]
pub struct UpdateCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: Arc<DeviceClient>,
    identity: DeviceIdentity,
    poll_interval: Duration,
    aggregator: Mutex<StatusAggregator>,
    snapshot: watch::Sender<Option<Arc<StatusSnapshot>>>,
    state: watch::Sender<CoordinatorState>,
    observers: StdMutex<Observers>,
    poller: StdMutex<Option<Poller>>,
    cancel: CancellationToken,
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl UpdateCoordinator {
    /// Build a client from `config`, fetch the identity, and run one
    /// initial refresh.
    ///
    /// Fails only if the client cannot be built, the device cannot be
    /// reached, or the identity cannot be read; degraded subsystems in the
    /// initial refresh are not errors.
    pub async fn setup(config: &DeviceConfig) -> Result<Self, CoreError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let client = DeviceClient::new(&config.host, credentials, &config.transport())?;
        Self::start(client, config.poll_interval).await
    }

    /// Same as [`setup`](Self::setup) for an already-built client.
    pub async fn start(client: DeviceClient, poll_interval: Duration) -> Result<Self, CoreError> {
        let identity = match client.fetch_identity().await {
            Ok(identity) => identity.clone(),
            Err(ResponseFailure::Transport) => {
                return Err(CoreError::ConnectionFailed {
                    url: client.base_url().to_string(),
                    reason: ResponseFailure::Transport.to_string(),
                });
            }
            Err(failure) => {
                debug!(%failure, "identity fetch failed");
                return Err(CoreError::IdentityUnavailable {
                    host: client.host().to_owned(),
                });
            }
        };
        info!(device_id = %identity.device_id, name = %identity.device_name, "device identified");

        let coordinator = Self::new(Arc::new(client), identity, poll_interval);
        coordinator.refresh_now().await;
        Ok(coordinator)
    }

    fn new(client: Arc<DeviceClient>, identity: DeviceIdentity, poll_interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (state, _) = watch::channel(CoordinatorState::Idle);

        Self {
            inner: Arc::new(CoordinatorInner {
                aggregator: Mutex::new(StatusAggregator::new(Arc::clone(&client))),
                client,
                identity,
                poll_interval,
                snapshot,
                state,
                observers: StdMutex::new(Observers::default()),
                poller: StdMutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn identity(&self) -> &DeviceIdentity {
        &self.inner.identity
    }

    pub fn client(&self) -> &Arc<DeviceClient> {
        &self.inner.client
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// The latest published snapshot.
    pub fn current_snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.inner.snapshot.borrow().clone()
    }

    /// Health flags of the latest snapshot; all false before the first one.
    pub fn health(&self) -> SubsystemHealth {
        self.inner
            .snapshot
            .borrow()
            .as_ref()
            .map(|s| s.health)
            .unwrap_or_default()
    }

    pub fn is_online(&self) -> bool {
        self.health().any()
    }

    pub fn state(&self) -> CoordinatorState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    /// Passive snapshot subscription; does not keep polling alive.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.subscribe())
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.inner.observers).entries.len()
    }

    // ── Observers ────────────────────────────────────────────────

    /// Register `callback` to receive every published snapshot.
    ///
    /// The first registration starts polling; the first cycle runs one
    /// interval later.
    pub fn register_observer<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Arc<StatusSnapshot>) + Send + Sync + 'static,
    {
        let mut observers = lock(&self.inner.observers);
        observers.next_id += 1;
        let id = ObserverId(observers.next_id);
        observers.entries.insert(id, Arc::new(callback));
        debug!(?id, count = observers.entries.len(), "observer registered");

        if observers.entries.len() == 1 {
            self.start_polling();
        }
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    ///
    /// Removing the last observer stops polling; a refresh already in
    /// flight completes and its result is discarded.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = lock(&self.inner.observers);
        if observers.entries.shift_remove(&id).is_none() {
            return false;
        }
        debug!(?id, count = observers.entries.len(), "observer removed");

        if observers.entries.is_empty() {
            self.stop_polling();
        }
        true
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one cycle now and publish it.
    ///
    /// Returns `false` without doing anything if a cycle is already in
    /// flight, or if the coordinator has been shut down.
    pub async fn refresh_now(&self) -> bool {
        if self.inner.cancel.is_cancelled() {
            return false;
        }
        self.run_cycle(&self.inner.cancel).await
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> bool {
        let Ok(mut aggregator) = self.inner.aggregator.try_lock() else {
            debug!("refresh already in flight, skipping");
            return false;
        };
        self.inner.state.send_replace(CoordinatorState::Refreshing);
        let snapshot = Arc::new(aggregator.refresh().await);
        drop(aggregator);

        if cancel.is_cancelled() {
            debug!("polling stopped during refresh, discarding result");
            self.settle_state();
            return false;
        }

        if !snapshot.online() {
            warn!(device_id = %self.inner.identity.device_id, "no subsystem answered");
        }
        self.inner.snapshot.send_replace(Some(Arc::clone(&snapshot)));
        self.settle_state();
        self.notify(&snapshot);
        true
    }

    /// Call observers in registration order. Each one is looked up again
    /// right before its call, so a removal made by an earlier callback
    /// (or another thread) takes effect within the same cycle.
    fn notify(&self, snapshot: &Arc<StatusSnapshot>) {
        let ids: Vec<ObserverId> = lock(&self.inner.observers).entries.keys().copied().collect();
        for id in ids {
            let callback = lock(&self.inner.observers).entries.get(&id).cloned();
            if let Some(callback) = callback {
                callback(snapshot);
            }
        }
    }

    // ── Control ──────────────────────────────────────────────────
    //
    // Issued immediately, outside the poll schedule. Callers apply their
    // own optimistic state on success; the next cycle overwrites it.

    pub async fn turn_on(&self, switch: &ChannelId) -> bool {
        self.inner.client.turn_on(&switch.to_string()).await
    }

    pub async fn turn_off(&self, switch: &ChannelId) -> bool {
        self.inner.client.turn_off(&switch.to_string()).await
    }

    pub async fn trigger(&self, switch: &ChannelId) -> bool {
        self.inner.client.trigger(&switch.to_string()).await
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop polling for good and drop all observers.
    ///
    /// Waits for an in-flight refresh to finish; its result is discarded.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        lock(&self.inner.observers).entries.clear();

        let poller = lock(&self.inner.poller).take();
        if let Some(poller) = poller {
            poller.cancel.cancel();
            let _ = poller.handle.await;
        }

        self.inner.state.send_replace(CoordinatorState::Idle);
        info!(device_id = %self.inner.identity.device_id, "coordinator shut down");
    }

    fn start_polling(&self) {
        let mut poller = lock(&self.inner.poller);
        if poller.is_some() || self.inner.cancel.is_cancelled() {
            return;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(poll_task(
            Arc::downgrade(&self.inner),
            self.inner.poll_interval,
            cancel.clone(),
        ));
        *poller = Some(Poller { cancel, handle });
        drop(poller);

        self.inner.state.send_replace(CoordinatorState::Polling);
        info!(interval = ?self.inner.poll_interval, "polling started");
    }

    fn stop_polling(&self) {
        let poller = lock(&self.inner.poller).take();
        if let Some(poller) = poller {
            poller.cancel.cancel();
            self.inner.state.send_replace(CoordinatorState::Idle);
            info!("last observer removed, polling stopped");
        }
    }

    fn settle_state(&self) {
        let next = if lock(&self.inner.poller).is_some() {
            CoordinatorState::Polling
        } else {
            CoordinatorState::Idle
        };
        self.inner.state.send_replace(next);
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Background task ──────────────────────────────────────────────

/// Tick every `poll_interval` until cancelled or until every
/// coordinator handle is gone. A tick that lands while a refresh is still
/// running is skipped rather than queued.
async fn poll_task(
    inner: Weak<CoordinatorInner>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                UpdateCoordinator { inner }.run_cycle(&cancel).await;
            }
        }
    }
    debug!("poll task exited");
}

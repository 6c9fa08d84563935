//! Mounted view lifecycle.
//!
//! A [`Page`] ties one [`Reconciler`] to a [`SnapshotSource`] and,
//! optionally, a [`LiveChannel`]:
//!
//! 1. `mount` issues the snapshot fetch, then opens the channel; events
//!    that arrive before the snapshot are buffered and replayed after it.
//! 2. A reconnect or an explicit [`Page::refresh`] starts a new snapshot
//!    cycle; only the latest request may land.
//! 3. `unmount` detaches the state, closes the channel and stops the
//!    event pump. Fetches still in flight finish but are discarded.
//!
//! State lives behind a `tokio::sync::Mutex` that is never held across
//! an await. Observers follow changes through [`Page::changes`].
//! Dropping a page without `unmount` still detaches it, even while the
//! state lock is taken.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use logitrack_client::ApiError;
use logitrack_live::{ChannelEvent, ChannelState, LiveChannel, LiveClient, ReconnectConfig};

use crate::error::ViewError;
use crate::reconciler::Reconciler;
use crate::sync::{LiveOutcome, SnapshotOutcome, SyncState, Ticket};

/// Upper bound on how long `unmount` waits for the event pump to stop.
const PUMP_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a page's initial state comes from.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Send + 'static;

    /// What is being loaded, e.g. `"orders"`. Used in error banners.
    fn context(&self) -> &'static str;

    async fn fetch(&self) -> Result<Self::Snapshot, ApiError>;
}

/// How a page subscribes to live updates.
#[derive(Clone)]
pub struct LiveOptions {
    pub client: LiveClient,
    /// `None` disables reconnection.
    pub reconnect: Option<ReconnectConfig>,
}

struct PageState<R> {
    sync: SyncState<R>,
    /// Banner for the last failed snapshot, cleared by the next success.
    error: Option<String>,
}

struct Shared<R: Reconciler> {
    state: Mutex<PageState<R>>,
    revision: watch::Sender<u64>,
    source: Arc<dyn SnapshotSource<Snapshot = R::Snapshot>>,
    /// Set once the page is gone; checked before touching `state`.
    detached: AtomicBool,
}

impl<R: Reconciler> Shared<R> {
    fn new<S>(view: R, source: S) -> Arc<Self>
    where
        S: SnapshotSource<Snapshot = R::Snapshot>,
    {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            state: Mutex::new(PageState {
                sync: SyncState::new(view),
                error: None,
            }),
            revision,
            source: Arc::new(source),
            detached: AtomicBool::new(false),
        })
    }

    fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Issue a ticket now, fetch in the background.
    async fn start_snapshot(self: &Arc<Self>) -> JoinHandle<SnapshotOutcome> {
        let ticket = self.state.lock().await.sync.begin_snapshot();
        tracing::debug!(context = self.source.context(), ticket, "Fetching snapshot");

        let shared = Arc::clone(self);
        tokio::spawn(async move { shared.finish_snapshot(ticket).await })
    }

    async fn finish_snapshot(&self, ticket: Ticket) -> SnapshotOutcome {
        let result = self.source.fetch().await;

        let mut state = self.state.lock().await;
        let outcome = match result {
            _ if self.is_detached() => SnapshotOutcome::Detached,
            Ok(snapshot) => {
                let outcome = state.sync.complete_snapshot(ticket, snapshot);
                if matches!(outcome, SnapshotOutcome::Applied { .. }) {
                    state.error = None;
                }
                outcome
            }
            Err(source) => {
                let outcome = state.sync.fail_snapshot(ticket);
                if matches!(outcome, SnapshotOutcome::Failed { .. }) {
                    let err = ViewError::Fetch {
                        context: self.source.context(),
                        source,
                    };
                    tracing::warn!(error = %err, "Snapshot fetch failed");
                    state.error = Some(err.banner());
                }
                outcome
            }
        };
        drop(state);

        match outcome {
            SnapshotOutcome::Applied { replayed } | SnapshotOutcome::Failed { replayed } => {
                tracing::debug!(context = self.source.context(), ticket, replayed, "Snapshot settled");
                self.bump();
            }
            SnapshotOutcome::Stale => {
                tracing::debug!(context = self.source.context(), ticket, "Dropped stale snapshot");
            }
            SnapshotOutcome::Detached => {
                tracing::debug!(context = self.source.context(), ticket, "Dropped snapshot for unmounted page");
            }
        }
        outcome
    }

    async fn apply_live(&self, envelope: logitrack_live::LiveEnvelope) {
        if self.is_detached() {
            return;
        }
        let outcome = self.state.lock().await.sync.apply_live(envelope);
        if outcome == LiveOutcome::Applied {
            self.bump();
        }
    }
}

/// A mounted view.
pub struct Page<R: Reconciler> {
    shared: Arc<Shared<R>>,
    cancel: CancellationToken,
    channel: Option<LiveChannel>,
    pump: Option<JoinHandle<()>>,
}

impl<R: Reconciler> Page<R> {
    /// Fetch the snapshot and, if `live` is given, subscribe to updates.
    pub async fn mount<S>(view: R, source: S, live: Option<LiveOptions>) -> Self
    where
        S: SnapshotSource<Snapshot = R::Snapshot>,
    {
        let shared = Shared::new(view, source);
        shared.start_snapshot().await;

        match live {
            Some(options) => {
                let (channel, events) = LiveChannel::open(options.client, options.reconnect);
                Self::attach(shared, Some(channel), Some(events))
            }
            None => Self::attach(shared, None, None),
        }
    }

    /// Mount fed by an existing event stream instead of a channel.
    pub async fn mount_with_events<S>(
        view: R,
        source: S,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self
    where
        S: SnapshotSource<Snapshot = R::Snapshot>,
    {
        let shared = Shared::new(view, source);
        shared.start_snapshot().await;
        Self::attach(shared, None, Some(events))
    }

    fn attach(
        shared: Arc<Shared<R>>,
        channel: Option<LiveChannel>,
        events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let pump = events
            .map(|events| tokio::spawn(pump_events(Arc::clone(&shared), events, cancel.clone())));
        Self {
            shared,
            cancel,
            channel,
            pump,
        }
    }

    /// Start a new snapshot cycle. The handle resolves once the fetch has
    /// settled; awaiting it is optional.
    pub async fn refresh(&self) -> JoinHandle<SnapshotOutcome> {
        self.shared.start_snapshot().await
    }

    /// Read the current view state.
    pub async fn view<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        let state = self.shared.state.lock().await;
        f(state.sync.view())
    }

    /// Banner for the last failed snapshot, if it has not been superseded
    /// by a successful one.
    pub async fn error(&self) -> Option<String> {
        self.shared.state.lock().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.shared.state.lock().await.sync.is_awaiting_snapshot()
    }

    /// Wait until no snapshot is outstanding.
    pub async fn loaded(&self) {
        let mut changes = self.changes();
        while self.is_loading().await {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Ticks once per visible state change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn channel_state(&self) -> Option<ChannelState> {
        self.channel.as_ref().map(LiveChannel::state)
    }

    /// Tear down: detach state, close the channel, stop the pump.
    pub async fn unmount(mut self) {
        self.shared.detach();
        self.shared.state.lock().await.sync.detach();
        self.cancel.cancel();

        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        if let Some(pump) = self.pump.take() {
            if tokio::time::timeout(PUMP_STOP_TIMEOUT, pump).await.is_err() {
                tracing::warn!("Timed out waiting for page event pump to stop");
            }
        }
        tracing::debug!(context = self.shared.source.context(), "Page unmounted");
    }
}

impl<R: Reconciler> Drop for Page<R> {
    fn drop(&mut self) {
        self.shared.detach();
        self.cancel.cancel();
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.sync.detach();
        }
    }
}

async fn pump_events<R: Reconciler>(
    shared: Arc<Shared<R>>,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => {
                match event {
                    Some(event) => event,
                    None => break,
                }
            }
        };

        match event {
            ChannelEvent::Envelope(envelope) => shared.apply_live(envelope).await,
            ChannelEvent::Opened { reconnected: true } => {
                tracing::info!(
                    context = shared.source.context(),
                    "Live channel reconnected, refreshing snapshot",
                );
                shared.start_snapshot().await;
            }
            ChannelEvent::Opened { reconnected: false } => {
                tracing::debug!(context = shared.source.context(), "Live channel open");
            }
            ChannelEvent::Error(error) => {
                tracing::warn!(context = shared.source.context(), %error, "Live channel error");
            }
            ChannelEvent::Disconnected => {
                tracing::info!(context = shared.source.context(), "Live channel disconnected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logitrack_core::orders::{Order, OrderStatus};
    use logitrack_live::LiveEnvelope;

    use crate::reconciler::WaitingQueue;

    fn waiting_order(id: i64) -> Order {
        Order {
            id,
            weight: Some(1.0),
            dimensions: None,
            product_type: None,
            destination_address: None,
            status: OrderStatus::Waiting,
            created_at: None,
        }
    }

    struct Ready;

    #[async_trait]
    impl SnapshotSource for Ready {
        type Snapshot = Vec<Order>;

        fn context(&self) -> &'static str {
            "orders"
        }

        async fn fetch(&self) -> Result<Vec<Order>, ApiError> {
            Ok(vec![waiting_order(1)])
        }
    }

    #[tokio::test]
    async fn drop_detaches_while_state_is_locked() {
        let shared = Shared::new(WaitingQueue::new(), Ready);
        let page = Page::attach(Arc::clone(&shared), None, None);
        let ticket = shared.state.lock().await.sync.begin_snapshot();

        let held = shared.state.lock().await;
        drop(page);
        drop(held);

        assert_eq!(shared.finish_snapshot(ticket).await, SnapshotOutcome::Detached);
        shared
            .apply_live(LiveEnvelope::NewOrder(waiting_order(2)))
            .await;

        let state = shared.state.lock().await;
        assert!(state.sync.view().is_empty());
        assert_eq!(*shared.revision.borrow(), 0);
    }
}

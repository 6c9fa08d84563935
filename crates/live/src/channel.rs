//! The per-page live update channel.
//!
//! [`LiveChannel::open`] spawns a background task that connects, reads
//! frames, parses them into [`LiveEnvelope`]s and forwards them to the
//! owner over an unbounded mpsc channel, in arrival order. The channel is
//! receive-only: it never sends application messages.
//!
//! Lifecycle: `Connecting → Open → Closing → Closed`. Errors are reported
//! as [`ChannelEvent::Error`] and do not change the state by themselves.
//! Closing is valid in any state, including `Connecting`. Dropping the
//! handle cancels the task and releases the connection.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::client::{LiveClient, WsStream};
use crate::messages::{parse_envelope, EnvelopeError, LiveEnvelope};
use crate::reconnect::{reconnect_loop, ReconnectConfig};

/// Upper bound on how long [`LiveChannel::close`] waits for the task.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// What the channel reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is open. `reconnected` is true for every connection
    /// after the first attempt; events may have been missed since the
    /// owner's last snapshot.
    Opened { reconnected: bool },
    Envelope(LiveEnvelope),
    /// The transport reported an error.
    Error(String),
    /// The server closed the connection or it dropped.
    Disconnected,
}

/// Handle to a running channel task.
pub struct LiveChannel {
    state: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveChannel {
    /// Start connecting in the background.
    ///
    /// With `reconnect = None` a dropped connection is final, and the
    /// channel ends in `Closed`.
    pub fn open(
        client: LiveClient,
        reconnect: Option<ReconnectConfig>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(client, reconnect, state_tx, event_tx, cancel.clone()));

        let channel = Self {
            state: state_rx,
            cancel,
            task: Some(task),
        };
        (channel, event_rx)
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Close the connection and wait for the task to finish, up to
    /// [`CLOSE_TIMEOUT`]. Safe in every state.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Live channel task failed"),
                Err(_) => tracing::warn!("Timed out waiting for live channel to close"),
            }
        }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

enum PumpExit {
    /// Owner closed the channel or stopped listening.
    Cancelled,
    /// The connection ended on the server side.
    Dropped,
}

async fn run(
    client: LiveClient,
    reconnect: Option<ReconnectConfig>,
    state: watch::Sender<ChannelState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    cancel: CancellationToken,
) {
    let mut pending = tokio::select! {
        _ = cancel.cancelled() => None,
        result = client.connect() => {
            match result {
                Ok(stream) => Some(stream),
                Err(e) => {
                    tracing::warn!(error = %e, "Live channel failed to connect");
                    let _ = events.send(ChannelEvent::Error(e.to_string()));
                    None
                }
            }
        }
    };
    let mut reconnected = false;

    loop {
        let stream = match pending.take() {
            Some(stream) => stream,
            None => match &reconnect {
                Some(config) if !cancel.is_cancelled() => {
                    state.send_replace(ChannelState::Connecting);
                    reconnected = true;
                    match reconnect_loop(&client, config, &cancel).await {
                        Some(stream) => stream,
                        None => break,
                    }
                }
                _ => break,
            },
        };

        state.send_replace(ChannelState::Open);
        if events.send(ChannelEvent::Opened { reconnected }).is_err() {
            break;
        }

        match pump(stream, &state, &events, &cancel).await {
            PumpExit::Cancelled => break,
            PumpExit::Dropped => {
                if events.send(ChannelEvent::Disconnected).is_err() {
                    break;
                }
            }
        }
    }

    state.send_replace(ChannelState::Closed);
    tracing::debug!(url = client.ws_url(), "Live channel closed");
}

/// Read frames until the connection ends or the channel is cancelled.
async fn pump(
    mut stream: WsStream,
    state: &watch::Sender<ChannelState>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                state.send_replace(ChannelState::Closing);
                if let Err(e) = stream.close(None).await {
                    tracing::debug!(error = %e, "Error sending close frame");
                }
                return PumpExit::Cancelled;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !dispatch(&text, events) {
                            state.send_replace(ChannelState::Closing);
                            let _ = stream.close(None).await;
                            return PumpExit::Cancelled;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary live frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Live channel closed by server");
                        return PumpExit::Dropped;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Live channel receive error");
                        let _ = events.send(ChannelEvent::Error(e.to_string()));
                        return PumpExit::Dropped;
                    }
                    None => return PumpExit::Dropped,
                }
            }
        }
    }
}

/// Parse one text frame and forward it. Returns false once the owner has
/// stopped listening.
fn dispatch(text: &str, events: &mpsc::UnboundedSender<ChannelEvent>) -> bool {
    match parse_envelope(text) {
        Ok(envelope) => {
            tracing::debug!(order_id = envelope.order_id(), "Live update received");
            events.send(ChannelEvent::Envelope(envelope)).is_ok()
        }
        Err(EnvelopeError::UnknownType(kind)) => {
            tracing::warn!(%kind, "Ignoring live message of unknown type");
            !events.is_closed()
        }
        Err(e) => {
            tracing::warn!(error = %e, raw_message = %text, "Discarding invalid live message");
            !events.is_closed()
        }
    }
}

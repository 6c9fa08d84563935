//! Live order-update channel.
//!
//! A receive-only WebSocket subscription that parses server-pushed JSON
//! envelopes and hands them to the owning view. See [`channel::LiveChannel`].

pub mod channel;
pub mod client;
pub mod messages;
pub mod reconnect;

pub use channel::{ChannelEvent, ChannelState, LiveChannel};
pub use client::{LiveClient, LiveClientError, DEFAULT_WS_URL};
pub use messages::{parse_envelope, EnvelopeError, LiveEnvelope, StatusUpdate};
pub use reconnect::ReconnectConfig;

//! Retry schedule for a dropped live channel.
//!
//! A page that asked for reconnection keeps its channel open across
//! server restarts: after a drop, [`reconnect_loop`] waits out the next
//! step of the schedule, dials again, and repeats until the socket is
//! back or the page unmounts.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{LiveClient, WsStream};

/// How long a dropped channel waits between dial attempts.
///
/// The wait starts at `initial_delay`, grows by `multiplier` after each
/// failed attempt and never exceeds `max_delay`. The default schedule is
/// 1, 2, 4, 8, 16, then 30 seconds for every later attempt.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// The wait that follows a failed attempt made after `previous`.
    pub fn delay_after(&self, previous: Duration) -> Duration {
        previous.mul_f64(self.multiplier).min(self.max_delay)
    }

    /// Every wait in order, starting with `initial_delay`. Never ends.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |&previous| {
            Some(self.delay_after(previous))
        })
    }
}

/// Dial until the channel is back, waiting out [`ReconnectConfig::schedule`]
/// before each attempt.
///
/// Returns `None` once `cancel` fires, which is how an unmounting page
/// stops a reconnect in progress.
pub async fn reconnect_loop(
    client: &LiveClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<WsStream> {
    for (attempt, delay) in (1u32..).zip(config.schedule()) {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(url = client.ws_url(), "Reconnect cancelled");
                return None;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        tracing::info!(
            url = client.ws_url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting live channel",
        );

        tokio::select! {
            _ = cancel.cancelled() => return None,
            result = client.connect() => {
                match result {
                    Ok(stream) => {
                        tracing::info!(url = client.ws_url(), attempt, "Live channel reconnected");
                        return Some(stream);
                    }
                    Err(e) => {
                        tracing::warn!(
                            url = client.ws_url(),
                            error = %e,
                            "Reconnect attempt {attempt} failed",
                        );
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(schedule: impl Iterator<Item = Duration>, n: usize) -> Vec<u64> {
        schedule.take(n).map(|d| d.as_secs()).collect()
    }

    #[test]
    fn default_schedule_settles_at_thirty_seconds() {
        let config = ReconnectConfig::default();
        assert_eq!(secs(config.schedule(), 8), vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn tuned_schedule_keeps_millisecond_steps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        };
        let waits: Vec<Duration> = config.schedule().take(4).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }

    #[test]
    fn first_wait_respects_the_cap() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(60),
            ..ReconnectConfig::default()
        };
        assert_eq!(secs(config.schedule(), 2), vec![30, 30]);
    }

    #[tokio::test]
    async fn unmounted_page_never_dials() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = LiveClient::new("ws://127.0.0.1:9");
        assert!(reconnect_loop(&client, &ReconnectConfig::default(), &cancel)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unmount_interrupts_failing_retries() {
        let cancel = CancellationToken::new();
        let client = LiveClient::new("ws://127.0.0.1:9");
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        };

        let unmount = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            unmount.cancel();
        });

        assert!(reconnect_loop(&client, &config, &cancel).await.is_none());
    }
}

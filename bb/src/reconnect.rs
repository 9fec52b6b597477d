//! Reconnect supervisor
//!
//! On transport loss, retries the chat session forever with a linearly growing,
//! capped wait between attempts. At most one attempt sequence runs at a time;
//! disconnect signals that arrive while one is running are ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::transport::Transport;

/// Wait after a failed attempt: `min(base * attempt, max)`
pub fn backoff_wait(base: Duration, max: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt).min(max)
}

/// Clears the active flag however the sequence ends
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct SupervisorInner {
    transport: Arc<dyn Transport>,
    identity: String,
    channel: String,
    base_wait: Duration,
    max_wait: Duration,
    active: AtomicBool,
}

impl SupervisorInner {
    async fn run_sequence(&self) {
        let _guard = ActiveGuard(&self.active);
        let mut attempt: u32 = 1;
        // Set once this sequence has its own session up but not yet joined
        let mut connected = false;

        loop {
            let wait = backoff_wait(self.base_wait, self.max_wait, attempt);

            if !connected {
                if self.transport.is_live() {
                    info!(attempt, "Transport already live, ending reconnect sequence");
                    return;
                }

                info!(attempt, identity = %self.identity, "Reconnect attempt");
                if let Err(e) = self.transport.connect(&self.identity).await {
                    warn!(attempt, error = %e, ?wait, "Reconnect failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt = attempt.saturating_add(1);
                    continue;
                }
                connected = true;
                info!(channel = %self.channel, "Reconnected, joining channel");
            }

            match self.transport.join(&self.channel).await {
                Ok(()) => {
                    info!(attempt, "Reconnect succeeded");
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, ?wait, "Join failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt = attempt.saturating_add(1);
                    // Session lost meanwhile: start over with a connect
                    connected = self.transport.is_live();
                }
            }
        }
    }
}

/// Re-establishes the chat session after unexpected disconnects
#[derive(Clone)]
pub struct ReconnectSupervisor {
    inner: Arc<SupervisorInner>,
}

impl ReconnectSupervisor {
    pub fn new(
        transport: Arc<dyn Transport>,
        identity: impl Into<String>,
        channel: impl Into<String>,
        base_wait: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                transport,
                identity: identity.into(),
                channel: channel.into(),
                base_wait,
                max_wait,
                active: AtomicBool::new(false),
            }),
        }
    }

    /// Build from the `irc` and `reconnect` config sections
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        debug!(nickname = %config.irc.nickname, channel = %config.irc.channel, "ReconnectSupervisor::from_config: called");
        Self::new(
            transport,
            config.irc.nickname.clone(),
            config.irc.channel.clone(),
            config.reconnect.base_wait(),
            config.reconnect.max_wait(),
        )
    }

    /// Whether an attempt sequence is running
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Handle a transport-loss event
    ///
    /// Starts a background attempt sequence and returns its task, or returns
    /// None if a sequence is already running.
    pub fn on_disconnect(&self) -> Option<JoinHandle<()>> {
        if self
            .inner
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Already reconnecting, ignoring disconnect");
            return None;
        }

        info!("Disconnected, starting reconnect sequence");
        let inner = self.inner.clone();
        Some(tokio::spawn(async move { inner.run_sequence().await }))
    }
}

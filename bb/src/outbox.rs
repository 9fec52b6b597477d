//! Outbox - outbound chat messages produced by the core
//!
//! Core components never talk to the chat transport directly. They push
//! [`Outbound`] messages into an unbounded channel and whoever owns the
//! transport drains it. Sending is fire-and-forget: if the receiver is gone the
//! message is dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A message the bot wants delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outbound {
    /// Message to the whole game channel
    Broadcast { text: String },

    /// Private message to a single participant
    Direct { target: String, text: String },
}

impl Outbound {
    /// Text body of the message
    pub fn text(&self) -> &str {
        match self {
            Outbound::Broadcast { text } => text,
            Outbound::Direct { text, .. } => text,
        }
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Broadcast { .. } => "broadcast",
            Outbound::Direct { .. } => "direct",
        }
    }
}

/// Receiving end drained by the transport owner
pub type OutboxReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Cloneable handle for emitting outbound messages
#[derive(Clone, Debug)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    /// Wrap an existing sender
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Emit a raw message
    pub fn send(&self, msg: Outbound) {
        debug!(kind = msg.kind(), text = msg.text(), "Outbox::send");
        // Ignore send errors (no receiver is OK)
        let _ = self.tx.send(msg);
    }

    /// Broadcast to the channel
    pub fn broadcast(&self, text: impl Into<String>) {
        self.send(Outbound::Broadcast { text: text.into() });
    }

    /// Reply privately to one participant
    pub fn direct(&self, target: impl Into<String>, text: impl Into<String>) {
        self.send(Outbound::Direct {
            target: target.into(),
            text: text.into(),
        });
    }

    /// Whether anyone is still draining the outbox
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected outbox and receiver pair
pub fn create_outbox() -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox::new(tx), rx)
}

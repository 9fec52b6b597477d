//! BoardBot - coordination core for a board game referee bot
//!
//! BoardBot sits in a chat channel next to the players of a physical board
//! game. It keeps a shared map image up to date and now and then collects
//! numbers from designated players before a deadline. Chat plumbing and command
//! parsing live outside this crate; everything that has to stay correct under
//! concurrency lives here.
//!
//! # Core Concepts
//!
//! - **Rendezvous**: one timed "collect a number from each of these players"
//!   interaction at a time, ended by completion, deadline, or manual stop
//! - **Serial Update Queue**: a single worker task is the only writer of the
//!   shared artifact, applying draw/replace tasks in submission order
//! - **Reconnect Supervisor**: retries the chat session with capped linear
//!   backoff, never running two attempt sequences at once
//!
//! # Modules
//!
//! - [`rendezvous`] - Timed single-slot rendezvous
//! - [`queue`] - Serial update queue and rendering collaborators
//! - [`reconnect`] - Backoff reconnect supervisor
//! - [`transport`] - Chat transport collaborator trait
//! - [`outbox`] - Outbound broadcast and directed messages
//! - [`bot`] - Coordinator owning the three mechanisms
//! - [`dice`] - Dice pools and per-player roll table
//! - [`palette`] - Owner/category to colour mapping
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod bot;
pub mod cli;
pub mod config;
pub mod dice;
pub mod outbox;
pub mod palette;
pub mod queue;
pub mod reconnect;
pub mod rendezvous;
pub mod transport;

// Re-export commonly used types
pub use bot::Bot;
pub use config::Config;
pub use dice::{DiceError, DiceTable, DiceVariant, Roll};
pub use outbox::{Outbound, Outbox, OutboxReceiver, create_outbox};
pub use palette::{Category, Palette};
pub use queue::{
    CollaboratorError, CommandRenderer, CompanionNotifier, Locator, QueueMetrics, Renderer, UpdateNotifier,
    UpdateQueue, UpdateTask, stage_fresh,
};
pub use reconnect::{ReconnectSupervisor, backoff_wait};
pub use rendezvous::{
    Rendezvous, RendezvousConfig, RendezvousError, RejectReason, SessionSnapshot, SubmitOutcome,
};
pub use transport::{OfflineTransport, Transport, TransportError};

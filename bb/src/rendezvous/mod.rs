//! Timed rendezvous for collecting numbers from designated players
//!
//! At most one session is live at a time. A session ends in exactly one of
//! three ways:
//! - **Completion:** every expected participant has contributed a value
//! - **Deadline:** the timer fires before completion
//! - **Stop:** the session is cancelled manually

mod config;
mod core;
mod messages;

pub use config::RendezvousConfig;
pub use core::Rendezvous;
pub use messages::{RejectReason, RendezvousError, SessionSnapshot, SubmitOutcome};

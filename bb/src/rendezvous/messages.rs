//! Result and error types for the rendezvous

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned to whoever drove the rendezvous
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendezvousError {
    #[error("another rendezvous is already active")]
    AlreadyActive,

    #[error("no active rendezvous")]
    NoActiveSession,

    #[error("{0} is not expected to contribute")]
    NotExpected(String),

    #[error("rendezvous needs at least one participant")]
    NoParticipants,
}

/// Why a contribution was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Input was not a plain non-negative integer
    NotANumber { min: u8, max: u8 },

    /// Input was numeric but outside the accepted range
    OutOfRange { min: u8, max: u8 },
}

impl RejectReason {
    /// Reply sent privately to the contributor
    pub fn reply(&self) -> String {
        match self {
            RejectReason::NotANumber { min, max } => format!("send a number {}-{}.", min, max),
            RejectReason::OutOfRange { min, max } => format!("number must be {}-{}.", min, max),
        }
    }
}

/// Outcome of a submission against a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Value recorded; `completed` is true when it was the last one missing
    Accepted { value: u8, completed: bool },

    /// Value refused; session untouched
    Rejected(RejectReason),
}

/// Read-only view of the live session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub tag: String,
    pub expected: Vec<String>,
    pub collected: BTreeMap<String, u8>,
    pub timeout: Duration,
    pub remaining: Duration,
}

impl SessionSnapshot {
    /// Expected participants that have not contributed yet
    pub fn missing(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|p| !self.collected.contains_key(p.as_str()))
            .map(String::as_str)
            .collect()
    }
}

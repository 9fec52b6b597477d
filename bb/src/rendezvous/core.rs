//! Rendezvous session state and its terminal transitions

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::RendezvousConfig;
use super::messages::{RejectReason, RendezvousError, SessionSnapshot, SubmitOutcome};
use crate::outbox::Outbox;

/// The live session
struct Session {
    id: Uuid,
    tag: String,
    expected: Vec<String>,
    collected: HashMap<String, u8>,
    timeout: Duration,
    deadline: Instant,
    timer: Option<AbortHandle>,
}

impl Session {
    fn is_complete(&self) -> bool {
        self.expected.iter().all(|p| self.collected.contains_key(p))
    }

    fn missing(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|p| !self.collected.contains_key(*p))
            .map(String::as_str)
            .collect()
    }

    /// Collected values in the order of `expected`, missing ones as 0
    fn ordered_values(&self) -> Vec<u8> {
        self.expected
            .iter()
            .map(|p| self.collected.get(p).copied().unwrap_or(0))
            .collect()
    }
}

struct Inner {
    config: RendezvousConfig,
    outbox: Outbox,
    /// Liveness flag; acquired with compare-and-set so `start` never waits
    active: AtomicBool,
    slot: Mutex<Option<Session>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the session out of the slot, disarm its timer and release the
    /// liveness flag. Returns None when there was nothing to tear down.
    fn teardown(&self, slot: &mut Option<Session>) -> Option<Session> {
        let mut session = slot.take()?;
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
        self.active.store(false, Ordering::SeqCst);
        debug!(session_id = %session.id, tag = %session.tag, "Rendezvous::teardown: session cleared");
        Some(session)
    }

    /// Deadline callback
    fn expire(&self, id: Uuid) {
        debug!(session_id = %id, "Rendezvous::expire: called");
        let mut slot = self.lock();

        if slot.as_ref().map(|s| s.id) != Some(id) {
            debug!(session_id = %id, "Rendezvous::expire: session already terminated");
            return;
        }

        if let Some(session) = self.teardown(&mut slot) {
            let missing = session.missing();
            let text = if missing.is_empty() {
                format!("!go{} timed out.", session.tag)
            } else {
                format!("!go{} timed out. Missing numbers from: {}", session.tag, missing.join(", "))
            };
            warn!(tag = %session.tag, ?missing, "Rendezvous timed out");
            self.outbox.broadcast(text);
        }
    }
}

/// Single-slot timed rendezvous
///
/// Cloneable handle; all clones share the same slot. `start`, `submit` and
/// `stop` never await. They must be called from within a tokio runtime since
/// `start` spawns the deadline timer.
#[derive(Clone)]
pub struct Rendezvous {
    inner: Arc<Inner>,
}

impl Rendezvous {
    /// Create an idle rendezvous
    pub fn new(config: RendezvousConfig, outbox: Outbox) -> Self {
        debug!(?config, "Rendezvous::new: called");
        Self {
            inner: Arc::new(Inner {
                config,
                outbox,
                active: AtomicBool::new(false),
                slot: Mutex::new(None),
            }),
        }
    }

    /// Configuration this rendezvous was built with
    pub fn config(&self) -> &RendezvousConfig {
        &self.inner.config
    }

    /// Whether a session is live
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Start a session with the configured participants, using `timeout` or
    /// the configured default
    pub fn start_default(&self, tag: &str, timeout: Option<Duration>) -> Result<Uuid, RendezvousError> {
        let timeout = timeout.unwrap_or_else(|| self.inner.config.default_timeout());
        let participants = self.inner.config.participants.clone();
        self.start(tag, &participants, timeout)
    }

    /// Start a session
    ///
    /// Fails with `AlreadyActive` without side effects if a session is live.
    pub fn start(&self, tag: &str, expected: &[String], timeout: Duration) -> Result<Uuid, RendezvousError> {
        debug!(%tag, ?expected, ?timeout, "Rendezvous::start: called");

        let mut participants: Vec<String> = Vec::with_capacity(expected.len());
        for p in expected {
            let p = p.trim().to_lowercase();
            if !p.is_empty() && !participants.contains(&p) {
                participants.push(p);
            }
        }
        if participants.is_empty() {
            return Err(RendezvousError::NoParticipants);
        }

        if self
            .inner
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%tag, "Rendezvous::start: another session is live");
            return Err(RendezvousError::AlreadyActive);
        }

        let id = Uuid::now_v7();
        let mut slot = self.inner.lock();

        // The timer needs the slot lock to act, so it cannot fire before the
        // session below is installed.
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });

        self.inner.outbox.broadcast(format!(
            "!go{} started. Waiting for numbers from {}. Timeout: {}",
            tag,
            participants.join(", "),
            format_timeout(timeout)
        ));

        *slot = Some(Session {
            id,
            tag: tag.to_string(),
            expected: participants,
            collected: HashMap::new(),
            timeout,
            deadline: Instant::now() + timeout,
            timer: Some(timer.abort_handle()),
        });

        info!(session_id = %id, %tag, ?timeout, "Rendezvous started");
        Ok(id)
    }

    /// Submit a raw value from a participant
    ///
    /// The last expected contribution completes the session before this
    /// returns.
    pub fn submit(&self, participant: &str, raw: &str) -> Result<SubmitOutcome, RendezvousError> {
        debug!(%participant, %raw, "Rendezvous::submit: called");
        let config = &self.inner.config;
        let mut slot = self.inner.lock();
        let session = slot.as_mut().ok_or(RendezvousError::NoActiveSession)?;

        let who = participant.trim().to_lowercase();
        if !session.expected.contains(&who) {
            debug!(%who, "Rendezvous::submit: participant not expected");
            return Err(RendezvousError::NotExpected(who));
        }

        let value = match parse_value(raw, config) {
            Ok(value) => value,
            Err(reason) => {
                debug!(%who, ?reason, "Rendezvous::submit: rejected");
                self.inner.outbox.direct(&who, reason.reply());
                return Ok(SubmitOutcome::Rejected(reason));
            }
        };

        session.collected.insert(who.clone(), value);
        self.inner
            .outbox
            .direct(&who, format!("number {} received for !go{}.", value, session.tag));

        if !session.is_complete() {
            return Ok(SubmitOutcome::Accepted {
                value,
                completed: false,
            });
        }

        if let Some(session) = self.inner.teardown(&mut slot) {
            let values: Vec<String> = session.ordered_values().iter().map(u8::to_string).collect();
            info!(tag = %session.tag, ?values, "Rendezvous completed");
            self.inner
                .outbox
                .broadcast(format!("go{} resulted in {}", session.tag, values.join(" + ")));
        }

        Ok(SubmitOutcome::Accepted { value, completed: true })
    }

    /// Cancel the live session
    pub fn stop(&self) -> Result<(), RendezvousError> {
        debug!("Rendezvous::stop: called");
        let mut slot = self.inner.lock();
        let session = self.inner.teardown(&mut slot).ok_or(RendezvousError::NoActiveSession)?;

        info!(tag = %session.tag, "Rendezvous stopped manually");
        self.inner
            .outbox
            .broadcast(format!("!go{} stopped manually.", session.tag));
        Ok(())
    }

    /// Read-only view of the live session, if any
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let slot = self.inner.lock();
        slot.as_ref().map(|s| SessionSnapshot {
            id: s.id,
            tag: s.tag.clone(),
            expected: s.expected.clone(),
            collected: s.collected.iter().map(|(k, v)| (k.clone(), *v)).collect::<BTreeMap<_, _>>(),
            timeout: s.timeout,
            remaining: s.deadline.saturating_duration_since(Instant::now()),
        })
    }
}

fn parse_value(raw: &str, config: &RendezvousConfig) -> Result<u8, RejectReason> {
    let (min, max) = (config.min_value, config.max_value);
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RejectReason::NotANumber { min, max });
    }

    // All digits, so a parse failure can only be overflow
    match raw.parse::<u64>() {
        Ok(v) if config.accepts(v) => Ok(v as u8),
        _ => Err(RejectReason::OutOfRange { min, max }),
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

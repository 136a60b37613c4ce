//! Player sessions and their event queues.
//!
//! Each session owns an inbound queue (commands the player posted) and an
//! outbound queue (events waiting to be polled). Transport handlers push
//! and drain these from their own threads while the world's scheduler
//! works on the other end, so both are mutex-guarded and every lock is
//! held only for a single push or drain.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tods_types::{Event, PlayerId};

/// A FIFO of events shared between threads.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.lock().push_back(event);
    }

    /// Take the oldest event, if any.
    pub fn pop(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    /// Take every queued event, oldest first.
    pub fn drain_all(&self) -> Vec<Event> {
        self.lock().drain(..).collect()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A registered player.
#[derive(Debug)]
pub struct PlayerSession {
    id: PlayerId,
    online: AtomicBool,
    draining: AtomicBool,
    created_at: DateTime<Utc>,
    /// Commands posted by the player, waiting for its drain entry.
    pub inbound: EventQueue,
    /// Events waiting to be polled by the player.
    pub outbound: EventQueue,
}

impl PlayerSession {
    fn new(id: PlayerId) -> Self {
        Self {
            id,
            online: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            created_at: Utc::now(),
            inbound: EventQueue::new(),
            outbound: EventQueue::new(),
        }
    }

    /// The player's id.
    pub const fn id(&self) -> &PlayerId {
        &self.id
    }

    /// When the session was first registered.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the player is currently registered.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    /// Claim the right to run this player's command drain.
    ///
    /// Returns `true` when the caller became the drainer, `false` when a
    /// drain is already running.
    pub fn claim_drain(&self) -> bool {
        !self.draining.swap(true, Ordering::AcqRel)
    }

    /// Give up the drain claim.
    pub fn release_drain(&self) {
        self.draining.store(false, Ordering::Release);
    }

    /// Whether a drain entry is currently running for this player.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

/// Player counts reported by the transport's index route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Sessions ever registered.
    pub players: usize,
    /// Sessions currently online.
    pub online: usize,
}

/// All sessions, keyed by player id. Sessions are never destroyed.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<BTreeMap<PlayerId, Arc<PlayerSession>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reactivate a session and mark it online.
    pub fn activate(&self, id: &PlayerId) -> Arc<PlayerSession> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(PlayerSession::new(id.clone())));
        session.set_online(true);
        Arc::clone(session)
    }

    /// Mark a session offline. Returns `false` for unknown players.
    pub fn deactivate(&self, id: &PlayerId) -> bool {
        self.get(id).is_some_and(|session| {
            session.set_online(false);
            true
        })
    }

    /// Look up a session.
    pub fn get(&self, id: &PlayerId) -> Option<Arc<PlayerSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Every online session, ordered by player id.
    pub fn online(&self) -> Vec<Arc<PlayerSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|session| session.is_online())
            .cloned()
            .collect()
    }

    /// Player counts.
    pub fn status(&self) -> SessionStatus {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        SessionStatus {
            players: sessions.len(),
            online: sessions.values().filter(|s| s.is_online()).count(),
        }
    }
}

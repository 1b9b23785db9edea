//! Quiz, review and timed-challenge sessions.

pub mod challenge;
pub mod countdown;
pub mod drill;
pub mod grading;
pub mod model;
pub mod routes;
pub mod service;

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use uuid::Uuid;

pub use challenge::ChallengeSession;
pub use countdown::Countdown;
pub use drill::DrillSession;
pub use model::Summary;
pub use routes::routes;

/// Rejected session transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is not accepting answers")]
    NotActive,
    #[error("Question has already been answered")]
    AlreadyAnswered,
    #[error("Answer the current question first")]
    NotAnswered,
    #[error("Session results were already recorded")]
    AlreadyEmitted,
    #[error("Time is up")]
    TimeUp,
    #[error("Answer must not be empty")]
    EmptyAnswer,
    #[error("Previous answer is still being evaluated")]
    Evaluating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Quiz,
    Review,
    Challenge,
}

impl SessionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Review => "review",
            Self::Challenge => "challenge",
        }
    }
}

/// Session lifecycle.
///
/// `Loading → Active → Evaluating → Answered → (Active | Complete) → Emitted`,
/// or `Exited` from anywhere before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Loading,
    Active,
    Evaluating,
    Answered,
    Complete,
    Emitted,
    Exited,
}

/// A registered session
#[derive(Debug)]
pub enum Session {
    Drill(DrillSession),
    Challenge(ChallengeSession),
    /// Results recorded; only the summary remains
    Finished(Summary),
}

impl Session {
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Drill(drill) => drill.kind(),
            Self::Challenge(_) => SessionKind::Challenge,
            Self::Finished(summary) => summary.kind,
        }
    }
}

pub type SessionSlot = Arc<Mutex<Session>>;

#[derive(Debug)]
struct Entry {
    slot: SessionSlot,
    last_seen: Instant,
}

/// In-flight and finished sessions by id.
///
/// Sessions nobody has looked at for a while are dropped by [`sweep`](Self::sweep).
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a fresh id
    pub async fn insert(&self, session: Session) -> (Uuid, SessionSlot) {
        let id = Uuid::new_v4();
        let slot = Arc::new(Mutex::new(session));
        let entry = Entry {
            slot: Arc::clone(&slot),
            last_seen: Instant::now(),
        };
        self.entries.write().await.insert(id, entry);
        (id, slot)
    }

    /// Look up a session and mark it as seen
    pub async fn get(&self, id: Uuid) -> Option<SessionSlot> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.slot))
    }

    pub async fn remove(&self, id: Uuid) -> Option<SessionSlot> {
        self.entries.write().await.remove(&id).map(|entry| entry.slot)
    }

    /// Drop sessions unseen for at least `idle`. A session busy grading is
    /// kept until the next sweep. Returns how many were dropped.
    pub async fn sweep(&self, idle: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.last_seen.elapsed() < idle || entry.slot.try_lock().is_err()
        });
        before - entries.len()
    }

    /// Number of registered sessions
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished() -> Session {
        Session::Finished(Summary::empty(SessionKind::Review, 0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_idle_sessions() {
        let registry = SessionRegistry::new();
        let ttl = Duration::from_secs(600);

        let (stale, _) = registry.insert(finished()).await;
        let (watched, _) = registry.insert(finished()).await;

        tokio::time::sleep(Duration::from_secs(400)).await;
        assert!(registry.get(watched).await.is_some());
        assert_eq!(registry.sweep(ttl).await, 0);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(registry.sweep(ttl).await, 1);
        assert!(registry.get(stale).await.is_none());
        assert!(registry.get(watched).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_busy_session() {
        let registry = SessionRegistry::new();
        let (id, slot) = registry.insert(finished()).await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        let guard = slot.lock().await;
        assert_eq!(registry.sweep(Duration::from_secs(30)).await, 0);
        drop(guard);

        assert_eq!(registry.sweep(Duration::from_secs(30)).await, 1);
        assert!(registry.get(id).await.is_none());
    }
}

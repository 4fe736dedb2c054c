use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;
use crate::registration::draft::RegistrationDraft;
use crate::registration::machine::Step;

/// Wizard position and answers of one user's registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub step: Step,
    pub draft: RegistrationDraft,
}

#[derive(Debug)]
struct Entry {
    session: Session,
    touched: Instant,
}

/// In-memory registration sessions keyed by Telegram user id, with idle expiry.
///
/// Lost on restart. The lock is only held for map operations, never across
/// an await on IO.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<i64, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Store with the idle expiry from SESSION_TTL_SECS
    pub fn from_env() -> Self {
        Self::new(config::session::ttl())
    }

    fn is_live(&self, entry: &Entry) -> bool {
        entry.touched.elapsed() < self.ttl
    }

    /// Current session of `user_id`; an expired one is dropped on the way.
    pub async fn get(&self, user_id: i64) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&user_id) {
            Some(entry) if self.is_live(entry) => Some(entry.session.clone()),
            Some(_) => {
                sessions.remove(&user_id);
                log::info!("Registration session of user {} expired", user_id);
                None
            }
            None => None,
        }
    }

    /// Creates or replaces the session and resets its idle timer.
    pub async fn put(&self, user_id: i64, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            user_id,
            Entry {
                session,
                touched: Instant::now(),
            },
        );
    }

    /// Removes and returns a live session. Of two callers racing for the
    /// same session only one gets it.
    pub async fn take(&self, user_id: i64) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.remove(&user_id)?;
        if self.is_live(&entry) {
            Some(entry.session)
        } else {
            None
        }
    }

    pub async fn remove(&self, user_id: i64) -> bool {
        self.sessions.lock().await.remove(&user_id).is_some()
    }

    /// Drops every expired session, returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.touched.elapsed() < ttl);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

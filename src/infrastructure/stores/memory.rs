#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use dashmap::DashMap;

use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::SessionStore;

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<String, Session>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        return self.sessions.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.sessions.is_empty();
    }

    /// Number of successful inserts and updates so far.
    pub fn writes(&self) -> usize {
        return self.writes.load(Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[allow(clippy::implicit_return)]
    async fn select_by_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut sessions = self
            .sessions
            .iter()
            .filter(|entry| return entry.value().user_id == user_id)
            .map(|entry| return entry.value().clone())
            .collect::<Vec<Session>>();

        sessions.sort_by_cached_key(|session| {
            return DateTime::parse_from_rfc3339(&session.created_at).ok();
        });
        sessions.reverse();

        return Ok(sessions);
    }

    #[allow(clippy::implicit_return)]
    async fn select_by_session_id(&self, session_id: &str) -> Result<Option<Session>> {
        return Ok(self
            .sessions
            .get(session_id)
            .map(|entry| return entry.value().clone()));
    }

    #[allow(clippy::implicit_return)]
    async fn exists(&self, session_id: &str) -> Result<bool> {
        return Ok(self.sessions.contains_key(session_id));
    }

    #[allow(clippy::implicit_return)]
    async fn insert(&self, session: &Session) -> Result<()> {
        if self.sessions.contains_key(&session.session_id) {
            bail!(format!("Session {} already exists", session.session_id));
        }

        self.sessions
            .insert(session.session_id.to_string(), session.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn update(
        &self,
        session_id: &str,
        messages: &[Message],
        updated_at: &str,
    ) -> Result<()> {
        let Some(mut session) = self.sessions.get_mut(session_id) else {
            bail!(format!("No session found for id {session_id}"));
        };

        session.messages = messages.to_vec();
        session.updated_at = updated_at.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.remove(session_id);
        return Ok(());
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use anyhow::Result;
use chrono::DateTime;

use super::SessionSynchronizer;
use crate::domain::models::Session;
use crate::domain::models::SessionContext;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HistoryState {
    /// Never loaded, or invalidated by an identity change.
    Stale,
    Loaded,
}

/// The signed in user's past sessions, newest first.
pub struct HistoryList {
    pub sessions: Vec<Session>,
    pub state: HistoryState,
}

impl Default for HistoryList {
    fn default() -> HistoryList {
        return HistoryList {
            sessions: vec![],
            state: HistoryState::Stale,
        };
    }
}

fn created_at_millis(session: &Session) -> i64 {
    return DateTime::parse_from_rfc3339(&session.created_at)
        .map(|date| return date.timestamp_millis())
        .unwrap_or(0);
}

impl HistoryList {
    /// Fetches every session owned by `user_id`. On failure the error is
    /// logged and returned, and the previous list stays in place.
    pub async fn load_for_user(&mut self, sync: &SessionSynchronizer, user_id: &str) -> Result<()> {
        let mut sessions = match sync.store().select_by_user(user_id).await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::error!(err = ?err, user_id, "Failed to load chat history");
                return Err(err);
            }
        };

        sessions.sort_by_key(|session| return std::cmp::Reverse(created_at_millis(session)));

        self.sessions = sessions;
        self.state = HistoryState::Loaded;
        return Ok(());
    }

    /// 1-based lookup, matching the numbering printed in listings.
    pub fn get(&self, idx: usize) -> Option<&Session> {
        if idx == 0 {
            return None;
        }

        return self.sessions.get(idx - 1);
    }

    pub async fn select(
        &self,
        sync: &SessionSynchronizer,
        ctx: &mut SessionContext,
        session_id: &str,
    ) -> Result<()> {
        return sync.load(ctx, session_id).await;
    }

    pub async fn remove(
        &mut self,
        sync: &SessionSynchronizer,
        ctx: &mut SessionContext,
        session_id: &str,
    ) -> Result<()> {
        sync.delete_session(ctx, session_id).await?;
        self.sessions
            .retain(|session| return session.session_id != session_id);

        return Ok(());
    }

    pub fn mark_stale(&mut self) {
        self.state = HistoryState::Stale;
    }

    pub fn clear(&mut self) {
        self.sessions = vec![];
        self.state = HistoryState::Stale;
    }

    pub fn is_empty(&self) -> bool {
        return self.sessions.is_empty();
    }

    pub fn format(&self, active_session_id: &str) -> String {
        if self.sessions.is_empty() {
            return "No chat history yet.".to_string();
        }

        return self
            .sessions
            .iter()
            .enumerate()
            .map(|(idx, session)| {
                let marker = if session.session_id == active_session_id {
                    "*"
                } else {
                    " "
                };

                return format!(
                    "{marker} {}. {} - {}",
                    idx + 1,
                    session.display_title(),
                    session.preview()
                );
            })
            .collect::<Vec<String>>()
            .join("\n");
    }
}

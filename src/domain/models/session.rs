#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::now_timestamp;
use super::truncate_chars;
use super::Message;

const TITLE_MAX_CHARS: usize = 30;
const PREVIEW_MAX_CHARS: usize = 25;
pub const DEFAULT_TITLE: &str = "Chat Session";

/// A persisted conversation, matching a row of the `chat_sessions` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            if !title.is_empty() {
                return title.to_string();
            }
        }

        return "Chat".to_string();
    }

    /// Short text for history listings, built from the first user message.
    pub fn preview(&self) -> String {
        if self.messages.is_empty() {
            return "Empty chat".to_string();
        }

        if let Some(first) = self.messages.iter().find(|msg| return msg.is_user()) {
            return truncate_chars(&first.text, PREVIEW_MAX_CHARS);
        }

        return "No messages".to_string();
    }
}

/// Title for a transcript, taken from the leading characters of its first user
/// message.
pub fn derive_title(messages: &[Message]) -> Option<String> {
    return messages
        .iter()
        .find(|msg| return msg.is_user())
        .map(|msg| return truncate_chars(&msg.text, TITLE_MAX_CHARS));
}

/// The active session of a client. Every synchronizer call receives it
/// explicitly.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub created_at: String,
    pub messages: Vec<Message>,
    pub loading: bool,
    /// Set by `push`, cleared once the transcript reached the store.
    unsaved: bool,
}

impl Default for SessionContext {
    fn default() -> SessionContext {
        return SessionContext::new(None);
    }
}

impl SessionContext {
    pub fn new(user_id: Option<String>) -> SessionContext {
        return SessionContext {
            session_id: SessionContext::create_id(),
            user_id,
            title: None,
            created_at: now_timestamp(),
            messages: vec![],
            loading: false,
            unsaved: false,
        };
    }

    pub fn create_id() -> String {
        let token = Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("");

        return format!("session_{token}");
    }

    /// Swaps in a fresh session id and clears the transcript. The user is kept.
    pub fn reset(&mut self) {
        self.session_id = SessionContext::create_id();
        self.title = None;
        self.created_at = now_timestamp();
        self.messages = vec![];
        self.loading = false;
        self.unsaved = false;
    }

    /// Replaces the transcript with a persisted session, making it active.
    pub fn replace_with(&mut self, session: Session) {
        self.session_id = session.session_id;
        self.title = session.title;
        self.created_at = session.created_at;
        self.messages = session.messages;
        self.loading = false;
        self.unsaved = false;
    }

    pub fn push(&mut self, message: Message) {
        if self.title.is_none() && message.is_user() {
            self.title = derive_title(&[message.clone()]);
        }
        self.messages.push(message);
        self.unsaved = true;
    }

    /// True when messages were pushed since the last successful write.
    pub fn has_unsaved_messages(&self) -> bool {
        return self.user_id.is_some() && self.unsaved && !self.messages.is_empty();
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    pub fn to_session(&self, updated_at: &str) -> Option<Session> {
        let user_id = self.user_id.as_ref()?;
        let title = self
            .title
            .clone()
            .or_else(|| return derive_title(&self.messages))
            .unwrap_or_else(|| return DEFAULT_TITLE.to_string());

        return Some(Session {
            session_id: self.session_id.to_string(),
            user_id: user_id.to_string(),
            title: Some(title),
            messages: self.messages.clone(),
            created_at: self.created_at.to_string(),
            updated_at: updated_at.to_string(),
        });
    }
}

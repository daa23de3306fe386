use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::Message;
use super::Session;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreName {
    Supabase,
    Local,
    Memory,
}

impl StoreName {
    pub fn parse(text: String) -> Option<StoreName> {
        return StoreName::iter().find(|e| return e.to_string() == text);
    }
}

/// Remote table of chat sessions. Access control is the store's concern: a
/// record is only visible to the identity that owns it.
#[async_trait]
pub trait SessionStore {
    /// Re-scopes later requests to a new identity. `None` falls back to the
    /// store's anonymous credentials. Stores without access control ignore it.
    fn set_access_token(&self, _access_token: Option<String>) {}

    /// Every session owned by `user_id`, newest first.
    async fn select_by_user(&self, user_id: &str) -> Result<Vec<Session>>;

    /// The full record for `session_id`, or `None` if there is no such row.
    async fn select_by_session_id(&self, session_id: &str) -> Result<Option<Session>>;

    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Creates a new row. Fails if the session id is already taken.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Overwrites the transcript of an existing row. Title and creation time
    /// are left alone.
    async fn update(&self, session_id: &str, messages: &[Message], updated_at: &str)
        -> Result<()>;

    async fn delete(&self, session_id: &str) -> Result<()>;
}

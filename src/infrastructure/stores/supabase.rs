#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;

use std::sync::RwLock;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::SessionStore;

const TABLE: &str = "chat_sessions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionIdRow {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    messages: &'a [Message],
    updated_at: &'a str,
}

/// PostgREST client for the `chat_sessions` table. Requests carry the signed
/// in user's token so row level security scopes them to that user, or the
/// anon key when nobody is signed in.
pub struct SupabaseStore {
    url: String,
    key: String,
    access_token: RwLock<Option<String>>,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(url: String, key: String, access_token: Option<String>) -> SupabaseStore {
        return SupabaseStore {
            url: url.trim_end_matches('/').to_string(),
            key,
            access_token: RwLock::new(access_token),
            client: reqwest::Client::new(),
        };
    }

    fn table_url(&self) -> String {
        return format!("{url}/rest/v1/{TABLE}", url = self.url);
    }

    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(access_token) => access_token.clone(),
            Err(_) => None,
        };

        return format!("Bearer {}", token.unwrap_or_else(|| return self.key.to_string()));
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        return self
            .client
            .request(method, self.table_url())
            .header("apikey", &self.key)
            .header("Authorization", self.bearer());
    }

    async fn check(res: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, action, "Supabase request failed");
            bail!(format!(
                "Failed to {action} chat session, Supabase returned {}",
                status.as_u16()
            ));
        }

        return Ok(res);
    }
}

#[async_trait]
impl SessionStore for SupabaseStore {
    fn set_access_token(&self, access_token: Option<String>) {
        let Ok(mut current) = self.access_token.write() else {
            tracing::error!("Failed to swap Supabase access token");
            return;
        };
        *current = access_token;
    }

    #[allow(clippy::implicit_return)]
    async fn select_by_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let res = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        let sessions = SupabaseStore::check(res, "list")
            .await?
            .json::<Vec<Session>>()
            .await?;
        tracing::debug!(user_id, count = sessions.len(), "Fetched chat sessions");

        return Ok(sessions);
    }

    #[allow(clippy::implicit_return)]
    async fn select_by_session_id(&self, session_id: &str) -> Result<Option<Session>> {
        let res = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("session_id", format!("eq.{session_id}")),
            ])
            .send()
            .await?;

        let mut sessions = SupabaseStore::check(res, "load")
            .await?
            .json::<Vec<Session>>()
            .await?;
        if sessions.is_empty() {
            return Ok(None);
        }

        return Ok(Some(sessions.remove(0)));
    }

    #[allow(clippy::implicit_return)]
    async fn exists(&self, session_id: &str) -> Result<bool> {
        let res = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "session_id".to_string()),
                ("session_id", format!("eq.{session_id}")),
            ])
            .send()
            .await?;

        let rows = SupabaseStore::check(res, "look up")
            .await?
            .json::<Vec<SessionIdRow>>()
            .await?;

        return Ok(!rows.is_empty());
    }

    #[allow(clippy::implicit_return)]
    async fn insert(&self, session: &Session) -> Result<()> {
        let res = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(&[session])
            .send()
            .await?;

        SupabaseStore::check(res, "insert").await?;
        tracing::debug!(session_id = %session.session_id, "Inserted chat session");

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn update(
        &self,
        session_id: &str,
        messages: &[Message],
        updated_at: &str,
    ) -> Result<()> {
        let res = self
            .request(reqwest::Method::PATCH)
            .query(&[("session_id", format!("eq.{session_id}"))])
            .header("Prefer", "return=minimal")
            .json(&UpdateRequest {
                messages,
                updated_at,
            })
            .send()
            .await?;

        SupabaseStore::check(res, "update").await?;
        tracing::debug!(
            session_id,
            messages = messages.len(),
            "Updated chat session"
        );

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        let res = self
            .request(reqwest::Method::DELETE)
            .query(&[("session_id", format!("eq.{session_id}"))])
            .send()
            .await?;

        SupabaseStore::check(res, "delete").await?;

        return Ok(());
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::SessionStore;

/// Keeps each session as a YAML file in a directory, for use without a
/// Supabase project.
pub struct LocalStore {
    pub cache_dir: path::PathBuf,
}

impl Default for LocalStore {
    fn default() -> LocalStore {
        return LocalStore::new(path::PathBuf::from(Config::get(ConfigKey::SessionsDir)));
    }
}

impl LocalStore {
    pub fn new(cache_dir: path::PathBuf) -> LocalStore {
        return LocalStore { cache_dir };
    }

    fn get_file_path(&self, id: &str) -> Result<path::PathBuf> {
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            bail!(format!("Invalid session id {id}"));
        }

        return Ok(self.cache_dir.join(format!("{id}.yaml")));
    }

    async fn read(&self, file_path: &path::Path) -> Result<Session> {
        let payload = fs::read_to_string(file_path).await?;
        let session: Session = serde_yaml::from_str(&payload)?;

        return Ok(session);
    }

    async fn write(&self, session: &Session) -> Result<()> {
        let payload = serde_yaml::to_string(session)?;

        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir).await?;
        }

        let mut file = fs::File::create(self.get_file_path(&session.session_id)?).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    #[allow(clippy::implicit_return)]
    async fn select_by_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = vec![];
        if !self.cache_dir.exists() {
            return Ok(sessions);
        }

        let mut dir = fs::read_dir(&self.cache_dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let file_path = file.path();
            if file_path.extension().and_then(|ext| return ext.to_str()) != Some("yaml") {
                continue;
            }

            match self.read(&file_path).await {
                Ok(session) => {
                    if session.user_id == user_id {
                        sessions.push(session);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = ?file_path, err = ?err, "Skipping unreadable session file");
                }
            }
        }

        sessions.sort_by_cached_key(|session| {
            return DateTime::parse_from_rfc3339(&session.created_at).ok();
        });
        sessions.reverse();

        return Ok(sessions);
    }

    #[allow(clippy::implicit_return)]
    async fn select_by_session_id(&self, session_id: &str) -> Result<Option<Session>> {
        let file_path = self.get_file_path(session_id)?;
        if !file_path.exists() {
            return Ok(None);
        }

        return Ok(Some(self.read(&file_path).await?));
    }

    #[allow(clippy::implicit_return)]
    async fn exists(&self, session_id: &str) -> Result<bool> {
        return Ok(self.get_file_path(session_id)?.exists());
    }

    #[allow(clippy::implicit_return)]
    async fn insert(&self, session: &Session) -> Result<()> {
        if self.exists(&session.session_id).await? {
            bail!(format!("Session {} already exists", session.session_id));
        }

        return self.write(session).await;
    }

    #[allow(clippy::implicit_return)]
    async fn update(
        &self,
        session_id: &str,
        messages: &[Message],
        updated_at: &str,
    ) -> Result<()> {
        let Some(mut session) = self.select_by_session_id(session_id).await? else {
            bail!(format!("No session found for id {session_id}"));
        };

        session.messages = messages.to_vec();
        session.updated_at = updated_at.to_string();

        return self.write(&session).await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        let file_path = self.get_file_path(session_id)?;
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }
}

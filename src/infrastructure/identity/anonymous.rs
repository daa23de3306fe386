#[cfg(test)]
#[path = "anonymous_test.rs"]
mod tests;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Identity;

/// Identifier used for chats while nobody is signed in. Created once and kept
/// in a file so history survives restarts.
pub struct AnonymousIdentity {
    file_path: PathBuf,
}

impl Default for AnonymousIdentity {
    fn default() -> AnonymousIdentity {
        let auth_file = PathBuf::from(Config::get(ConfigKey::AuthFile));
        let dir = auth_file
            .parent()
            .map(|parent| return parent.to_path_buf())
            .unwrap_or_default();

        return AnonymousIdentity::new(dir.join("anonymous-id"));
    }
}

impl AnonymousIdentity {
    pub fn new(file_path: PathBuf) -> AnonymousIdentity {
        return AnonymousIdentity { file_path };
    }

    pub async fn load_or_create(&self) -> Result<Identity> {
        if self.file_path.exists() {
            let id = fs::read_to_string(&self.file_path).await?;
            let id = id.trim();
            if !id.is_empty() {
                return Ok(Identity::anonymous(id));
            }
        }

        let id = format!("anonymous_{}", Utc::now().timestamp_millis());
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.file_path, &id).await?;
        tracing::debug!(id = %id, "Created anonymous identity");

        return Ok(Identity::anonymous(&id));
    }
}

#[cfg(test)]
#[path = "supabase_auth_test.rs"]
mod tests;

use std::path::PathBuf;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credentials;
use crate::domain::models::Identity;
use crate::domain::models::IdentityProvider;
use crate::domain::models::validate_email;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

impl AuthSession {
    pub async fn load(file_path: &PathBuf) -> Result<Option<AuthSession>> {
        if !file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(file_path).await?;
        let session: AuthSession = serde_json::from_str(&payload)?;

        return Ok(Some(session));
    }

    pub async fn save(&self, file_path: &PathBuf) -> Result<()> {
        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(file_path, serde_json::to_string_pretty(self)?).await?;
        return Ok(());
    }

    pub fn identity(&self) -> Identity {
        return Identity {
            id: self.user_id.to_string(),
            email: self.email.clone(),
            anonymous: false,
            access_token: Some(self.access_token.to_string()),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PasswordRequest {
    email: String,
    password: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RecoverRequest {
    email: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UpdateUserRequest {
    password: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

async fn error_message(res: reqwest::Response) -> String {
    let status = res.status().as_u16();
    let text = res.text().await.unwrap_or_default();
    if let Ok(body) = serde_json::from_str::<ErrorResponse>(&text) {
        if let Some(msg) = body.error_description.or(body.msg).or(body.message) {
            return msg;
        }
    }

    return format!("Supabase returned {status}");
}

/// Client for Supabase's GoTrue auth API. The signed in session is cached as
/// JSON in `auth_file`.
pub struct SupabaseAuth {
    url: String,
    key: String,
    auth_file: PathBuf,
    recovery_token: Option<String>,
    client: reqwest::Client,
}

impl Default for SupabaseAuth {
    fn default() -> SupabaseAuth {
        return SupabaseAuth::new(
            Config::get(ConfigKey::SupabaseURL),
            Config::get(ConfigKey::SupabaseKey),
            PathBuf::from(Config::get(ConfigKey::AuthFile)),
        );
    }
}

impl SupabaseAuth {
    pub fn new(url: String, key: String, auth_file: PathBuf) -> SupabaseAuth {
        return SupabaseAuth {
            url: url.trim_end_matches('/').to_string(),
            key,
            auth_file,
            recovery_token: None,
            client: reqwest::Client::new(),
        };
    }

    /// Uses the access token from a password recovery link instead of the
    /// cached session for `update_password`.
    pub fn with_recovery_token(mut self, token: &str) -> SupabaseAuth {
        self.recovery_token = Some(token.to_string());
        return self;
    }

    pub fn is_configured(&self) -> bool {
        return !self.url.is_empty() && !self.key.is_empty();
    }

    pub async fn cached_session(&self) -> Result<Option<AuthSession>> {
        return AuthSession::load(&self.auth_file).await;
    }

    fn endpoint(&self, path: &str) -> String {
        return format!("{url}/auth/v1/{path}", url = self.url);
    }

    fn ensure_configured(&self) -> Result<()> {
        if !self.is_configured() {
            bail!("Signing in requires both supabase-url and supabase-key to be set");
        }

        return Ok(());
    }

    async fn bearer(&self) -> Result<Option<String>> {
        if let Some(token) = &self.recovery_token {
            return Ok(Some(token.to_string()));
        }

        return Ok(self
            .cached_session()
            .await?
            .map(|session| return session.access_token));
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    #[allow(clippy::implicit_return)]
    async fn current_user(&self) -> Result<Option<Identity>> {
        let Some(session) = self.cached_session().await? else {
            return Ok(None);
        };
        if !self.is_configured() {
            return Ok(None);
        }

        let res = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::warn!(
                status = res.status().as_u16(),
                "Cached Supabase session was rejected"
            );
            return Ok(None);
        }

        let user = res.json::<UserResponse>().await?;
        return Ok(Some(Identity {
            id: user.id,
            email: user.email,
            anonymous: false,
            access_token: Some(session.access_token),
        }));
    }

    #[allow(clippy::implicit_return)]
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        credentials.validate()?;
        self.ensure_configured()?;

        let res = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.key)
            .json(&PasswordRequest {
                email: credentials.email.to_string(),
                password: credentials.password.to_string(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            let msg = error_message(res).await;
            tracing::error!(msg = %msg, "Supabase sign in failed");
            bail!(msg);
        }

        let token = res.json::<TokenResponse>().await?;
        let session = AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email,
        };
        session.save(&self.auth_file).await?;

        return Ok(session.identity());
    }

    #[allow(clippy::implicit_return)]
    async fn sign_up(&self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;
        self.ensure_configured()?;

        let res = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.key)
            .json(&PasswordRequest {
                email: credentials.email.to_string(),
                password: credentials.password.to_string(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<()> {
        validate_email(email)?;
        self.ensure_configured()?;

        let mut req = self
            .client
            .post(self.endpoint("recover"))
            .header("apikey", &self.key)
            .json(&RecoverRequest {
                email: email.trim().to_string(),
            });
        if !redirect_to.is_empty() {
            req = req.query(&[("redirect_to", redirect_to)]);
        }

        let res = req.send().await?;
        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn update_password(&self, new_password: &str) -> Result<()> {
        self.ensure_configured()?;
        let Some(token) = self.bearer().await? else {
            bail!("You need to be signed in, or pass the token from your reset link, to change your password.");
        };

        let res = self
            .client
            .put(self.endpoint("user"))
            .header("apikey", &self.key)
            .bearer_auth(token)
            .json(&UpdateUserRequest {
                password: new_password.to_string(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(error_message(res).await);
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.cached_session().await? else {
            return Ok(());
        };

        if self.is_configured() {
            let res = self
                .client
                .post(self.endpoint("logout"))
                .header("apikey", &self.key)
                .bearer_auth(&session.access_token)
                .send()
                .await;

            match res {
                Ok(res) if !res.status().is_success() => {
                    tracing::warn!(status = res.status().as_u16(), "Supabase sign out failed");
                }
                Err(err) => {
                    tracing::warn!(err = ?err, "Supabase sign out failed");
                }
                _ => {}
            }
        }

        fs::remove_file(&self.auth_file).await?;
        return Ok(());
    }
}

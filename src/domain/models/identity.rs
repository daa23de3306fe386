#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    pub anonymous: bool,
    /// Bearer token that scopes store requests to this user.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Identity {
    pub fn anonymous(id: &str) -> Identity {
        return Identity {
            id: id.to_string(),
            email: None,
            anonymous: true,
            access_token: None,
        };
    }
}

impl ToString for Identity {
    fn to_string(&self) -> String {
        if let Some(email) = &self.email {
            return format!("{email} ({})", self.id);
        }

        return format!("anonymous ({})", self.id);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(Identity),
    SignedOut(),
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Credentials {
        return Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
    }

    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            bail!("Password is required.");
        }

        return Ok(());
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        bail!("Email is required.");
    }
    if !email.contains('@') {
        bail!("Please enter a valid email address.");
    }

    return Ok(());
}

pub fn validate_password_reset(new_password: &str, confirm_password: &str) -> Result<()> {
    if new_password.is_empty() || confirm_password.is_empty() {
        bail!("Both password fields are required.");
    }
    if new_password != confirm_password {
        bail!("Passwords do not match.");
    }

    return Ok(());
}

#[async_trait]
pub trait IdentityProvider {
    /// The signed in user, if a cached token is still accepted by the provider.
    async fn current_user(&self) -> Result<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity>;

    /// Registers an account. The provider sends a verification e-mail, the
    /// user is not signed in afterwards.
    async fn sign_up(&self, credentials: &Credentials) -> Result<()>;

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<()>;

    async fn update_password(&self, new_password: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;
}

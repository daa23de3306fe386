#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::validate_password_reset;
use crate::domain::models::Credentials;
use crate::domain::models::Identity;
use crate::domain::models::IdentityEvent;
use crate::infrastructure::identity::anonymous::AnonymousIdentity;
use crate::infrastructure::identity::SharedIdentityProvider;

pub const SIGN_UP_SUCCESS: &str =
    "Signup successful! Please check your email to verify your account.";
pub const PASSWORD_RESET_SENT: &str = "Password reset link sent! Check your email.";
pub const PASSWORD_RESET_DONE: &str = "Password reset successfully!";

/// Resolves who is chatting and announces every change on the identity
/// channel.
pub struct IdentityService {
    provider: SharedIdentityProvider,
    anonymous: AnonymousIdentity,
    tx: mpsc::UnboundedSender<IdentityEvent>,
}

impl IdentityService {
    pub fn new(
        provider: SharedIdentityProvider,
        anonymous: AnonymousIdentity,
        tx: mpsc::UnboundedSender<IdentityEvent>,
    ) -> IdentityService {
        return IdentityService {
            provider,
            anonymous,
            tx,
        };
    }

    fn emit(&self, event: IdentityEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::warn!(err = ?err, "Identity event has no listener");
        }
    }

    /// The local identifier used while nobody is signed in.
    pub async fn fallback(&self) -> Result<Identity> {
        return self.anonymous.load_or_create().await;
    }

    /// Signed in user when the cached session is still valid, the anonymous
    /// fallback otherwise. Emits `SignedIn` for whichever was picked.
    pub async fn resolve(&self) -> Result<Identity> {
        let identity = match self.provider.current_user().await {
            Ok(Some(identity)) => identity,
            Ok(None) => self.fallback().await?,
            Err(err) => {
                tracing::warn!(err = ?err, "Failed to resolve signed in user");
                self.fallback().await?
            }
        };

        self.emit(IdentityEvent::SignedIn(identity.clone()));
        return Ok(identity);
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity> {
        credentials.validate()?;
        let identity = self.provider.sign_in(credentials).await?;
        tracing::debug!(user_id = %identity.id, "Signed in");

        self.emit(IdentityEvent::SignedIn(identity.clone()));
        return Ok(identity);
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<String> {
        credentials.validate()?;
        self.provider.sign_up(credentials).await?;
        return Ok(SIGN_UP_SUCCESS.to_string());
    }

    pub async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<String> {
        self.provider
            .send_password_reset(email, redirect_to)
            .await?;
        return Ok(PASSWORD_RESET_SENT.to_string());
    }

    pub async fn reset_password(&self, new_password: &str, confirm_password: &str) -> Result<String> {
        validate_password_reset(new_password, confirm_password)?;
        self.provider.update_password(new_password).await?;
        return Ok(PASSWORD_RESET_DONE.to_string());
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        tracing::debug!("Signed out");

        self.emit(IdentityEvent::SignedOut());
        return Ok(());
    }
}

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tempdir::TempDir;
use tokio::sync::mpsc;

use super::IdentityService;
use super::PASSWORD_RESET_DONE;
use super::SIGN_UP_SUCCESS;
use crate::domain::models::Credentials;
use crate::domain::models::Identity;
use crate::domain::models::IdentityEvent;
use crate::domain::models::IdentityProvider;
use crate::infrastructure::identity::anonymous::AnonymousIdentity;

#[derive(Default)]
struct FakeProvider {
    signed_in: Option<Identity>,
    offline: bool,
    calls: AtomicUsize,
}

fn student() -> Identity {
    return Identity {
        id: "u1".to_string(),
        email: Some("student@sist.ac.in".to_string()),
        anonymous: false,
        access_token: Some("u1-token".to_string()),
    };
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn current_user(&self) -> Result<Option<Identity>> {
        if self.offline {
            bail!("auth offline");
        }
        return Ok(self.signed_in.clone());
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            bail!("Invalid login credentials");
        }
        return Ok(student());
    }

    async fn sign_up(&self, _credentials: &Credentials) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    async fn send_password_reset(&self, _email: &str, _redirect_to: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    async fn update_password(&self, _new_password: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    async fn sign_out(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }
}

fn setup(
    provider: FakeProvider,
    tmp_dir: &TempDir,
) -> (
    IdentityService,
    Arc<FakeProvider>,
    mpsc::UnboundedReceiver<IdentityEvent>,
) {
    let provider = Arc::new(provider);
    let (tx, rx) = mpsc::unbounded_channel::<IdentityEvent>();
    let service = IdentityService::new(
        provider.clone(),
        AnonymousIdentity::new(tmp_dir.path().join("anonymous-id")),
        tx,
    );

    return (service, provider, rx);
}

#[tokio::test]
async fn it_resolves_signed_in_user() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let provider = FakeProvider {
        signed_in: Some(student()),
        ..FakeProvider::default()
    };
    let (service, _provider, mut rx) = setup(provider, &tmp_dir);

    let identity = service.resolve().await?;

    assert_eq!(identity, student());
    assert_eq!(rx.recv().await, Some(IdentityEvent::SignedIn(student())));

    return Ok(());
}

#[tokio::test]
async fn it_falls_back_to_anonymous() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let (service, _provider, mut rx) = setup(FakeProvider::default(), &tmp_dir);

    let identity = service.resolve().await?;

    assert!(identity.anonymous);
    assert!(identity.id.starts_with("anonymous_"));
    assert_eq!(rx.recv().await, Some(IdentityEvent::SignedIn(identity)));

    return Ok(());
}

#[tokio::test]
async fn it_falls_back_when_provider_fails() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let provider = FakeProvider {
        offline: true,
        ..FakeProvider::default()
    };
    let (service, _provider, _rx) = setup(provider, &tmp_dir);

    let identity = service.resolve().await?;

    assert!(identity.anonymous);
    assert_eq!(identity, service.fallback().await?);

    return Ok(());
}

#[tokio::test]
async fn it_emits_sign_in_and_sign_out() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let (service, _provider, mut rx) = setup(FakeProvider::default(), &tmp_dir);

    service
        .sign_in(&Credentials::new("student@sist.ac.in", "hunter2"))
        .await?;
    service.sign_out().await?;

    assert_eq!(rx.recv().await, Some(IdentityEvent::SignedIn(student())));
    assert_eq!(rx.recv().await, Some(IdentityEvent::SignedOut()));

    return Ok(());
}

#[tokio::test]
async fn it_emits_nothing_on_failed_sign_in() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let provider = FakeProvider {
        offline: true,
        ..FakeProvider::default()
    };
    let (service, _provider, mut rx) = setup(provider, &tmp_dir);

    let res = service
        .sign_in(&Credentials::new("student@sist.ac.in", "wrong"))
        .await;

    assert_eq!(res.unwrap_err().to_string(), "Invalid login credentials");
    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_validates_before_remote_calls() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let (service, provider, _rx) = setup(FakeProvider::default(), &tmp_dir);

    let sign_in = service.sign_in(&Credentials::new("", "secret")).await;
    assert_eq!(sign_in.unwrap_err().to_string(), "Email is required.");

    let sign_up = service
        .sign_up(&Credentials::new("not-an-email", "secret"))
        .await;
    assert_eq!(
        sign_up.unwrap_err().to_string(),
        "Please enter a valid email address."
    );

    let reset = service.reset_password("one", "two").await;
    assert_eq!(reset.unwrap_err().to_string(), "Passwords do not match.");

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

    return Ok(());
}

#[tokio::test]
async fn it_returns_confirmation_texts() -> Result<()> {
    let tmp_dir = TempDir::new("identity")?;
    let (service, _provider, _rx) = setup(FakeProvider::default(), &tmp_dir);

    let signed_up = service
        .sign_up(&Credentials::new("student@sist.ac.in", "secret"))
        .await?;
    let reset = service.reset_password("secret2", "secret2").await?;

    assert_eq!(signed_up, SIGN_UP_SUCCESS);
    assert_eq!(reset, PASSWORD_RESET_DONE);

    return Ok(());
}

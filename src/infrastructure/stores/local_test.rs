use anyhow::Result;
use tempdir::TempDir;

use super::LocalStore;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::SessionStore;

fn session_fixture(session_id: &str, user_id: &str, created_at: &str) -> Session {
    return Session {
        session_id: session_id.to_string(),
        user_id: user_id.to_string(),
        title: Some("Hello".to_string()),
        messages: vec![Message::user("Hello")],
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
    };
}

#[tokio::test]
async fn it_lists_nothing_without_directory() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().join("missing"));

    assert!(store.select_by_user("u1").await?.is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_inserts_and_selects() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().join("sessions"));
    let session = session_fixture("session_a", "u1", "2025-02-01T10:00:00.000Z");

    store.insert(&session).await?;

    assert!(store.exists("session_a").await?);
    assert_eq!(store.select_by_session_id("session_a").await?, Some(session));
    assert!(store.select_by_session_id("session_b").await?.is_none());

    return Ok(());
}

#[tokio::test]
async fn it_rejects_duplicate_inserts() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());
    let session = session_fixture("session_a", "u1", "2025-02-01T10:00:00.000Z");

    store.insert(&session).await?;
    let res = store.insert(&session).await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Session session_a already exists");

    return Ok(());
}

#[tokio::test]
async fn it_updates_messages_and_keeps_title() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());
    let session = session_fixture("session_a", "u1", "2025-02-01T10:00:00.000Z");
    store.insert(&session).await?;

    let messages = vec![Message::user("Hello"), Message::bot("Hi!")];
    store
        .update("session_a", &messages, "2025-02-01T10:05:00.000Z")
        .await?;

    let updated = store.select_by_session_id("session_a").await?.unwrap();
    assert_eq!(updated.messages, messages);
    assert_eq!(updated.title, Some("Hello".to_string()));
    assert_eq!(updated.created_at, "2025-02-01T10:00:00.000Z");
    assert_eq!(updated.updated_at, "2025-02-01T10:05:00.000Z");

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_update_missing_session() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());

    let res = store
        .update("session_missing", &[], "2025-02-01T10:05:00.000Z")
        .await;
    assert!(res.is_err());

    return Ok(());
}

#[tokio::test]
async fn it_lists_user_sessions_newest_first() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());
    store
        .insert(&session_fixture("session_old", "u1", "2025-01-01T10:00:00.000Z"))
        .await?;
    store
        .insert(&session_fixture("session_new", "u1", "2025-03-01T10:00:00.000Z"))
        .await?;
    store
        .insert(&session_fixture("session_other", "u2", "2025-02-01T10:00:00.000Z"))
        .await?;

    let ids = store
        .select_by_user("u1")
        .await?
        .iter()
        .map(|session| return session.session_id.to_string())
        .collect::<Vec<String>>();

    assert_eq!(ids, vec!["session_new", "session_old"]);

    return Ok(());
}

#[tokio::test]
async fn it_deletes_sessions() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());
    store
        .insert(&session_fixture("session_a", "u1", "2025-02-01T10:00:00.000Z"))
        .await?;

    store.delete("session_a").await?;
    store.delete("session_a").await?;

    assert!(!store.exists("session_a").await?);

    return Ok(());
}

#[tokio::test]
async fn it_rejects_path_like_ids() -> Result<()> {
    let tmp_dir = TempDir::new("sessions")?;
    let store = LocalStore::new(tmp_dir.path().to_path_buf());

    assert!(store.exists("../config").await.is_err());

    return Ok(());
}

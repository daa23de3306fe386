use anyhow::Result;
use test_utils::long_question_fixture;
use test_utils::session_row_fixture;

use super::derive_title;
use super::Session;
use super::SessionContext;
use super::DEFAULT_TITLE;
use crate::domain::models::Message;

#[test]
fn it_creates_prefixed_unique_ids() {
    let first = SessionContext::create_id();
    let second = SessionContext::create_id();

    assert!(first.starts_with("session_"));
    assert_ne!(first, second);
}

#[test]
fn it_derives_title_from_first_user_message() {
    let messages = vec![Message::bot("Welcome!"), Message::user("Hello")];
    assert_eq!(derive_title(&messages), Some("Hello".to_string()));
}

#[test]
fn it_derives_truncated_title() {
    let messages = vec![Message::user(long_question_fixture())];
    insta::assert_snapshot!(derive_title(&messages).unwrap(), @"How do I apply for the B.E. Co...");
}

#[test]
fn it_derives_no_title_without_user_message() {
    assert_eq!(derive_title(&[Message::bot("Welcome!")]), None);
}

#[test]
fn it_keeps_title_after_first_user_message() {
    let mut ctx = SessionContext::new(Some("u1".to_string()));
    ctx.push(Message::user("First question"));
    ctx.push(Message::bot("Answer"));
    ctx.push(Message::user("Second question"));

    assert_eq!(ctx.title, Some("First question".to_string()));
    assert_eq!(ctx.messages.len(), 3);
}

#[test]
fn it_resets_to_new_id() {
    let mut ctx = SessionContext::new(Some("u1".to_string()));
    let old_id = ctx.session_id.to_string();
    ctx.push(Message::user("Hello"));
    ctx.loading = true;

    ctx.reset();

    assert_ne!(ctx.session_id, old_id);
    assert!(ctx.messages.is_empty());
    assert!(ctx.title.is_none());
    assert!(!ctx.loading);
    assert_eq!(ctx.user_id, Some("u1".to_string()));
}

#[test]
fn it_has_no_record_without_user() {
    let mut ctx = SessionContext::new(None);
    ctx.push(Message::user("Hello"));

    assert!(!ctx.has_unsaved_messages());
    assert!(ctx.to_session("2025-02-01T10:00:00.000Z").is_none());
}

#[test]
fn it_tracks_unsaved_messages() {
    let mut ctx = SessionContext::new(Some("u1".to_string()));
    assert!(!ctx.has_unsaved_messages());

    ctx.push(Message::user("Hello"));
    assert!(ctx.has_unsaved_messages());

    ctx.mark_saved();
    assert!(!ctx.has_unsaved_messages());

    ctx.push(Message::bot("Hi!"));
    assert!(ctx.has_unsaved_messages());

    ctx.reset();
    assert!(!ctx.has_unsaved_messages());
}

#[test]
fn it_builds_record_with_default_title() {
    let mut ctx = SessionContext::new(Some("u1".to_string()));
    ctx.push(Message::bot("Welcome!"));

    let session = ctx.to_session("2025-02-01T10:00:00.000Z").unwrap();
    assert_eq!(session.title, Some(DEFAULT_TITLE.to_string()));
    assert_eq!(session.user_id, "u1");
    assert_eq!(session.session_id, ctx.session_id);
}

#[test]
fn it_deserializes_postgrest_rows() -> Result<()> {
    let sessions: Vec<Session> = serde_json::from_str(session_row_fixture())?;

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, "session_older");
    assert_eq!(sessions[0].messages.len(), 2);
    assert_eq!(sessions[1].title, None);
    assert_eq!(sessions[1].display_title(), "Chat");

    return Ok(());
}

#[test]
fn it_previews_sessions() -> Result<()> {
    let sessions: Vec<Session> = serde_json::from_str(session_row_fixture())?;
    assert_eq!(sessions[0].preview(), "What are the hostel fees?");
    assert_eq!(sessions[1].preview(), "Empty chat");

    let mut bot_only = sessions[1].clone();
    bot_only.messages = vec![Message::bot("Welcome!")];
    assert_eq!(bot_only.preview(), "No messages");

    return Ok(());
}

#[test]
fn it_replaces_context_with_session() -> Result<()> {
    let sessions: Vec<Session> = serde_json::from_str(session_row_fixture())?;
    let mut ctx = SessionContext::new(Some("u1".to_string()));
    ctx.loading = true;

    ctx.replace_with(sessions[0].clone());

    assert_eq!(ctx.session_id, "session_older");
    assert_eq!(ctx.messages, sessions[0].messages);
    assert_eq!(ctx.created_at, sessions[0].created_at);
    assert!(!ctx.loading);

    return Ok(());
}

use anyhow::Result;
use mockito::Matcher;
use serde_json::json;

use super::ChatResponse;
use super::HttpGenerator;
use crate::domain::models::ChatPrompt;
use crate::domain::models::ResponseGenerator;

impl HttpGenerator {
    fn with_url(url: String) -> HttpGenerator {
        return HttpGenerator::new(format!("{url}/api/chat"), 1000);
    }
}

#[tokio::test]
async fn it_generates_responses() -> Result<()> {
    let body = serde_json::to_string(&ChatResponse {
        response: "Hi!".to_string(),
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "message": "Hello",
            "sessionId": "session_abc",
        })))
        .with_status(200)
        .with_body(body)
        .create();

    let generator = HttpGenerator::with_url(server.url());
    let res = generator
        .generate(ChatPrompt::new("Hello", "session_abc"))
        .await?;

    mock.assert();
    assert_eq!(res, "Hi!");

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_server_errors() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body(r#"{"error":"Backend services not initialized"}"#)
        .create();

    let generator = HttpGenerator::with_url(server.url());
    let res = generator
        .generate(ChatPrompt::new("Hello", "session_abc"))
        .await;

    mock.assert();
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Failed to make chat request to the assistant");
}

#[tokio::test]
async fn it_fails_on_unexpected_bodies() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(r#"{"error":"Empty message"}"#)
        .create();

    let generator = HttpGenerator::with_url(server.url());
    let res = generator
        .generate(ChatPrompt::new("Hello", "session_abc"))
        .await;

    mock.assert();
    assert!(res.is_err());
}

#[tokio::test]
async fn it_fails_when_unreachable() {
    let generator = HttpGenerator::new("http://127.0.0.1:1/api/chat".to_string(), 200);
    let res = generator
        .generate(ChatPrompt::new("Hello", "session_abc"))
        .await;

    assert!(res.is_err());
}

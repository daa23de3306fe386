#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::models::ChatPrompt;
use crate::domain::models::ResponseGenerator;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Posts each user message to the assistant's chat endpoint.
pub struct HttpGenerator {
    url: String,
    timeout_ms: u64,
}

impl HttpGenerator {
    pub fn new(url: String, timeout_ms: u64) -> HttpGenerator {
        return HttpGenerator { url, timeout_ms };
    }
}

#[async_trait]
impl ResponseGenerator for HttpGenerator {
    #[allow(clippy::implicit_return)]
    async fn generate(&self, prompt: ChatPrompt) -> Result<String> {
        let req = ChatRequest {
            message: prompt.text,
            session_id: prompt.session_id,
        };
        tracing::debug!(body = ?req, "Chat request");

        let mut builder = reqwest::Client::new().post(&self.url).json(&req);
        if self.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(self.timeout_ms));
        }

        let res = builder.send().await?;
        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make chat request to the assistant"
            );
            bail!("Failed to make chat request to the assistant");
        }

        let body = res.json::<ChatResponse>().await?;
        tracing::debug!(body = ?body, "Chat response");

        return Ok(body.response);
    }
}

use anyhow::Result;
use async_trait::async_trait;

pub struct ChatPrompt {
    pub text: String,
    pub session_id: String,
}

impl ChatPrompt {
    pub fn new(text: &str, session_id: &str) -> ChatPrompt {
        return ChatPrompt {
            text: text.to_string(),
            session_id: session_id.to_string(),
        };
    }
}

#[async_trait]
pub trait ResponseGenerator {
    /// Asks the remote assistant for the reply to one user message. The remote
    /// side keeps its own per-session context keyed by `prompt.session_id`.
    async fn generate(&self, prompt: ChatPrompt) -> Result<String>;
}

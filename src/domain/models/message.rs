#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

pub const FALLBACK_TEXT: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl ToString for Sender {
    fn to_string(&self) -> String {
        match self {
            Sender::User => return String::from("You"),
            Sender::Bot => return String::from("Assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
}

pub fn now_timestamp() -> String {
    return Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
}

/// Returns the first `max_chars` characters of `text`, with `...` appended when
/// anything was cut off.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut res = text.chars().take(max_chars).collect::<String>();
    if text.chars().count() > max_chars {
        res += "...";
    }

    return res;
}

impl Message {
    pub fn new(sender: Sender, text: &str) -> Message {
        return Message {
            text: text.to_string(),
            sender,
            timestamp: now_timestamp(),
        };
    }

    pub fn user(text: &str) -> Message {
        return Message::new(Sender::User, text);
    }

    pub fn bot(text: &str) -> Message {
        return Message::new(Sender::Bot, text);
    }

    pub fn fallback() -> Message {
        return Message::new(Sender::Bot, FALLBACK_TEXT);
    }

    pub fn is_user(&self) -> bool {
        return self.sender == Sender::User;
    }
}

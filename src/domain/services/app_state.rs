#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use super::HistoryList;
use super::SendOutcome;
use super::SessionSynchronizer;
use crate::domain::models::Identity;
use crate::domain::models::IdentityEvent;
use crate::domain::models::SessionContext;
use crate::domain::models::SlashCommand;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Saves the current chat and starts a new one.
- /history (/ls) - Lists your previous chats, newest first. The active chat is marked with *.
- /open (/o) [NUMBER] - Opens a chat from /history.
- /delete (/d) [NUMBER] - Deletes a chat from /history. Deleting the active chat starts a new one.
- /login - Sign in with your e-mail and password.
- /logout - Sign out and continue anonymously.
- /quit /exit (/q) - Saves the current chat and exits.
- /help (/h) - Provides this help menu.

HOTKEYS:
- CTRL+C - Saves the current chat and exits.
- CTRL+D - Same as /quit.
        "#;

    return text.trim().to_string();
}

#[derive(Debug, PartialEq, Eq)]
pub enum SlashOutcome {
    Quit,
    Print(String),
    /// Needs interactive input, handled by the chat loop.
    Login,
    Logout,
    /// A stored chat became the active one.
    Opened,
}

pub struct AppState {
    pub ctx: SessionContext,
    pub history: HistoryList,
    pub sync: SessionSynchronizer,
    anonymous: Identity,
}

impl AppState {
    pub fn new(sync: SessionSynchronizer, anonymous: Identity) -> AppState {
        return AppState {
            ctx: SessionContext::new(Some(anonymous.id.to_string())),
            history: HistoryList::default(),
            sync,
            anonymous,
        };
    }

    pub fn is_anonymous(&self) -> bool {
        return self.ctx.user_id.as_deref() == Some(self.anonymous.id.as_str());
    }

    /// Reloads the history of the current user. Failures are logged by the
    /// history list and the previous listing is kept.
    pub async fn refresh_history(&mut self) {
        let Some(user_id) = self.ctx.user_id.clone() else {
            return;
        };

        if self.history.load_for_user(&self.sync, &user_id).await.is_err() {
            tracing::warn!(user_id = %user_id, "Keeping previous chat history");
        }
    }

    /// Moves the chat loop to `identity`. The active chat is saved with the
    /// previous credentials before the store is re-scoped.
    async fn switch_user(&mut self, identity: &Identity) {
        if self.ctx.user_id.as_deref() == Some(identity.id.as_str()) {
            self.sync.set_access_token(identity.access_token.clone());
            self.history.mark_stale();
            self.refresh_history().await;
            return;
        }

        self.sync.unload(&self.ctx).await;
        self.sync.set_access_token(identity.access_token.clone());
        self.ctx.user_id = Some(identity.id.to_string());
        self.ctx.reset();
        self.history.clear();
        self.refresh_history().await;
    }

    pub async fn handle_identity_event(&mut self, event: IdentityEvent) -> String {
        match event {
            IdentityEvent::SignedIn(identity) => {
                self.switch_user(&identity).await;
                if identity.anonymous {
                    return "Chatting anonymously. Use /login to keep your chats with your account.".to_string();
                }
                return format!("Signed in as {}", identity.to_string());
            }
            IdentityEvent::SignedOut() => {
                let anonymous = self.anonymous.clone();
                self.switch_user(&anonymous).await;
                return "Signed out. Chatting anonymously.".to_string();
            }
        }
    }

    /// Sends a chat line to the assistant. The history is reloaded when the
    /// line created a session the listing has not seen yet.
    pub async fn submit(&mut self, text: &str) -> SendOutcome {
        let outcome = self.sync.send_user_message(&mut self.ctx, text).await;
        if outcome == SendOutcome::Rejected {
            return outcome;
        }

        let listed = self
            .history
            .sessions
            .iter()
            .any(|session| return session.session_id == self.ctx.session_id);
        if !listed {
            self.refresh_history().await;
        }

        return outcome;
    }

    pub async fn handle_slash_command(&mut self, text: &str) -> Option<SlashOutcome> {
        let cmd = SlashCommand::parse(text)?;

        if cmd.is_quit() {
            return Some(SlashOutcome::Quit);
        }

        if cmd.is_help() {
            return Some(SlashOutcome::Print(help_text()));
        }

        if cmd.is_login() {
            return Some(SlashOutcome::Login);
        }

        if cmd.is_logout() {
            if self.is_anonymous() {
                return Some(SlashOutcome::Print("You are not signed in.".to_string()));
            }
            return Some(SlashOutcome::Logout);
        }

        if cmd.is_new() {
            self.sync.start_session(&mut self.ctx).await;
            self.refresh_history().await;
            return Some(SlashOutcome::Print("Started a new chat.".to_string()));
        }

        if cmd.is_history() {
            if self.history.is_empty() {
                self.refresh_history().await;
            }
            return Some(SlashOutcome::Print(
                self.history.format(&self.ctx.session_id),
            ));
        }

        if cmd.is_open() || cmd.is_delete() {
            let Some(idx) = cmd.index_arg() else {
                return Some(SlashOutcome::Print(
                    "Pass the chat number shown by /history.".to_string(),
                ));
            };
            let Some(session) = self.history.get(idx) else {
                return Some(SlashOutcome::Print(format!("No chat with number {idx}.")));
            };
            let session_id = session.session_id.to_string();
            let title = session.display_title();

            if cmd.is_open() {
                self.sync.unload(&self.ctx).await;
                if let Err(err) = self
                    .history
                    .select(&self.sync, &mut self.ctx, &session_id)
                    .await
                {
                    return Some(SlashOutcome::Print(format!("Failed to open chat: {err}")));
                }
                return Some(SlashOutcome::Opened);
            }

            if let Err(err) = self
                .history
                .remove(&self.sync, &mut self.ctx, &session_id)
                .await
            {
                return Some(SlashOutcome::Print(format!("Failed to delete chat: {err}")));
            }
            return Some(SlashOutcome::Print(format!("Deleted \"{title}\".")));
        }

        return None;
    }
}

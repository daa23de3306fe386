#[cfg(test)]
#[path = "synchronizer_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::now_timestamp;
use crate::domain::models::ChatPrompt;
use crate::domain::models::Message;
use crate::domain::models::SessionContext;
use crate::infrastructure::generators::SharedGenerator;
use crate::infrastructure::stores::SharedStore;

/// Result of writing the active transcript to the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    Updated,
    /// Nothing to write: no user yet, or an empty transcript.
    Skipped,
    /// The store rejected the write. The error has been logged.
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or a reply is still pending.
    Rejected,
    Answered,
    /// The assistant could not be reached and the fallback reply was appended.
    Fallback,
}

/// Keeps the active transcript and the session store in step. Holds no
/// session state of its own; the active session is always passed in.
pub struct SessionSynchronizer {
    store: SharedStore,
    generator: SharedGenerator,
}

impl SessionSynchronizer {
    pub fn new(store: SharedStore, generator: SharedGenerator) -> SessionSynchronizer {
        return SessionSynchronizer { store, generator };
    }

    pub fn store(&self) -> &SharedStore {
        return &self.store;
    }

    /// Store requests made after this call act as the given identity.
    pub fn set_access_token(&self, access_token: Option<String>) {
        self.store.set_access_token(access_token);
    }

    /// Saves whatever the active session still holds, then switches the
    /// context to a brand new, empty session.
    pub async fn start_session(&self, ctx: &mut SessionContext) {
        if ctx.has_unsaved_messages() {
            self.persist_logged(ctx).await;
        }

        ctx.reset();
        tracing::debug!(session_id = %ctx.session_id, "Started chat session");
    }

    pub async fn append_message(&self, ctx: &mut SessionContext, message: Message) -> PersistOutcome {
        ctx.push(message);
        let outcome = self.persist_logged(ctx).await;
        if outcome == PersistOutcome::Inserted || outcome == PersistOutcome::Updated {
            ctx.mark_saved();
        }

        return outcome;
    }

    pub async fn send_user_message(&self, ctx: &mut SessionContext, text: &str) -> SendOutcome {
        if text.trim().is_empty() || ctx.loading {
            return SendOutcome::Rejected;
        }

        self.append_message(ctx, Message::user(text)).await;

        ctx.loading = true;
        let res = self
            .generator
            .generate(ChatPrompt::new(text, &ctx.session_id))
            .await;
        ctx.loading = false;

        match res {
            Ok(reply) => {
                self.append_message(ctx, Message::bot(&reply)).await;
                return SendOutcome::Answered;
            }
            Err(err) => {
                tracing::error!(err = ?err, session_id = %ctx.session_id, "Assistant request failed");
                self.append_message(ctx, Message::fallback()).await;
                return SendOutcome::Fallback;
            }
        }
    }

    /// Writes the full transcript under the active session id, inserting the
    /// record the first time and updating it afterwards. Repeated calls
    /// converge on the latest transcript.
    pub async fn persist(&self, ctx: &SessionContext) -> Result<PersistOutcome> {
        if ctx.messages.is_empty() {
            return Ok(PersistOutcome::Skipped);
        }

        let updated_at = now_timestamp();
        let Some(session) = ctx.to_session(&updated_at) else {
            return Ok(PersistOutcome::Skipped);
        };

        if self.store.exists(&session.session_id).await? {
            self.store
                .update(&session.session_id, &session.messages, &updated_at)
                .await?;
            return Ok(PersistOutcome::Updated);
        }

        self.store.insert(&session).await?;
        return Ok(PersistOutcome::Inserted);
    }

    async fn persist_logged(&self, ctx: &SessionContext) -> PersistOutcome {
        match self.persist(ctx).await {
            Ok(outcome) => {
                return outcome;
            }
            Err(err) => {
                tracing::error!(err = ?err, session_id = %ctx.session_id, "Failed to save chat session");
                return PersistOutcome::Failed;
            }
        }
    }

    /// Exit-time save of the active transcript.
    pub async fn unload(&self, ctx: &SessionContext) -> PersistOutcome {
        tracing::debug!(session_id = %ctx.session_id, "Saving chat session on exit");
        return self.persist_logged(ctx).await;
    }

    /// Removes a session from the store. Deleting the active session also
    /// drops its local transcript and starts a fresh one.
    pub async fn delete_session(&self, ctx: &mut SessionContext, session_id: &str) -> Result<()> {
        if let Err(err) = self.store.delete(session_id).await {
            tracing::error!(err = ?err, session_id, "Failed to delete chat session");
            return Err(err);
        }

        if ctx.session_id == session_id {
            ctx.messages.clear();
            self.start_session(ctx).await;
        }

        return Ok(());
    }

    /// Makes a stored session the active one. The context is untouched when
    /// the session cannot be fetched.
    pub async fn load(&self, ctx: &mut SessionContext, session_id: &str) -> Result<()> {
        let res = self.store.select_by_session_id(session_id).await;
        let session = match res {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::error!(session_id, "Chat session not found");
                bail!(format!("No session found for id {session_id}"));
            }
            Err(err) => {
                tracing::error!(err = ?err, session_id, "Failed to load chat session");
                return Err(err);
            }
        };

        ctx.replace_with(session);
        return Ok(());
    }
}

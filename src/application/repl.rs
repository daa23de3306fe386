use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::application::cli;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::IdentityEvent;
use crate::domain::models::Message;
use crate::domain::models::Sender;
use crate::domain::models::FALLBACK_TEXT;
use crate::domain::services::AppState;
use crate::domain::services::IdentityService;
use crate::domain::services::SendOutcome;
use crate::domain::services::SlashOutcome;

fn print_message(message: &Message) {
    let sender = match message.sender {
        Sender::User => Paint::cyan(message.sender.to_string()).bold(),
        Sender::Bot => Paint::green(message.sender.to_string()).bold(),
    };

    if message.sender == Sender::Bot && message.text == FALLBACK_TEXT {
        println!("{sender}: {}", Paint::red(&message.text));
        return;
    }

    println!("{sender}: {}", message.text);
}

fn print_transcript(app_state: &AppState) {
    let title = app_state
        .ctx
        .title
        .clone()
        .unwrap_or_else(|| return "New chat".to_string());
    println!("{}", Paint::new(title).underline().bold());

    for message in &app_state.ctx.messages {
        print_message(message);
    }
}

fn print_notice(text: &str) {
    println!("{}", Paint::yellow(text));
}

fn print_prompt() {
    print!("{} ", Paint::cyan(">").bold());
    if let Err(err) = std::io::stdout().flush() {
        tracing::warn!(err = ?err, "Failed to flush stdout");
    }
}

async fn handle_slash_outcome(
    outcome: SlashOutcome,
    app_state: &mut AppState,
    identity: &IdentityService,
) -> bool {
    match outcome {
        SlashOutcome::Quit => {
            return true;
        }
        SlashOutcome::Print(text) => {
            println!("{text}");
        }
        SlashOutcome::Opened => {
            print_transcript(app_state);
        }
        SlashOutcome::Login => {
            if let Err(err) = cli::login(identity).await {
                println!("{}", Paint::red(format!("Login failed: {err}")));
            }
        }
        SlashOutcome::Logout => {
            if let Err(err) = identity.sign_out().await {
                println!("{}", Paint::red(format!("Logout failed: {err}")));
            }
        }
    }

    return false;
}

async fn open_requested_session(app_state: &mut AppState) {
    let session_id = Config::get(ConfigKey::SessionID);
    if session_id.is_empty() {
        return;
    }

    if let Err(err) = app_state.sync.load(&mut app_state.ctx, &session_id).await {
        println!("{}", Paint::red(format!("Failed to open chat: {err}")));
        return;
    }

    print_transcript(app_state);
}

async fn start_loop(
    app_state: &mut AppState,
    identity: &IdentityService,
    identity_rx: &mut mpsc::UnboundedReceiver<IdentityEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt();

        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(event) = identity_rx.recv() => {
                println!();
                print_notice(&app_state.handle_identity_event(event).await);
                continue;
            }
            _ = signal::ctrl_c() => None,
        };

        // End of input or Ctrl-C.
        let Some(text) = line else {
            println!();
            break;
        };

        if let Some(outcome) = app_state.handle_slash_command(&text).await {
            if handle_slash_outcome(outcome, app_state, identity).await {
                break;
            }
            continue;
        }

        if text.trim().is_empty() {
            continue;
        }

        println!("{}", Paint::new("Assistant is typing...").dimmed());
        let outcome = tokio::select! {
            outcome = app_state.submit(&text) => outcome,
            _ = signal::ctrl_c() => break,
        };

        if outcome != SendOutcome::Rejected {
            if let Some(reply) = app_state.ctx.messages.last() {
                print_message(reply);
            }
        }
    }

    return Ok(());
}

pub async fn start() -> Result<()> {
    let sync = cli::synchronizer_from_config().await?;
    let (identity, mut identity_rx) = cli::identity_from_config();
    let mut app_state = AppState::new(sync, identity.fallback().await?);

    identity.resolve().await?;
    if let Some(event) = identity_rx.recv().await {
        print_notice(&app_state.handle_identity_event(event).await);
    }
    println!("{}", Paint::new("Type /help for commands.").dimmed());
    open_requested_session(&mut app_state).await;

    let res = start_loop(&mut app_state, &identity, &mut identity_rx).await;

    app_state.sync.unload(&app_state.ctx).await;
    return res;
}

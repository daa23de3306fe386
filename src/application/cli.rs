use std::io;
use std::path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use dialoguer::Select;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::cache_dir;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credentials;
use crate::domain::models::Identity;
use crate::domain::models::IdentityEvent;
use crate::domain::models::IdentityProvider;
use crate::domain::models::StoreName;
use crate::domain::services::help_text;
use crate::domain::services::HistoryList;
use crate::domain::services::IdentityService;
use crate::domain::services::SessionSynchronizer;
use crate::infrastructure::generators::GeneratorManager;
use crate::infrastructure::identity::anonymous::AnonymousIdentity;
use crate::infrastructure::identity::supabase_auth::SupabaseAuth;
use crate::infrastructure::stores::SharedStore;
use crate::infrastructure::stores::StoreManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

/// Builds the configured store, scoped to the cached Supabase session when
/// there is one.
pub async fn store_from_config() -> Result<SharedStore> {
    let Some(name) = StoreName::parse(Config::get(ConfigKey::Store)) else {
        bail!(format!(
            "Unknown store '{}'. Possible values are: {}",
            Config::get(ConfigKey::Store),
            StoreName::VARIANTS.join(", ")
        ));
    };

    let access_token = SupabaseAuth::default()
        .cached_session()
        .await?
        .map(|session| return session.access_token);

    return StoreManager::get(name, access_token);
}

pub async fn synchronizer_from_config() -> Result<SessionSynchronizer> {
    return Ok(SessionSynchronizer::new(
        store_from_config().await?,
        GeneratorManager::get()?,
    ));
}

/// Identity service wired to Supabase auth. The receiver is returned so the
/// caller decides whether identity changes are observed.
pub fn identity_from_config() -> (IdentityService, mpsc::UnboundedReceiver<IdentityEvent>) {
    let (tx, rx) = mpsc::unbounded_channel::<IdentityEvent>();
    let service = IdentityService::new(
        Arc::new(SupabaseAuth::default()),
        AnonymousIdentity::default(),
        tx,
    );

    return (service, rx);
}

async fn current_identity() -> Result<Identity> {
    if let Some(identity) = SupabaseAuth::default().current_user().await? {
        return Ok(identity);
    }

    return AnonymousIdentity::default().load_or_create().await;
}

async fn load_history() -> Result<HistoryList> {
    let sync = synchronizer_from_config().await?;
    let identity = current_identity().await?;
    let mut history = HistoryList::default();
    history.load_for_user(&sync, &identity.id).await?;

    return Ok(history);
}

async fn print_sessions_list() -> Result<()> {
    let history = load_history().await?;

    if history.is_empty() {
        println!("There are no chats available. You should start your first one!");
    } else {
        println!("{}", history.format(""));
    }

    return Ok(());
}

async fn load_config_from_session_interactive() -> Result<()> {
    let history = load_history().await?;
    if history.is_empty() {
        println!("There are no chats available. You should start your first one!");
        return Ok(());
    }

    let session_options = history
        .sessions
        .iter()
        .map(|session| {
            return format!("{} - {}", session.display_title(), session.preview());
        })
        .collect::<Vec<String>>();

    let idx_opt = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which chat would you like to open?")
        .default(0)
        .items(&session_options)
        .interact_opt()?;

    if let Some(idx) = idx_opt {
        Config::set(ConfigKey::SessionID, &history.sessions[idx].session_id);
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn prompt_credentials(with_confirmation: bool) -> Result<Credentials> {
    let theme = ColorfulTheme::default();
    let email = Input::<String>::with_theme(&theme)
        .with_prompt("Email")
        .allow_empty(true)
        .interact_text()?;

    let mut password = Password::with_theme(&theme)
        .with_prompt("Password")
        .allow_empty_password(true);
    if with_confirmation {
        password = password.with_confirmation("Confirm password", "Passwords do not match.");
    }

    return Ok(Credentials::new(&email, &password.interact()?));
}

/// Interactive sign in, shared with the chat loop's `/login`.
pub async fn login(identity: &IdentityService) -> Result<Identity> {
    let credentials = prompt_credentials(false)?;
    return identity.sign_in(&credentials).await;
}

fn print_auth_result(res: Result<String>) {
    match res {
        Ok(msg) => println!("{}", Paint::green(msg)),
        Err(err) => println!("{}", Paint::red(err.to_string())),
    }
}

async fn reset_password(token: Option<&String>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let new_password = Password::with_theme(&theme)
        .with_prompt("New password")
        .allow_empty_password(true)
        .interact()?;
    let confirm_password = Password::with_theme(&theme)
        .with_prompt("Confirm new password")
        .allow_empty_password(true)
        .interact()?;

    let mut provider = SupabaseAuth::default();
    if let Some(token) = token {
        provider = provider.with_recovery_token(token);
    }
    let (tx, _rx) = mpsc::unbounded_channel::<IdentityEvent>();
    let recovery = IdentityService::new(Arc::new(provider), AnonymousIdentity::default(), tx);

    return recovery
        .reset_password(&new_password, &confirm_password)
        .await;
}

async fn run_auth(auth_matches: &clap::ArgMatches) -> Result<()> {
    let (identity, _rx) = identity_from_config();

    match auth_matches.subcommand() {
        Some(("login", _)) => match login(&identity).await {
            Ok(user) => println!("Signed in as {}", user.to_string()),
            Err(err) => println!("{}", Paint::red(format!("Login failed: {err}"))),
        },
        Some(("signup", _)) => {
            let credentials = prompt_credentials(true)?;
            print_auth_result(identity.sign_up(&credentials).await);
        }
        Some(("forgot-password", _)) => {
            let email = Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Email")
                .allow_empty(true)
                .interact_text()?;
            print_auth_result(
                identity
                    .send_password_reset(&email, &Config::get(ConfigKey::ResetRedirectURL))
                    .await,
            );
        }
        Some(("reset-password", reset_matches)) => {
            print_auth_result(reset_password(reset_matches.get_one::<String>("token")).await);
        }
        Some(("logout", _)) => {
            identity.sign_out().await?;
            println!("Signed out.");
        }
        Some(("whoami", _)) => {
            println!("{}", current_identity().await?.to_string());
        }
        _ => {
            subcommand_auth().print_long_help()?;
        }
    }

    return Ok(());
}

fn subcommand_auth() -> Command {
    return Command::new("auth")
        .about("Sign in, sign up and manage your password.")
        .arg_required_else_help(true)
        .subcommand(Command::new("login").about("Sign in with your e-mail and password."))
        .subcommand(Command::new("signup").about("Create an account. A verification e-mail is sent to you."))
        .subcommand(Command::new("forgot-password").about("E-mails you a password reset link."))
        .subcommand(
            Command::new("reset-password")
                .about("Sets a new password, either for the signed in account or with the token from a reset link.")
                .arg(
                    Arg::new("token")
                        .short('t')
                        .long("token")
                        .help("Access token from the password reset link.")
                        .num_args(1),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and remove the cached session."))
        .subcommand(Command::new("whoami").about("Print the identity chats are saved under."));
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for sistchat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running sistchat with environment variable RUST_LOG=sistchat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage past chats.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all previous chats, newest first."))
        .subcommand(
            Command::new("open")
                .about("Open a previous chat by ID. Omit passing any ID to load an interactive selection.")
                .arg(
                    clap::Arg::new(ConfigKey::SessionID.to_string())
                        .short('i')
                        .long("id")
                        .help("Session ID")
                        .required(false),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a previous chat.")
                .arg(
                    clap::Arg::new(ConfigKey::SessionID.to_string())
                        .short('i')
                        .long("id")
                        .help("Session ID")
                        .required(true),
                ),
        );
}

fn arg_store() -> Arg {
    return Arg::new(ConfigKey::Store.to_string())
        .long(ConfigKey::Store.to_string())
        .env("SISTCHAT_STORE")
        .num_args(1)
        .help(format!(
            "Where chat sessions are kept. [default: {}]",
            Config::default(ConfigKey::Store)
        ))
        .value_parser(PossibleValuesParser::new(StoreName::VARIANTS))
        .global(true);
}

fn arg_chat_timeout() -> Arg {
    return Arg::new(ConfigKey::ChatTimeout.to_string())
        .long(ConfigKey::ChatTimeout.to_string())
        .env("SISTCHAT_CHAT_TIMEOUT")
        .num_args(1)
        .help(format!("Time to wait in milliseconds for the assistant before replying with the fallback message. 0 waits forever. [default: {}]", Config::default(ConfigKey::ChatTimeout)))
        .global(true);
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start a new chat.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("sistchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_auth())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_sessions())
        .arg(arg_store())
        .arg(arg_chat_timeout())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("SISTCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::SupabaseURL.to_string())
                .long(ConfigKey::SupabaseURL.to_string())
                .env("SISTCHAT_SUPABASE_URL")
                .num_args(1)
                .help("Supabase project URL, used for sign in and the chat_sessions table.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SupabaseKey.to_string())
                .long(ConfigKey::SupabaseKey.to_string())
                .env("SISTCHAT_SUPABASE_KEY")
                .num_args(1)
                .help("Supabase anon key for the project.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ChatURL.to_string())
                .long(ConfigKey::ChatURL.to_string())
                .env("SISTCHAT_CHAT_URL")
                .num_args(1)
                .help(format!("Chat endpoint that generates the assistant's replies. [default: {}]", Config::default(ConfigKey::ChatURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AuthFile.to_string())
                .long(ConfigKey::AuthFile.to_string())
                .env("SISTCHAT_AUTH_FILE")
                .num_args(1)
                .help(format!("File the signed in session is cached in. [default: {}]", Config::default(ConfigKey::AuthFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SessionsDir.to_string())
                .long(ConfigKey::SessionsDir.to_string())
                .env("SISTCHAT_SESSIONS_DIR")
                .num_args(1)
                .help(format!("Directory chats are written to when using the local store. [default: {}]", Config::default(ConfigKey::SessionsDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ResetRedirectURL.to_string())
                .long(ConfigKey::ResetRedirectURL.to_string())
                .env("SISTCHAT_RESET_REDIRECT_URL")
                .num_args(1)
                .help(format!("Page password reset e-mails link back to. [default: {}]", Config::default(ConfigKey::ResetRedirectURL)))
                .global(true),
        );
}

/// Parses arguments and runs one-shot subcommands. Returns true when the
/// chat loop should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = cache_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("auth", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_auth(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("sessions", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("list", _)) => {
                    print_sessions_list().await?;
                    return Ok(false);
                }
                Some(("open", open_matches)) => {
                    if let Some(session_id) =
                        open_matches.get_one::<String>(&ConfigKey::SessionID.to_string())
                    {
                        Config::set(ConfigKey::SessionID, session_id);
                    } else {
                        load_config_from_session_interactive().await?;
                        if Config::get(ConfigKey::SessionID).is_empty() {
                            return Ok(false);
                        }
                    }
                }
                Some(("delete", delete_matches)) => {
                    if let Some(session_id) =
                        delete_matches.get_one::<String>(&ConfigKey::SessionID.to_string())
                    {
                        store_from_config().await?.delete(session_id).await?;
                        println!("Deleted session {session_id}");
                    }
                    return Ok(false);
                }
                _ => {
                    subcommand_sessions().print_long_help()?;
                    return Ok(false);
                }
            }
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}

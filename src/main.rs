use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cognicanvas::chat::{
    ChatClient, ChatClientBuilder, ChatClientTrait, ChatError, ChatRole, ChatTranscript,
};
use cognicanvas::config::Config;
use cognicanvas::gamification;
use cognicanvas::server::{self, AppState};
use cognicanvas::utils::ensure_database_directory;
use cognicanvas::{CanvasService, Database, ServiceError, UserId};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

/// cognicanvas - subjects, notebooks and notes with highlights and a study assistant
#[derive(Parser)]
#[command(name = "cognicanvas")]
#[command(about = "A notebook workspace for studying: subjects, notebooks, notes and highlights")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),
    /// Browse subjects, notebooks and notes in the terminal
    Tui,
    /// Talk to the study assistant
    Chat(ChatCommand),
    /// Show study stats and achievements
    Stats(StatsCommand),
}

#[derive(Parser)]
struct ServeCommand {
    /// Address to listen on (overrides COGNICANVAS_BIND)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
}

#[derive(Parser)]
struct ChatCommand {
    /// Send a single message and print the reply instead of starting a session
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,
}

#[derive(Parser)]
struct StatsCommand {
    /// Acting user (defaults to COGNICANVAS_USER)
    #[arg(short, long, value_name = "USER")]
    user: Option<String>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = Config::from_env().and_then(|config| match &cli.command {
        Commands::Serve(cmd) => handle_serve(cmd, config),
        Commands::Tui => cognicanvas::tui::run(&config),
        Commands::Chat(cmd) => handle_chat(cmd, &config),
        Commands::Stats(cmd) => handle_stats(cmd, &config),
    });

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are validation failures and missing entities, plus chat
/// calls that cannot be made with the current input or configuration.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(err) = cause.downcast_ref::<ServiceError>() {
            return err.is_user_error();
        }
        matches!(
            cause.downcast_ref::<ChatError>(),
            Some(ChatError::EmptyMessage | ChatError::MissingApiKey)
        )
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cognicanvas=info,tower_http=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn open_service(config: &Config) -> Result<CanvasService> {
    ensure_database_directory(&config.database_path)?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;
    Ok(CanvasService::new(db).with_max_batch_operations(config.max_batch_operations))
}

fn chat_client(config: &Config) -> Result<ChatClient> {
    ChatClientBuilder::new()
        .maybe_api_key(config.chat_api_key.clone())
        .endpoint(&config.chat_api_url)
        .model(&config.chat_model)
        .build()
        .context("Failed to create chat client")
}

/// Starts the HTTP API and blocks until Ctrl-C.
///
/// The chat client is built before the runtime starts since its blocking
/// transport must not be created on an async worker.
fn handle_serve(cmd: &ServeCommand, config: Config) -> Result<()> {
    init_tracing();

    let service = open_service(&config)?;
    let chat = chat_client(&config)?;
    if !chat.is_configured() {
        tracing::warn!("no chat API key configured; /api/chat will return errors");
    }
    let bind = cmd.bind.unwrap_or(config.bind);
    let state = AppState::new(service, Arc::new(chat), config.default_user);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("Failed to bind {bind}"))?;
        server::serve(listener, state).await
    })
}

/// Runs a one-shot message or an interactive session on stdin.
fn handle_chat(cmd: &ChatCommand, config: &Config) -> Result<()> {
    init_tracing();
    let client = chat_client(config)?;

    if let Some(message) = &cmd.message {
        let mut transcript = ChatTranscript::new();
        return match transcript.send(&client, message) {
            Some(reply) => {
                println!("{}", reply?);
                Ok(())
            }
            None => Err(ChatError::EmptyMessage.into()),
        };
    }

    let mut transcript = ChatTranscript::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_chat_session(&mut transcript, &client, stdin.lock(), &mut stdout)
}

/// Reads one message per line until EOF or `/quit`, printing each reply.
fn run_chat_session(
    transcript: &mut ChatTranscript,
    client: &dyn ChatClientTrait,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    for message in transcript.messages() {
        writeln!(output, "{}", message.content)?;
    }

    write!(output, "> ")?;
    output.flush()?;
    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        if line.trim() == "/quit" {
            break;
        }
        if transcript.send(client, &line).is_some()
            && let Some(reply) = transcript.messages().last()
            && reply.role == ChatRole::Bot
        {
            writeln!(output, "{}", reply.content)?;
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

fn handle_stats(cmd: &StatsCommand, config: &Config) -> Result<()> {
    let service = open_service(config)?;
    let user = cmd
        .user
        .as_deref()
        .map(UserId::from)
        .unwrap_or_else(|| config.default_user.clone());

    let stats = service
        .user_stats(&user, OffsetDateTime::now_utc())
        .context("Failed to compute stats")?;
    let achievements = gamification::evaluate(&stats);

    if cmd.json {
        let body = serde_json::json!({ "stats": stats, "achievements": achievements });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Streak: {} days (longest {})", stats.current_streak, stats.longest_streak);
    println!(
        "Subjects: {}  Notebooks: {}  Notes: {}  Highlights: {}",
        stats.total_subjects, stats.total_notebooks, stats.total_notes, stats.total_important_snippets
    );
    println!();
    for achievement in &achievements {
        let mark = if achievement.unlocked { "x" } else { " " };
        println!(
            "[{mark}] {} {} ({}/{}) - {}",
            achievement.icon,
            achievement.title,
            achievement.progress,
            achievement.max_progress,
            achievement.description
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ChatClientTrait for Echo {
        fn complete(&self, message: &str) -> Result<String, ChatError> {
            Ok(format!("echo: {message}"))
        }
    }

    #[test]
    fn validation_errors_are_user_errors() {
        let err = anyhow::Error::from(ServiceError::Validation("Name is required".into()));
        assert!(is_user_error(&err));
    }

    #[test]
    fn wrapped_not_found_is_user_error() {
        let err = anyhow::Error::from(ServiceError::NotFound {
            entity: "note",
            id: 7,
        })
        .context("Failed to compute stats");
        assert!(is_user_error(&err));
    }

    #[test]
    fn database_errors_are_internal() {
        let err = anyhow::Error::from(ServiceError::Database(rusqlite::Error::InvalidQuery));
        assert!(!is_user_error(&err));
        assert!(!is_user_error(&anyhow::anyhow!("disk on fire")));
    }

    #[test]
    fn missing_chat_key_is_user_error() {
        assert!(is_user_error(&anyhow::Error::from(ChatError::MissingApiKey)));
    }

    #[test]
    fn chat_session_prints_replies_until_quit() {
        let mut transcript = ChatTranscript::new();
        let input = io::Cursor::new("hello\n\n/quit\nignored\n");
        let mut output = Vec::new();

        run_chat_session(&mut transcript, &Echo, input, &mut output).unwrap();

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Welcome to CogniCanvas!"));
        assert!(printed.contains("echo: hello"));
        assert!(!printed.contains("ignored"));
        assert_eq!(transcript.messages().len(), 3);
    }
}

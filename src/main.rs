use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use medicynth_core::{
    config, ChatApi, ChatController, Config, HttpChatClient, MemoryPreferences, ViewModel,
};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::{App, Settings};

#[derive(Parser)]
#[command(name = "medicynth")]
#[command(about = "Chat with the Medicynth health assistant from the terminal")]
#[command(version)]
struct Cli {
    /// Base URL of the chat server
    #[arg(long, env = "MEDICYNTH_SERVER", global = true)]
    server: Option<String>,

    /// Command whose stdout lines are used as speech input
    #[arg(long, env = "MEDICYNTH_SPEECH_COMMAND", global = true)]
    speech_command: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Send {
        /// Message text
        message: String,
        /// File to attach
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },
    /// Ask the server to forget the conversation history
    Clear,
    /// Save --server and --speech-command as defaults
    SaveConfig,
}

fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        // The terminal UI owns stderr, so logs go next to the config file
        let dir = config::config_dir()?;
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("medicynth.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);
    init_logging(matches!(command, Commands::Chat))?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    let settings = Settings {
        server_url: cli.server.clone().unwrap_or_else(|| config.server_url().to_string()),
        speech_command: cli.speech_command.clone().or_else(|| config.speech_command.clone()),
    };

    match command {
        Commands::Chat => run_tui(settings).await,
        Commands::Send { message, attach } => send_once(&settings, &message, attach).await,
        Commands::Clear => {
            HttpChatClient::new(&settings.server_url).clear_history().await?;
            println!("Conversation history cleared.");
            Ok(())
        }
        Commands::SaveConfig => {
            let config = Config {
                server_url: cli.server.or(config.server_url),
                speech_command: cli.speech_command.or(config.speech_command),
            };
            config.save()?;
            println!("Saved server {}", config.server_url());
            Ok(())
        }
    }
}

async fn run_tui(settings: Settings) -> Result<()> {
    tracing::info!(server = %settings.server_url, "starting chat");

    let (mut app, speech_rx) = App::new(settings);
    let mut events = tui::EventHandler::new(speech_rx);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => handler::handle_event(&mut app, event)?,
                    None => break,
                },
                Some(joined) = app.tasks.next(), if !app.tasks.is_empty() => match joined {
                    Ok(outcome) => app.complete(outcome),
                    Err(e) => tracing::error!(error = %e, "background task failed"),
                },
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn send_once(settings: &Settings, message: &str, attach: Option<PathBuf>) -> Result<()> {
    let api = Arc::new(HttpChatClient::new(&settings.server_url));
    let mut controller = ChatController::new(
        api,
        ViewModel::default(),
        Box::new(MemoryPreferences::default()),
    );

    if let Some(path) = attach {
        controller.attach(&path).await;
        if controller.pending_attachment().is_none() {
            return Err(anyhow!("could not read attachment {}", path.display()));
        }
    }

    let before = controller.view().turns.len();
    controller.submit(message).await;

    let Some(reply) = controller.view().turns.last().filter(|_| controller.view().turns.len() > before) else {
        return Err(anyhow!("nothing to send"));
    };

    if reply.is_error {
        return Err(anyhow!(reply.visible_text()));
    }
    println!("{}", reply.copy_text());
    Ok(())
}

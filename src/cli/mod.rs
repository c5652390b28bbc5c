use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::HttpChatClient;
use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV};

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, PostArgs, SearchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "chattui",
    version,
    about = "Terminal client for a REST chat message board"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over CHATTUI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Chat server base URL for this run (overrides server.base_url)
    #[arg(long)]
    pub server: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print every message on the board
    List,
    /// Print the message posted by a username
    Search(SearchArgs),
    /// Post a new message
    Post(PostArgs),
    /// Replace the text of an existing message
    Edit(EditArgs),
    /// Delete a message and print the remaining board
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so its logs go to a file.
    let log_file = matches!(command, Commands::Tui).then(|| loader.paths().log_file());
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    if let Some(server) = &cli.server {
        config.override_base_url(server)?;
    }
    let api = HttpChatClient::new(&config.server).context("building chat client")?;
    tracing::info!(base_url = %api.base_url(), "using chat server");

    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, api);
            commands::run_tui(&mut app)
        }
        Commands::List => commands::list_chats(&api),
        Commands::Search(args) => commands::search_chats(&api, args),
        Commands::Post(args) => commands::post_chat(&api, args),
        Commands::Edit(args) => commands::edit_chat(&api, args),
        Commands::Delete(args) => commands::delete_chat(&api, args),
    }
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}

mod app;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use flashdeck_lib::config::{Config, StoreBackend};
use flashdeck_lib::store::Store;

use app::App;

#[derive(Parser)]
#[command(name = "flashdeck-cli", about = "Words, flashcards and decks from the terminal", version)]
struct Cli {
    /// Config file (default: <config dir>/flashdeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Save an access token in the system keyring
    Login {
        token: String,
    },

    /// Remove the saved access token
    Logout,

    #[command(flatten)]
    Data(DataCommand),
}

/// Commands that need an open store
#[derive(Subcommand)]
pub enum DataCommand {
    /// Vocabulary words
    #[command(subcommand)]
    Words(WordsCommand),

    /// Flashcards
    #[command(subcommand)]
    Cards(CardsCommand),

    /// Decks
    #[command(subcommand)]
    Decks(DecksCommand),

    /// Cards inside one deck
    #[command(subcommand)]
    Deck(DeckCommand),

    /// Study a deck card by card
    Study {
        deck_id: Uuid,
    },

    /// Generate a phrase using some of the given words
    Phrase {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Page number (1-based, clamped to the last page)
    #[arg(long, default_value = "1")]
    pub page: i64,

    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Reverse the column's default direction
    #[arg(long)]
    pub reverse: bool,
}

#[derive(Subcommand)]
pub enum WordsCommand {
    /// List words, one page at a time
    List(ListArgs),
    /// Add a word
    Add { text: String },
    /// Delete a word
    Delete { id: Uuid },
}

#[derive(Subcommand)]
pub enum CardsCommand {
    /// List flashcards, one page at a time
    List(ListArgs),
    /// Create a flashcard
    Add {
        front: String,
        #[arg(long)]
        back: Option<String>,
        /// Language code (default: es)
        #[arg(long)]
        language: Option<String>,
    },
    /// Change fields of a flashcard
    Update {
        id: Uuid,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Delete a flashcard
    Delete { id: Uuid },
    /// Fill in the back of a flashcard with a machine translation
    Translate { id: Uuid },
}

#[derive(Subcommand)]
pub enum DecksCommand {
    /// List decks, one page at a time
    List(ListArgs),
    /// Create a deck
    Add { name: String },
    /// Rename a deck
    Rename { id: Uuid, name: String },
    /// Delete a deck
    Delete { id: Uuid },
}

#[derive(Subcommand)]
pub enum DeckCommand {
    /// Cards in a deck, in position order
    Show { deck_id: Uuid },
    /// Append a flashcard to a deck
    Add { deck_id: Uuid, card_id: Uuid },
    /// Remove a card from its deck by membership id
    Remove { membership_id: Uuid },
    /// Flashcards not yet in a deck
    Available { deck_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Login { token } => commands::auth::login(&token),
        Command::Logout => commands::auth::logout(),
        Command::Data(command) => {
            let credentials = app::credentials();
            match config.store.backend {
                StoreBackend::Sqlite => {
                    let store = app::open_sqlite(&config)?;
                    run(App::new(store, credentials, config), command, &cli.format).await
                }
                StoreBackend::Rest => {
                    let store = app::open_rest(&config, credentials.clone())?;
                    run(App::new(store, credentials, config), command, &cli.format).await
                }
            }
        }
    }
}

async fn run<S: Store>(app: App<S>, command: DataCommand, format: &OutputFormat) -> Result<()> {
    match command {
        DataCommand::Words(cmd) => commands::words::run(&app, cmd, format).await,
        DataCommand::Cards(cmd) => commands::cards::run(&app, cmd, format).await,
        DataCommand::Decks(cmd) => commands::decks::run(&app, cmd, format).await,
        DataCommand::Deck(cmd) => commands::deck::run(&app, cmd, format).await,
        DataCommand::Study { deck_id } => commands::study::run(&app, deck_id).await,
        DataCommand::Phrase { words } => commands::phrase::run(&app, &words, format).await,
    }
}

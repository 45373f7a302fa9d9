use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use flashdeck_lib::collection::CollectionViewModel;
use flashdeck_lib::config::Config;
use flashdeck_lib::credentials::{ChainedProvider, CredentialProvider, EnvToken, KeyringToken};
use flashdeck_lib::flashcards::{Deck, Flashcard, Word};
use flashdeck_lib::membership::DeckMembershipManager;
use flashdeck_lib::store::{RestStore, SqliteStore, Store};
use flashdeck_lib::translation::TranslationGateway;

/// Keyring account the access token is saved under
pub const KEYRING_USER: &str = "access-token";

/// Environment token first, then the keyring
pub fn credentials() -> Arc<dyn CredentialProvider> {
    Arc::new(
        ChainedProvider::new()
            .with(EnvToken::default())
            .with(KeyringToken::new(KEYRING_USER)),
    )
}

pub fn open_sqlite(config: &Config) -> Result<SqliteStore> {
    let path = config
        .database_path()
        .context("Failed to resolve database path")?;
    log::debug!("Opening database at {}", path.display());
    SqliteStore::open(&path).with_context(|| format!("Failed to open database {}", path.display()))
}

pub fn open_rest(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<RestStore> {
    let (url, api_key) = config.rest_endpoint().context("Hosted store is not configured")?;
    RestStore::new(url, api_key, credentials).context("Failed to create store client")
}

/// Shared state for CLI commands
pub struct App<S: Store> {
    pub store: Arc<S>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub config: Config,
}

impl<S: Store> App<S> {
    pub fn new(store: S, credentials: Arc<dyn CredentialProvider>, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            credentials,
            config,
        }
    }

    pub fn words(&self) -> CollectionViewModel<Word, S> {
        CollectionViewModel::new(Arc::clone(&self.store))
    }

    pub fn flashcards(&self) -> CollectionViewModel<Flashcard, S> {
        CollectionViewModel::new(Arc::clone(&self.store))
    }

    pub fn decks(&self) -> CollectionViewModel<Deck, S> {
        CollectionViewModel::new(Arc::clone(&self.store))
    }

    pub fn membership(&self) -> DeckMembershipManager<S> {
        DeckMembershipManager::new(Arc::clone(&self.store))
    }

    pub fn gateway(&self) -> Result<TranslationGateway> {
        let inference = &self.config.inference;
        TranslationGateway::new(
            inference.base_url.clone(),
            Arc::clone(&self.credentials),
            Duration::from_secs(inference.timeout_secs),
        )
        .context("Failed to create inference client")
    }
}

//! Access-token providers.
//!
//! The engine never establishes a session itself. Whoever owns the session
//! hands the engine a [`CredentialProvider`], and every authenticated call
//! asks it for the current token right before the request goes out.

use std::sync::Arc;

/// Keyring service name for the stored access token
pub const KEYRING_SERVICE: &str = "flashdeck";

/// Environment variable read by [`EnvToken`]
pub const ACCESS_TOKEN_VAR: &str = "FLASHDECK_ACCESS_TOKEN";

pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, or `None` when no session is available
    fn access_token(&self) -> Option<String>;
}

fn non_empty(token: String) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// A fixed token, or none at all
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(non_empty(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Token read from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_VAR)
    }
}

impl CredentialProvider for EnvToken {
    fn access_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().and_then(non_empty)
    }
}

/// Token kept in the platform keyring
#[derive(Debug, Clone)]
pub struct KeyringToken {
    user: String,
}

impl KeyringToken {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    fn entry(&self) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(KEYRING_SERVICE, &self.user)
    }

    pub fn store(&self, token: &str) -> Result<(), keyring::Error> {
        self.entry()?.set_password(token)
    }

    pub fn clear(&self) -> Result<(), keyring::Error> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl CredentialProvider for KeyringToken {
    fn access_token(&self) -> Option<String> {
        let entry = self.entry().ok()?;
        match entry.get_password() {
            Ok(token) => non_empty(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                log::warn!("Failed to read access token from keyring: {}", e);
                None
            }
        }
    }
}

/// Tries each provider in order and returns the first token found
#[derive(Clone, Default)]
pub struct ChainedProvider {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }
}

impl CredentialProvider for ChainedProvider {
    fn access_token(&self) -> Option<String> {
        self.providers.iter().find_map(|p| p.access_token())
    }
}

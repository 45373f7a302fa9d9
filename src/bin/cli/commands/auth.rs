use anyhow::{bail, Context, Result};

use flashdeck_lib::credentials::KeyringToken;

use crate::app::KEYRING_USER;

pub fn login(token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("Access token must not be empty");
    }
    KeyringToken::new(KEYRING_USER)
        .store(token)
        .context("Failed to save access token to the keyring")?;
    println!("Access token saved.");
    Ok(())
}

pub fn logout() -> Result<()> {
    KeyringToken::new(KEYRING_USER)
        .clear()
        .context("Failed to remove access token from the keyring")?;
    println!("Logged out.");
    Ok(())
}

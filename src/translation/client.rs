//! HTTP client for the inference service's phrase and translation endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::models::{ErrorBody, PhraseRequest, PhraseResponse, TranslateRequest, Translation};
use crate::credentials::CredentialProvider;
use crate::error::{require_text, Error, Result};
use crate::flashcards::{Flashcard, FlashcardPatch};

/// Where the inference service listens when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Authenticated client for the inference service
pub struct TranslationGateway {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl TranslationGateway {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::ValidationFailed(
                "Inference service URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::server(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Generate a phrase that uses some of `words`.
    pub async fn generate_phrase(&self, words: &[String]) -> Result<PhraseResponse> {
        let token = self.token()?;
        if words.is_empty() {
            return Err(Error::ValidationFailed(
                "At least one word is required".to_string(),
            ));
        }
        self.post(&token, "/api/random-phrase", &PhraseRequest { words })
            .await
    }

    /// Translate `text` into the language with code `language`.
    pub async fn translate(&self, text: &str, language: &str) -> Result<Translation> {
        let token = self.token()?;
        require_text("text", text)?;
        require_text("language", language)?;
        self.post(
            &token,
            "/api/translate-flashcard",
            &TranslateRequest { text, language },
        )
        .await
    }

    /// The caller's access token. Checked before any input validation.
    fn token(&self) -> Result<String> {
        self.credentials
            .access_token()
            .ok_or(Error::Unauthenticated)
    }

    async fn post<B, T>(&self, token: &str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Inference service unreachable at {}: {}", url, e);
                Error::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = server_error(status, &body);
            log::warn!("Inference service returned {}: {}", status, error);
            return Err(error);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::server(format!("Invalid response from inference service: {}", e)))
    }
}

/// The body's `error` field when present, otherwise the status text.
fn server_error(status: StatusCode, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        });
    Error::ServerError {
        status: Some(status.as_u16()),
        message,
    }
}

/// Translate a card's front into its language and return the patch that
/// stores the result as its back.
pub async fn enrich_flashcard(
    gateway: &TranslationGateway,
    card: &Flashcard,
) -> Result<FlashcardPatch> {
    let translation = gateway.translate(&card.front, &card.language).await?;
    Ok(FlashcardPatch {
        back: Some(translation.translation),
        ..Default::default()
    })
}

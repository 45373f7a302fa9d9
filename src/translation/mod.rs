//! Phrase generation and translation through the inference service
//!
//! Every call needs a bearer token from the injected credential provider and
//! fails with `Unauthenticated` before any request is sent when there is
//! none. Calls are never retried here.

pub mod client;
pub mod models;

pub use client::{enrich_flashcard, TranslationGateway, DEFAULT_BASE_URL};
pub use models::{PhraseResponse, Translation};

//! Client engine for a vocabulary and flashcards app: paginated collections,
//! deck membership, study sessions and the inference-service gateway.

pub mod collection;
pub mod config;
pub mod credentials;
pub mod error;
pub mod flashcards;
pub mod membership;
pub mod store;
pub mod study;
pub mod translation;

#[cfg(test)]
mod test_support;

pub use error::{Error, ErrorKind, Result};

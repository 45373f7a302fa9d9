//! Wire types for the inference service

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PhraseRequest<'a> {
    pub words: &'a [String],
}

/// A generated sentence and the input words it actually used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseResponse {
    pub phrase: String,
    pub words_used: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translation: String,
}

/// Body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

//! Data models for words, flashcards, decks and deck membership

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_text, Result};
use crate::store::{Editable, Resource, SortColumn, SortDirection};

/// Language assigned to a flashcard when none is given
pub const DEFAULT_LANGUAGE: &str = "es";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("nl", "Dutch"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
];

/// Display name for a language code, falling back to the code itself
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Checks run on drafts and patches before they reach the store
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// ==================== Words ====================

/// A vocabulary word. Words are never edited, only created and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: Uuid,
    #[serde(rename = "word")]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordDraft {
    pub word: String,
}

impl WordDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            word: text.into().trim().to_string(),
        }
    }
}

impl Validate for WordDraft {
    fn validate(&self) -> Result<()> {
        require_text("word", &self.word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordColumn {
    #[default]
    CreatedAt,
    Word,
}

impl SortColumn for WordColumn {
    const ALL: &'static [Self] = &[Self::CreatedAt, Self::Word];

    fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Word => "word",
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            Self::CreatedAt => SortDirection::Desc,
            Self::Word => SortDirection::Asc,
        }
    }
}

impl Resource for Word {
    type Column = WordColumn;
    type Draft = WordDraft;

    const TABLE: &'static str = "words";
    const NAME: &'static str = "Word";
    const HAS_UPDATED_AT: bool = false;

    fn id(&self) -> Uuid {
        self.id
    }
}

// ==================== Flashcards ====================

/// A flashcard with a prompt (front) and an optional answer (back).
///
/// `back` stays empty until it is written by hand or filled in by the
/// translation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    #[serde(default)]
    pub back: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

impl Flashcard {
    pub fn language_name(&self) -> &str {
        language_name(&self.language)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlashcardDraft {
    pub front: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
}

impl FlashcardDraft {
    pub fn new(front: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: None,
            language: DEFAULT_LANGUAGE.to_string(),
            owner_id: None,
        }
    }

    pub fn back(mut self, back: impl Into<String>) -> Self {
        self.back = Some(back.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Validate for FlashcardDraft {
    fn validate(&self) -> Result<()> {
        require_text("front", &self.front)?;
        require_text("language", &self.language)
    }
}

/// Partial update for a flashcard; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlashcardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Validate for FlashcardPatch {
    fn validate(&self) -> Result<()> {
        if let Some(front) = &self.front {
            require_text("front", front)?;
        }
        if let Some(language) = &self.language {
            require_text("language", language)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashcardColumn {
    #[default]
    CreatedAt,
    Front,
    Back,
}

impl SortColumn for FlashcardColumn {
    const ALL: &'static [Self] = &[Self::CreatedAt, Self::Front, Self::Back];

    fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            Self::CreatedAt => SortDirection::Desc,
            Self::Front | Self::Back => SortDirection::Asc,
        }
    }
}

impl Resource for Flashcard {
    type Column = FlashcardColumn;
    type Draft = FlashcardDraft;

    const TABLE: &'static str = "flashcards";
    const NAME: &'static str = "Flashcard";
    const HAS_UPDATED_AT: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Editable for Flashcard {
    type Patch = FlashcardPatch;
}

// ==================== Decks ====================

/// A named, ordered collection of flashcards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckDraft {
    pub name: String,
}

impl DeckDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Validate for DeckDraft {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Validate for DeckPatch {
    fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => require_text("name", name),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeckColumn {
    #[default]
    CreatedAt,
    Name,
}

impl SortColumn for DeckColumn {
    const ALL: &'static [Self] = &[Self::CreatedAt, Self::Name];

    fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Name => "name",
        }
    }

    fn default_direction(self) -> SortDirection {
        match self {
            Self::CreatedAt => SortDirection::Desc,
            Self::Name => SortDirection::Asc,
        }
    }
}

impl Resource for Deck {
    type Column = DeckColumn;
    type Draft = DeckDraft;

    const TABLE: &'static str = "decks";
    const NAME: &'static str = "Deck";
    const HAS_UPDATED_AT: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Editable for Deck {
    type Patch = DeckPatch;
}

// ==================== Membership ====================

/// Row linking one flashcard into one deck.
///
/// `position` is unique within the deck and never renumbered, so removals
/// leave gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub flashcard_id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMembership {
    pub deck_id: Uuid,
    pub flashcard_id: Uuid,
    pub position: u32,
}

/// A flashcard as it appears inside a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckFlashcard {
    pub flashcard: Flashcard,
    pub membership_id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
}

//! Relational store access.
//!
//! Every collection the engine reads or writes goes through the [`Store`]
//! trait. Two backends implement it:
//! - [`SqliteStore`]: embedded SQLite database with the full schema
//! - [`RestStore`]: PostgREST-compatible HTTP API of the hosted database
//!
//! The store is the single source of truth. Uniqueness of deck membership
//! (`deck_id`, `flashcard_id`) and of positions within a deck must be
//! enforced by the store itself; callers only detect the resulting
//! `Conflict`.

pub mod rest;
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::flashcards::{DeckFlashcard, Flashcard, Membership, NewMembership, Validate};

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Table name of the deck/flashcard join relation
pub const MEMBERSHIP_TABLE: &str = "deck_flashcards";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A column a collection can be ordered by
pub trait SortColumn: Copy + Eq + Debug + Default + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Column name in the store
    fn as_str(self) -> &'static str;

    /// Direction adopted when the column is first selected
    fn default_direction(self) -> SortDirection;

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

/// Column plus direction for an ordered select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: SortColumn> Order<C> {
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// The column with its default direction
    pub fn by(column: C) -> Self {
        Self::new(column, column.default_direction())
    }
}

impl<C: SortColumn> Default for Order<C> {
    fn default() -> Self {
        Self::by(C::default())
    }
}

/// A collection in the store with a typed row.
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    type Column: SortColumn;
    type Draft: Serialize + Validate + Debug + Send + Sync;

    const TABLE: &'static str;
    /// Human readable name used in errors and logs
    const NAME: &'static str;
    /// Whether updates stamp an `updated_at` column
    const HAS_UPDATED_AT: bool;

    fn id(&self) -> Uuid;
}

/// A resource whose rows can be updated in place
pub trait Editable: Resource {
    type Patch: Serialize + Validate + Debug + Send + Sync;
}

/// Typed result of the membership join: one `deck_flashcards` row with its
/// flashcard embedded under `flashcards`.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRow {
    pub id: Uuid,
    pub position: u32,
    pub added_at: DateTime<Utc>,
    pub flashcards: Flashcard,
}

impl From<MembershipRow> for DeckFlashcard {
    fn from(row: MembershipRow) -> Self {
        DeckFlashcard {
            flashcard: row.flashcards,
            membership_id: row.id,
            position: row.position,
            added_at: row.added_at,
        }
    }
}

/// The query surface the engine needs from a relational store.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Exact number of rows in the collection
    async fn count<R: Resource>(&self) -> Result<u64>;

    /// Ordered slice of the collection starting at `offset`
    async fn select_page<R: Resource>(
        &self,
        order: Order<R::Column>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>>;

    async fn get<R: Resource>(&self, id: Uuid) -> Result<R>;

    async fn insert<R: Resource>(&self, draft: &R::Draft) -> Result<R>;

    async fn update<R: Editable>(&self, id: Uuid, patch: &R::Patch) -> Result<R>;

    async fn delete<R: Resource>(&self, id: Uuid) -> Result<()>;

    // ==================== Membership ====================

    /// Highest position currently used in the deck
    async fn max_position(&self, deck_id: Uuid) -> Result<Option<u32>>;

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Membership>;

    async fn delete_membership(&self, id: Uuid) -> Result<()>;

    /// Memberships of a deck joined with their flashcards, ascending by position
    async fn deck_memberships(&self, deck_id: Uuid) -> Result<Vec<MembershipRow>>;

    /// Flashcards with no membership in the deck, ascending by front text
    async fn flashcards_outside_deck(&self, deck_id: Uuid) -> Result<Vec<Flashcard>>;
}

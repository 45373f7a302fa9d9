//! Deck ↔ flashcard membership.
//!
//! Holds no state of its own: every call reads or writes the store directly.
//! Positions are assigned as one past the deck's highest position (0 for an
//! empty deck) and are never renumbered, so removing a card leaves a gap.
//!
//! Two concurrent `add` calls on the same deck can compute the same next
//! position. Only the store can settle that race: it must reject the second
//! insert with a uniqueness violation, which surfaces here as `Conflict`.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::flashcards::{Deck, DeckFlashcard, Flashcard, Membership, NewMembership};
use crate::store::Store;

/// Position for the next card given the deck's current maximum
pub fn next_position(max: Option<u32>) -> u32 {
    max.map_or(0, |p| p + 1)
}

pub struct DeckMembershipManager<S: Store> {
    store: Arc<S>,
}

impl<S: Store> DeckMembershipManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a flashcard to the end of a deck.
    ///
    /// Fails with `NotFound` when either id is unknown and with `Conflict`
    /// when the card is already in the deck.
    pub async fn add(&self, deck_id: Uuid, flashcard_id: Uuid) -> Result<Membership> {
        tokio::try_join!(
            self.store.get::<Deck>(deck_id),
            self.store.get::<Flashcard>(flashcard_id),
        )?;

        let position = next_position(self.store.max_position(deck_id).await?);
        let membership = self
            .store
            .insert_membership(&NewMembership {
                deck_id,
                flashcard_id,
                position,
            })
            .await
            .map_err(|e| {
                log::warn!(
                    "Adding flashcard {} to deck {} failed: {}",
                    flashcard_id,
                    deck_id,
                    e
                );
                e
            })?;

        log::info!(
            "Added flashcard {} to deck {} at position {}",
            flashcard_id,
            deck_id,
            position
        );
        Ok(membership)
    }

    /// Remove a membership by its own id. Other positions are left as-is.
    pub async fn remove(&self, membership_id: Uuid) -> Result<()> {
        self.store.delete_membership(membership_id).await?;
        log::info!("Removed membership {}", membership_id);
        Ok(())
    }

    /// Cards in the deck, ascending by position.
    pub async fn list(&self, deck_id: Uuid) -> Result<Vec<DeckFlashcard>> {
        let rows = self.store.deck_memberships(deck_id).await?;
        log::debug!("Deck {} has {} flashcards", deck_id, rows.len());
        Ok(rows.into_iter().map(DeckFlashcard::from).collect())
    }

    /// Every flashcard not currently in the deck, ascending by front text.
    pub async fn available_flashcards(&self, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        self.store.flashcards_outside_deck(deck_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::flashcards::{DeckDraft, FlashcardDraft};
    use crate::store::SqliteStore;

    struct Fixture {
        store: Arc<SqliteStore>,
        manager: DeckMembershipManager<SqliteStore>,
        deck: Deck,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let deck = store.insert::<Deck>(&DeckDraft::new("Basics")).await.unwrap();
        Fixture {
            manager: DeckMembershipManager::new(Arc::clone(&store)),
            store,
            deck,
        }
    }

    async fn card(store: &SqliteStore, front: &str) -> Flashcard {
        store.insert::<Flashcard>(&FlashcardDraft::new(front)).await.unwrap()
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(None), 0);
        assert_eq!(next_position(Some(0)), 1);
        assert_eq!(next_position(Some(7)), 8);
    }

    #[tokio::test]
    async fn test_positions_append_and_keep_gaps() {
        let f = fixture().await;
        let a = card(&f.store, "a").await;
        let b = card(&f.store, "b").await;
        let c = card(&f.store, "c").await;

        let ma = f.manager.add(f.deck.id, a.id).await.unwrap();
        let mb = f.manager.add(f.deck.id, b.id).await.unwrap();
        assert_eq!((ma.position, mb.position), (0, 1));

        f.manager.remove(mb.id).await.unwrap();
        let mc = f.manager.add(f.deck.id, c.id).await.unwrap();
        assert_eq!(mc.position, 1);

        f.manager.remove(ma.id).await.unwrap();
        let again = f.manager.add(f.deck.id, a.id).await.unwrap();
        assert_eq!(again.position, 2);

        let listed: Vec<_> = f
            .manager
            .list(f.deck.id)
            .await
            .unwrap()
            .into_iter()
            .map(|dc| (dc.flashcard.front, dc.position))
            .collect();
        assert_eq!(listed, vec![("c".to_string(), 1), ("a".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_add_unknown_ids_is_not_found() {
        let f = fixture().await;
        let a = card(&f.store, "a").await;

        let err = f.manager.add(Uuid::new_v4(), a.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = f.manager.add(f.deck.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remove_missing_membership_is_not_found() {
        let f = fixture().await;
        let a = card(&f.store, "a").await;
        f.manager.add(f.deck.id, a.id).await.unwrap();

        let err = f.manager.remove(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.manager.list(f.deck.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_available_is_sorted_by_front() {
        let f = fixture().await;
        let pear = card(&f.store, "pear").await;
        card(&f.store, "apple").await;
        card(&f.store, "mango").await;
        f.manager.add(f.deck.id, pear.id).await.unwrap();

        let fronts: Vec<_> = f
            .manager
            .available_flashcards(f.deck.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.front)
            .collect();
        assert_eq!(fronts, vec!["apple", "mango"]);
    }

    #[tokio::test]
    async fn test_list_unknown_deck_is_empty() {
        let f = fixture().await;
        assert!(f.manager.list(Uuid::new_v4()).await.unwrap().is_empty());
    }
}

//! Deck membership against the embedded SQLite store.
//!
//! Covers:
//! 1. Positions append as max + 1 (0 for an empty deck) and keep gaps
//! 2. Duplicate adds fail with Conflict and leave the deck unchanged, and two
//!    adds racing for the same position settle into one success and one Conflict
//! 3. Available flashcards never overlap the deck listing

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Barrier;

use flashdeck_lib::flashcards::{Deck, DeckDraft, Flashcard, FlashcardDraft};
use flashdeck_lib::membership::DeckMembershipManager;
use flashdeck_lib::store::{SqliteStore, Store};
use flashdeck_lib::ErrorKind;

use common::{GatedStore, Gates};

struct Fixture {
    store: Arc<SqliteStore>,
    manager: DeckMembershipManager<SqliteStore>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let manager = DeckMembershipManager::new(Arc::clone(&store));
        Self { store, manager }
    }

    async fn deck(&self, name: &str) -> Deck {
        self.store.insert::<Deck>(&DeckDraft::new(name)).await.unwrap()
    }

    async fn cards(&self, fronts: &[&str]) -> Vec<Flashcard> {
        let mut cards = Vec::new();
        for front in fronts {
            let draft = FlashcardDraft::new(*front).back(format!("{} (back)", front));
            cards.push(self.store.insert::<Flashcard>(&draft).await.unwrap());
        }
        cards
    }
}

// ===== Property 1: Position assignment =====

#[tokio::test]
async fn positions_follow_the_current_maximum() {
    let fx = Fixture::new();
    let deck = fx.deck("Verbs").await;
    let cards = fx.cards(&["correr", "comer", "beber", "vivir"]).await;

    let first = fx.manager.add(deck.id, cards[0].id).await.unwrap();
    assert_eq!(first.position, 0);
    let second = fx.manager.add(deck.id, cards[1].id).await.unwrap();
    assert_eq!(second.position, 1);
    let third = fx.manager.add(deck.id, cards[2].id).await.unwrap();
    assert_eq!(third.position, 2);

    // Removing from the middle leaves a gap; the next card still goes past the max
    fx.manager.remove(second.id).await.unwrap();
    let fourth = fx.manager.add(deck.id, cards[3].id).await.unwrap();
    assert_eq!(fourth.position, 3);

    let positions: Vec<u32> = fx
        .manager
        .list(deck.id)
        .await
        .unwrap()
        .iter()
        .map(|dc| dc.position)
        .collect();
    assert_eq!(positions, vec![0, 2, 3]);
}

#[tokio::test]
async fn positions_are_per_deck() {
    let fx = Fixture::new();
    let verbs = fx.deck("Verbs").await;
    let food = fx.deck("Food").await;
    let cards = fx.cards(&["pan", "queso"]).await;

    fx.manager.add(verbs.id, cards[0].id).await.unwrap();
    fx.manager.add(verbs.id, cards[1].id).await.unwrap();
    let in_food = fx.manager.add(food.id, cards[1].id).await.unwrap();
    assert_eq!(in_food.position, 0);
}

// ===== Property 2: Duplicate membership =====

#[tokio::test]
async fn duplicate_add_is_conflict_and_count_is_unchanged() {
    let fx = Fixture::new();
    let deck = fx.deck("Greetings").await;
    let cards = fx.cards(&["hola", "adiós"]).await;

    fx.manager.add(deck.id, cards[0].id).await.unwrap();
    fx.manager.add(deck.id, cards[1].id).await.unwrap();
    let before = fx.manager.list(deck.id).await.unwrap().len();

    let err = fx.manager.add(deck.id, cards[0].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(fx.manager.list(deck.id).await.unwrap().len(), before);
}

#[tokio::test]
async fn racing_adds_on_one_deck_leave_exactly_one_member() {
    // Both adds read the same maximum before either inserts
    let store = Arc::new(GatedStore::new(Gates {
        max_position: Some(Arc::new(Barrier::new(2))),
        ..Default::default()
    }));
    let deck = store.inner().insert::<Deck>(&DeckDraft::new("Race")).await.unwrap();
    let a = store
        .inner()
        .insert::<Flashcard>(&FlashcardDraft::new("rápido"))
        .await
        .unwrap();
    let b = store
        .inner()
        .insert::<Flashcard>(&FlashcardDraft::new("lento"))
        .await
        .unwrap();
    let manager = DeckMembershipManager::new(Arc::clone(&store));

    let (first, second) = tokio::join!(manager.add(deck.id, a.id), manager.add(deck.id, b.id));
    let results = [first, second];

    let added: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].position, 0);
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
        .count();
    assert_eq!(conflicts, 1);

    assert_eq!(manager.list(deck.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn add_with_unknown_ids_is_not_found() {
    let fx = Fixture::new();
    let deck = fx.deck("Empty").await;
    let card = fx.cards(&["gato"]).await.remove(0);

    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        fx.manager.add(missing, card.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.manager.add(deck.id, missing).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

// ===== Property 3: Available flashcards are disjoint from the deck =====

#[tokio::test]
async fn available_and_listed_are_disjoint() {
    let fx = Fixture::new();
    let deck = fx.deck("Animals").await;
    let other = fx.deck("Colors").await;
    let cards = fx.cards(&["perro", "gato", "pájaro", "rojo", "azul"]).await;

    fx.manager.add(deck.id, cards[0].id).await.unwrap();
    fx.manager.add(deck.id, cards[2].id).await.unwrap();
    fx.manager.add(other.id, cards[3].id).await.unwrap();

    let listed: HashSet<_> = fx
        .manager
        .list(deck.id)
        .await
        .unwrap()
        .into_iter()
        .map(|dc| dc.flashcard.id)
        .collect();
    let available = fx.manager.available_flashcards(deck.id).await.unwrap();
    let available_ids: HashSet<_> = available.iter().map(|c| c.id).collect();

    assert!(listed.is_disjoint(&available_ids));
    assert_eq!(listed.len() + available_ids.len(), cards.len());

    // Sorted by front text; membership in another deck does not hide a card
    let fronts: Vec<_> = available.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(fronts, vec!["azul", "gato", "rojo"]);
}

#[tokio::test]
async fn deleting_a_flashcard_removes_it_from_decks() {
    let fx = Fixture::new();
    let deck = fx.deck("Numbers").await;
    let cards = fx.cards(&["uno", "dos"]).await;
    fx.manager.add(deck.id, cards[0].id).await.unwrap();
    fx.manager.add(deck.id, cards[1].id).await.unwrap();

    fx.store.delete::<Flashcard>(cards[0].id).await.unwrap();

    let listed = fx.manager.list(deck.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].flashcard.front, "dos");
    assert_eq!(listed[0].position, 1);
}

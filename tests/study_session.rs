//! Study sessions over real deck listings.
//!
//! Covers:
//! 6. N cards answered in order always finish with N outcomes
//! 7. Mixed outcomes partition in snapshot order

use std::sync::Arc;

use chrono::Utc;
use flashdeck_lib::flashcards::{DeckDraft, Flashcard, FlashcardDraft};
use flashdeck_lib::membership::DeckMembershipManager;
use flashdeck_lib::store::{SqliteStore, Store};
use flashdeck_lib::study::{Idle, Outcome, Results, Snapshot, Step};
use proptest::prelude::*;
use uuid::Uuid;

fn card(front: &str) -> Flashcard {
    let now = Utc::now();
    Flashcard {
        id: Uuid::new_v4(),
        front: front.to_string(),
        back: Some(format!("{}!", front)),
        language: "es".to_string(),
        created_at: now,
        updated_at: now,
        owner_id: None,
    }
}

/// Flip and answer every card in order. Returns `None` if the session
/// finishes early or never finishes.
fn answer_all(snapshot: Snapshot, outcomes: &[Outcome]) -> Option<Results> {
    let mut front = Idle.start(snapshot);
    for (i, outcome) in outcomes.iter().enumerate() {
        match front.flip().answer(*outcome) {
            Step::Next(next) if i + 1 < outcomes.len() => front = next,
            Step::Finished(results) if i + 1 == outcomes.len() => return Some(results),
            _ => return None,
        }
    }
    None
}

// ===== Property 6: Completion =====

proptest! {
    #[test]
    fn n_answers_finish_an_n_card_session(outcomes in prop::collection::vec(any::<bool>(), 1..40)) {
        let cards: Vec<_> = (0..outcomes.len()).map(|i| card(&format!("card {}", i))).collect();
        let outcomes: Vec<_> = outcomes
            .into_iter()
            .map(|ok| if ok { Outcome::Correct } else { Outcome::Incorrect })
            .collect();

        let results = answer_all(Snapshot::new(cards).unwrap(), &outcomes);
        prop_assert!(results.is_some());
        let results = results.unwrap();

        let partition = results.partition();
        prop_assert_eq!(partition.correct.len() + partition.incorrect.len(), outcomes.len());
        prop_assert_eq!(
            partition.correct.len(),
            outcomes.iter().filter(|o| **o == Outcome::Correct).count()
        );
    }
}

// ===== Property 7: Partition order =====

#[tokio::test]
async fn deck_session_partitions_in_position_order() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let manager = DeckMembershipManager::new(Arc::clone(&store));

    let deck = store.insert::<flashdeck_lib::flashcards::Deck>(&DeckDraft::new("Trip")).await.unwrap();
    let mut cards = Vec::new();
    for front in ["el tren", "la playa", "el hotel"] {
        let card = store
            .insert::<Flashcard>(&FlashcardDraft::new(front))
            .await
            .unwrap();
        manager.add(deck.id, card.id).await.unwrap();
        cards.push(card);
    }

    let snapshot = Snapshot::from_deck(manager.list(deck.id).await.unwrap()).unwrap();

    // Edits after the session starts do not reach the snapshot
    store
        .update::<Flashcard>(
            cards[0].id,
            &flashdeck_lib::flashcards::FlashcardPatch {
                front: Some("el autobús".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let results = answer_all(
        snapshot,
        &[Outcome::Correct, Outcome::Incorrect, Outcome::Correct],
    )
    .unwrap();

    let partition = results.partition();
    let correct: Vec<_> = partition.correct.iter().map(|c| c.front.as_str()).collect();
    let incorrect: Vec<_> = partition.incorrect.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(correct, vec!["el tren", "el hotel"]);
    assert_eq!(incorrect, vec!["la playa"]);
}

#[test]
fn empty_deck_has_no_session() {
    assert!(Snapshot::from_deck(Vec::new()).is_none());
}

#[test]
fn study_again_restarts_with_the_same_cards() {
    let cards = vec![card("a"), card("b")];
    let results = answer_all(
        Snapshot::new(cards.clone()).unwrap(),
        &[Outcome::Incorrect, Outcome::Incorrect],
    )
    .unwrap();

    let again = results.study_again();
    assert_eq!(again.progress(), (1, 2));
    assert_eq!(again.card(), &cards[0]);
    assert!(again.answers().is_empty());
}

//! Study session state machine.
//!
//! Each state is its own type and every transition consumes the current
//! state, so an out-of-order call (answering before flipping, flipping twice,
//! starting with no cards) does not compile:
//!
//! ```text
//! Idle --start--> Presenting<Hidden> --flip--> Presenting<Revealed>
//!                       ^                            |
//!                       +------- answer (more) ------+
//!                                                    |
//!                        Results <-- answer (last) --+
//! ```
//!
//! Every state can `reset()` back to [`Idle`].

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flashcards::{DeckFlashcard, Flashcard};

/// How the learner judged their recall of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Cards captured by value when a session starts. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    cards: Vec<Flashcard>,
}

impl Snapshot {
    /// `None` when there is nothing to study
    pub fn new(cards: Vec<Flashcard>) -> Option<Self> {
        if cards.is_empty() {
            None
        } else {
            Some(Self { cards })
        }
    }

    /// Snapshot of a deck listing, keeping its position order
    pub fn from_deck(cards: Vec<DeckFlashcard>) -> Option<Self> {
        Self::new(cards.into_iter().map(|dc| dc.flashcard).collect())
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Correct and incorrect cards, each in snapshot order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub correct: Vec<Flashcard>,
    pub incorrect: Vec<Flashcard>,
}

/// Split `cards` by their recorded outcome. Unanswered cards are in neither list.
pub fn partition(cards: &[Flashcard], answers: &HashMap<Uuid, Outcome>) -> Partition {
    let mut result = Partition::default();
    for card in cards {
        match answers.get(&card.id) {
            Some(Outcome::Correct) => result.correct.push(card.clone()),
            Some(Outcome::Incorrect) => result.incorrect.push(card.clone()),
            None => {}
        }
    }
    result
}

/// No session running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Idle;

impl Idle {
    pub fn start(self, snapshot: Snapshot) -> Presenting<Hidden> {
        log::debug!("Study session started with {} cards", snapshot.len());
        Presenting {
            snapshot,
            index: 0,
            answers: HashMap::new(),
            side: PhantomData,
        }
    }
}

/// Marker: only the front of the card is showing
#[derive(Debug)]
pub struct Hidden;

/// Marker: the back of the card is showing
#[derive(Debug)]
pub struct Revealed;

/// A card is on screen
#[derive(Debug)]
pub struct Presenting<Side> {
    snapshot: Snapshot,
    index: usize,
    answers: HashMap<Uuid, Outcome>,
    side: PhantomData<Side>,
}

/// What follows an answer
#[derive(Debug)]
pub enum Step {
    Next(Presenting<Hidden>),
    Finished(Results),
}

impl<Side> Presenting<Side> {
    pub fn card(&self) -> &Flashcard {
        &self.snapshot.cards[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based number of the current card and the total, for "Card 2 of 5"
    pub fn progress(&self) -> (usize, usize) {
        (self.index + 1, self.snapshot.len())
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.snapshot.len()
    }

    pub fn answers(&self) -> &HashMap<Uuid, Outcome> {
        &self.answers
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn reset(self) -> Idle {
        Idle
    }
}

impl Presenting<Hidden> {
    pub fn flip(self) -> Presenting<Revealed> {
        Presenting {
            snapshot: self.snapshot,
            index: self.index,
            answers: self.answers,
            side: PhantomData,
        }
    }
}

impl Presenting<Revealed> {
    /// Record the outcome for the current card (replacing any earlier one)
    /// and advance.
    pub fn answer(mut self, outcome: Outcome) -> Step {
        let card_id = self.card().id;
        self.answers.insert(card_id, outcome);

        if self.is_last() {
            log::debug!("Study session finished after {} cards", self.snapshot.len());
            return Step::Finished(Results {
                snapshot: self.snapshot,
                answers: self.answers,
            });
        }

        Step::Next(Presenting {
            snapshot: self.snapshot,
            index: self.index + 1,
            answers: self.answers,
            side: PhantomData,
        })
    }
}

/// Every card has been answered
#[derive(Debug)]
pub struct Results {
    snapshot: Snapshot,
    answers: HashMap<Uuid, Outcome>,
}

impl Results {
    pub fn partition(&self) -> Partition {
        partition(self.snapshot.cards(), &self.answers)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn answers(&self) -> &HashMap<Uuid, Outcome> {
        &self.answers
    }

    /// Run the same cards again from the first one with answers cleared
    pub fn study_again(self) -> Presenting<Hidden> {
        Idle.start(self.snapshot)
    }

    pub fn reset(self) -> Idle {
        Idle
    }
}

/// Any session state, for owners that keep the session in a field.
#[derive(Debug, Default)]
pub enum StudySession {
    #[default]
    Idle,
    Front(Presenting<Hidden>),
    Back(Presenting<Revealed>),
    Results(Results),
}

impl StudySession {
    pub fn reset(self) -> Self {
        StudySession::Idle
    }

    /// The card on screen, if any
    pub fn current_card(&self) -> Option<&Flashcard> {
        match self {
            StudySession::Front(p) => Some(p.card()),
            StudySession::Back(p) => Some(p.card()),
            StudySession::Idle | StudySession::Results(_) => None,
        }
    }
}

impl From<Idle> for StudySession {
    fn from(_: Idle) -> Self {
        StudySession::Idle
    }
}

impl From<Presenting<Hidden>> for StudySession {
    fn from(p: Presenting<Hidden>) -> Self {
        StudySession::Front(p)
    }
}

impl From<Presenting<Revealed>> for StudySession {
    fn from(p: Presenting<Revealed>) -> Self {
        StudySession::Back(p)
    }
}

impl From<Results> for StudySession {
    fn from(r: Results) -> Self {
        StudySession::Results(r)
    }
}

impl From<Step> for StudySession {
    fn from(step: Step) -> Self {
        match step {
            Step::Next(p) => p.into(),
            Step::Finished(r) => r.into(),
        }
    }
}

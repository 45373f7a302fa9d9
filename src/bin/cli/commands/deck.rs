use anyhow::{Context, Result};

use flashdeck_lib::flashcards::Deck;
use flashdeck_lib::store::Store;

use crate::app::App;
use crate::{DeckCommand, OutputFormat};

pub async fn run<S: Store>(app: &App<S>, command: DeckCommand, format: &OutputFormat) -> Result<()> {
    let membership = app.membership();

    match command {
        DeckCommand::Show { deck_id } => {
            let deck = app.store.get::<Deck>(deck_id).await?;
            let cards = membership.list(deck_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "deck": deck,
                    "flashcards": cards,
                }))?,
                OutputFormat::Plain => {
                    println!("{} ({} cards)", deck.name, cards.len());
                    for entry in &cards {
                        println!(
                            "  #{:<3} {}  {}",
                            entry.position,
                            entry.membership_id,
                            super::flashcard_line(&entry.flashcard)
                        );
                    }
                }
            }
        }
        DeckCommand::Add { deck_id, card_id } => {
            let added = membership
                .add(deck_id, card_id)
                .await
                .context("Failed to add flashcard to deck")?;
            match format {
                OutputFormat::Json => super::print_json(&added)?,
                OutputFormat::Plain => println!(
                    "Added at position {} (membership {})",
                    added.position, added.id
                ),
            }
        }
        DeckCommand::Remove { membership_id } => {
            membership
                .remove(membership_id)
                .await
                .context("Failed to remove flashcard from deck")?;
            println!("Removed membership {}", membership_id);
        }
        DeckCommand::Available { deck_id } => {
            let cards = membership.available_flashcards(deck_id).await?;
            match format {
                OutputFormat::Json => super::print_json(&cards)?,
                OutputFormat::Plain => {
                    if cards.is_empty() {
                        println!("(every flashcard is already in this deck)");
                    }
                    for card in &cards {
                        println!("{}", super::flashcard_line(card));
                    }
                }
            }
        }
    }

    Ok(())
}

use anyhow::{Context, Result};

use flashdeck_lib::flashcards::{Flashcard, FlashcardDraft, FlashcardPatch};
use flashdeck_lib::store::Store;
use flashdeck_lib::translation::enrich_flashcard;

use crate::app::App;
use crate::{CardsCommand, OutputFormat};

pub async fn run<S: Store>(app: &App<S>, command: CardsCommand, format: &OutputFormat) -> Result<()> {
    let cards = app.flashcards();

    let changed = match command {
        CardsCommand::List(args) => {
            let page = super::load_page(&cards, &args).await?;
            match format {
                OutputFormat::Json => super::print_page_json(&cards)?,
                OutputFormat::Plain => {
                    if page.items.is_empty() {
                        println!("(no flashcards)");
                    }
                    for card in &page.items {
                        println!("{}", super::flashcard_line(card));
                    }
                    super::print_page_footer(&cards);
                }
            }
            return Ok(());
        }
        CardsCommand::Add { front, back, language } => {
            let mut draft = FlashcardDraft::new(front);
            if let Some(back) = back {
                draft = draft.back(back);
            }
            if let Some(language) = language {
                draft = draft.language(language);
            }
            cards.create(draft).await.context("Failed to create flashcard")?
        }
        CardsCommand::Update { id, front, back, language } => {
            let patch = FlashcardPatch { front, back, language };
            cards
                .update(id, patch)
                .await
                .context("Failed to update flashcard")?
        }
        CardsCommand::Delete { id } => {
            cards.delete(id).await.context("Failed to delete flashcard")?;
            println!("Deleted flashcard {}", id);
            return Ok(());
        }
        CardsCommand::Translate { id } => {
            let card = app.store.get::<Flashcard>(id).await?;
            let patch = enrich_flashcard(&app.gateway()?, &card)
                .await
                .context("Translation failed")?;
            cards
                .update(id, patch)
                .await
                .context("Failed to save translation")?
        }
    };

    match format {
        OutputFormat::Json => super::print_json(&changed)?,
        OutputFormat::Plain => println!("{}", super::flashcard_line(&changed)),
    }
    Ok(())
}

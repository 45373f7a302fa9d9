use anyhow::{Context, Result};

use flashdeck_lib::flashcards::{DeckDraft, DeckPatch};
use flashdeck_lib::store::Store;

use crate::app::App;
use crate::{DecksCommand, OutputFormat};

pub async fn run<S: Store>(app: &App<S>, command: DecksCommand, format: &OutputFormat) -> Result<()> {
    let decks = app.decks();

    let deck = match command {
        DecksCommand::List(args) => {
            let page = super::load_page(&decks, &args).await?;
            match format {
                OutputFormat::Json => super::print_page_json(&decks)?,
                OutputFormat::Plain => {
                    if page.items.is_empty() {
                        println!("(no decks)");
                    }
                    for deck in &page.items {
                        println!("{}  {}", deck.id, deck.name);
                    }
                    super::print_page_footer(&decks);
                }
            }
            return Ok(());
        }
        DecksCommand::Add { name } => decks
            .create(DeckDraft::new(name))
            .await
            .context("Failed to create deck")?,
        DecksCommand::Rename { id, name } => decks
            .update(id, DeckPatch { name: Some(name) })
            .await
            .context("Failed to rename deck")?,
        DecksCommand::Delete { id } => {
            decks.delete(id).await.context("Failed to delete deck")?;
            println!("Deleted deck {}", id);
            return Ok(());
        }
    };

    match format {
        OutputFormat::Json => super::print_json(&deck)?,
        OutputFormat::Plain => println!("{}  {}", deck.id, deck.name),
    }
    Ok(())
}

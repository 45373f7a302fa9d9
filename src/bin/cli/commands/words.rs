use anyhow::{Context, Result};

use flashdeck_lib::flashcards::WordDraft;
use flashdeck_lib::store::Store;

use crate::app::App;
use crate::{OutputFormat, WordsCommand};

pub async fn run<S: Store>(app: &App<S>, command: WordsCommand, format: &OutputFormat) -> Result<()> {
    let words = app.words();

    match command {
        WordsCommand::List(args) => {
            let page = super::load_page(&words, &args).await?;
            match format {
                OutputFormat::Json => super::print_page_json(&words)?,
                OutputFormat::Plain => {
                    if page.items.is_empty() {
                        println!("(no words)");
                    }
                    for word in &page.items {
                        println!("{}  {}", word.id, word.text);
                    }
                    super::print_page_footer(&words);
                }
            }
        }
        WordsCommand::Add { text } => {
            let word = words
                .create(WordDraft::new(text))
                .await
                .context("Failed to add word")?;
            match format {
                OutputFormat::Json => super::print_json(&word)?,
                OutputFormat::Plain => println!("Added '{}' ({})", word.text, word.id),
            }
        }
        WordsCommand::Delete { id } => {
            words.delete(id).await.context("Failed to delete word")?;
            println!("Deleted word {}", id);
        }
    }

    Ok(())
}

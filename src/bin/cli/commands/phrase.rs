use anyhow::{Context, Result};

use flashdeck_lib::store::Store;

use crate::app::App;
use crate::OutputFormat;

pub async fn run<S: Store>(app: &App<S>, words: &[String], format: &OutputFormat) -> Result<()> {
    let response = app
        .gateway()?
        .generate_phrase(words)
        .await
        .context("Phrase generation failed")?;

    match format {
        OutputFormat::Json => super::print_json(&response)?,
        OutputFormat::Plain => {
            println!("{}", response.phrase);
            if !response.words_used.is_empty() {
                println!("\nWords used: {}", response.words_used.join(", "));
            }
        }
    }
    Ok(())
}

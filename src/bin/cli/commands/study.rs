use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use uuid::Uuid;

use flashdeck_lib::flashcards::Flashcard;
use flashdeck_lib::store::Store;
use flashdeck_lib::study::{Idle, Outcome, Results, Snapshot, Step};

use crate::app::App;

type Input = Lines<BufReader<Stdin>>;

/// Prompt and read one trimmed line; `None` on end of input.
async fn ask(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|line| line.trim().to_lowercase()))
}

pub async fn run<S: Store>(app: &App<S>, deck_id: Uuid) -> Result<()> {
    let cards = app.membership().list(deck_id).await?;
    let Some(snapshot) = Snapshot::from_deck(cards) else {
        println!("This deck has no flashcards to study.");
        return Ok(());
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut front = Idle.start(snapshot);

    loop {
        let (number, total) = front.progress();
        println!("\nCard {} of {}", number, total);
        println!("  {}", front.card().front);

        match ask(&mut input, "[Enter] to reveal, q to quit: ").await?.as_deref() {
            None | Some("q") => {
                front.reset();
                println!("Session ended.");
                return Ok(());
            }
            Some(_) => {}
        }

        let back = front.flip();
        println!("  -> {}", back.card().back.as_deref().unwrap_or("(no answer)"));

        let outcome = loop {
            match ask(&mut input, "Did you know it? [y/n]: ").await?.as_deref() {
                Some("y") | Some("yes") => break Outcome::Correct,
                Some("n") | Some("no") => break Outcome::Incorrect,
                None | Some("q") => {
                    back.reset();
                    println!("Session ended.");
                    return Ok(());
                }
                Some(_) => continue,
            }
        };

        front = match back.answer(outcome) {
            Step::Next(next) => next,
            Step::Finished(results) => {
                print_results(&results);
                match ask(&mut input, "\nStudy again? [y/N]: ").await?.as_deref() {
                    Some("y") | Some("yes") => results.study_again(),
                    _ => return Ok(()),
                }
            }
        };
    }
}

fn print_results(results: &Results) {
    let partition = results.partition();
    println!(
        "\nDone: {} correct, {} incorrect",
        partition.correct.len(),
        partition.incorrect.len()
    );
    print_group("Correct", &partition.correct);
    print_group("Incorrect", &partition.incorrect);
}

fn print_group(title: &str, cards: &[Flashcard]) {
    if cards.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for card in cards {
        println!("  {} | {}", card.front, card.back.as_deref().unwrap_or("-"));
    }
}

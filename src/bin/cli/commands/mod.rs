pub mod auth;
pub mod cards;
pub mod deck;
pub mod decks;
pub mod phrase;
pub mod study;
pub mod words;

use anyhow::{Context, Result};
use serde::Serialize;

use flashdeck_lib::collection::{CollectionViewModel, Page};
use flashdeck_lib::flashcards::Flashcard;
use flashdeck_lib::store::{Resource, SortColumn, Store};

use crate::ListArgs;

/// Apply `--sort`/`--reverse`/`--page` to a fresh view model and fetch the page.
pub async fn load_page<R: Resource, S: Store>(
    view: &CollectionViewModel<R, S>,
    args: &ListArgs,
) -> Result<Page<R>> {
    let column = match &args.sort {
        Some(name) => R::Column::parse(name).with_context(|| {
            let known: Vec<_> = R::Column::ALL.iter().map(|c| c.as_str()).collect();
            format!("Unknown sort column '{}'. Expected one of: {}", name, known.join(", "))
        })?,
        None => view.order().column,
    };
    let direction = column.default_direction();
    view.set_order(
        column,
        if args.reverse { direction.toggled() } else { direction },
    );

    // The first fetch learns the total so the requested page can be clamped.
    view.refresh().await?;
    if view.go_to_page(args.page) != 1 {
        view.refresh().await?;
    }
    Ok(view.snapshot())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_page_json<R: Resource, S: Store>(view: &CollectionViewModel<R, S>) -> Result<()> {
    let page = view.snapshot();
    print_json(&serde_json::json!({
        "page": view.current_page(),
        "totalPages": page.total_pages(),
        "totalCount": page.total_count,
        "items": page.items,
    }))
}

pub fn print_page_footer<R: Resource, S: Store>(view: &CollectionViewModel<R, S>) {
    let order = view.order();
    println!(
        "\nPage {} of {} ({} total, sorted by {} {})",
        view.current_page(),
        view.total_pages().max(1),
        view.total_count(),
        order.column.as_str(),
        order.direction.as_str()
    );
}

pub fn flashcard_line(card: &Flashcard) -> String {
    format!(
        "{}  {} | {} [{}]",
        card.id,
        card.front,
        card.back.as_deref().unwrap_or("-"),
        card.language_name()
    )
}

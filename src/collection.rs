//! Paginated, sortable view over one collection in the store.
//!
//! The view keeps exactly one cached page. Every successful mutation is
//! followed by a full re-read of the current page and total count; the cache
//! is replaced wholesale and never patched locally. Overlapping calls are not
//! serialized, so when two refetches race the one that finishes last wins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::error::Result;
use crate::flashcards::Validate;
use crate::store::{Editable, Order, Resource, SortDirection, Store};

/// Rows per page
pub const PAGE_SIZE: u64 = 20;

/// Number of pages needed to show `total_count` rows
pub fn total_pages(total_count: u64) -> u64 {
    total_count.div_ceil(PAGE_SIZE)
}

/// One page of rows plus the size of the whole collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total_count: u64,
}

impl<R> Page<R> {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count)
    }
}

impl<R> Default for Page<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

struct ViewState<R: Resource> {
    page: u64,
    order: Order<R::Column>,
    snapshot: Page<R>,
}

/// Decrements the in-flight counter when a mutation finishes, however it ends.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct CollectionViewModel<R: Resource, S: Store> {
    store: Arc<S>,
    state: Mutex<ViewState<R>>,
    in_flight: AtomicUsize,
}

impl<R: Resource, S: Store> CollectionViewModel<R, S> {
    /// Starts on page 1 with the collection's default ordering and an empty
    /// cache; call [`refresh`](Self::refresh) to populate it.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Mutex::new(ViewState {
                page: 1,
                order: Order::default(),
                snapshot: Page::default(),
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch one page and the exact total count.
    ///
    /// Pages are not range-checked here; a page past the end simply comes
    /// back empty.
    pub async fn load(&self, page: u64, order: Order<R::Column>) -> Result<Page<R>> {
        let offset = page.saturating_sub(1) * PAGE_SIZE;
        let (total_count, items) = tokio::try_join!(
            self.store.count::<R>(),
            self.store.select_page::<R>(order, offset, PAGE_SIZE),
        )?;

        log::debug!(
            "Loaded {} page {} ({} rows, {} total)",
            R::TABLE,
            page,
            items.len(),
            total_count
        );
        Ok(Page { items, total_count })
    }

    /// Re-read the current page and replace the cache with the result.
    ///
    /// On failure the previously cached page is left as it was.
    pub async fn refresh(&self) -> Result<Page<R>> {
        let (page, order) = {
            let state = self.state();
            (state.page, state.order)
        };

        let fresh = self.load(page, order).await?;
        self.state().snapshot = fresh.clone();
        Ok(fresh)
    }

    // ==================== Cached state ====================

    pub fn items(&self) -> Vec<R> {
        self.state().snapshot.items.clone()
    }

    pub fn snapshot(&self) -> Page<R> {
        self.state().snapshot.clone()
    }

    pub fn total_count(&self) -> u64 {
        self.state().snapshot.total_count
    }

    pub fn total_pages(&self) -> u64 {
        self.state().snapshot.total_pages()
    }

    pub fn current_page(&self) -> u64 {
        self.state().page
    }

    pub fn order(&self) -> Order<R::Column> {
        self.state().order
    }

    /// True while at least one create/update/delete is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    // ==================== Navigation ====================

    /// Move to `page`, clamped into `1..=total_pages` (page 1 when empty).
    pub fn go_to_page(&self, page: i64) -> u64 {
        let mut state = self.state();
        let last = state.snapshot.total_pages().max(1);
        state.page = page.clamp(1, last as i64) as u64;
        state.page
    }

    pub fn go_to_next_page(&self) -> u64 {
        let next = self.current_page() as i64 + 1;
        self.go_to_page(next)
    }

    pub fn go_to_previous_page(&self) -> u64 {
        let previous = self.current_page() as i64 - 1;
        self.go_to_page(previous)
    }

    /// Sort by `column`. Re-selecting the current column flips the direction;
    /// a new column starts in its default direction. Either way the view goes
    /// back to page 1.
    pub fn set_sort(&self, column: R::Column) -> Order<R::Column> {
        let mut state = self.state();
        state.order = if state.order.column == column {
            Order::new(column, state.order.direction.toggled())
        } else {
            Order::by(column)
        };
        state.page = 1;
        state.order
    }

    /// Replace the ordering outright, e.g. when restoring a saved view.
    pub fn set_order(&self, column: R::Column, direction: SortDirection) {
        let mut state = self.state();
        state.order = Order::new(column, direction);
        state.page = 1;
    }

    // ==================== Mutations ====================

    pub async fn create(&self, draft: R::Draft) -> Result<R> {
        let _busy = BusyGuard::enter(&self.in_flight);
        draft.validate()?;

        let created = self.store.insert::<R>(&draft).await?;
        log::info!("Created {} {}", R::NAME, created.id());

        self.refresh().await?;
        Ok(created)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _busy = BusyGuard::enter(&self.in_flight);
        self.store.delete::<R>(id).await?;
        log::info!("Deleted {} {}", R::NAME, id);

        self.refresh().await?;
        Ok(())
    }
}

impl<R: Editable, S: Store> CollectionViewModel<R, S> {
    pub async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R> {
        let _busy = BusyGuard::enter(&self.in_flight);
        patch.validate()?;

        let updated = self.store.update::<R>(id, &patch).await?;
        log::info!("Updated {} {}", R::NAME, id);

        self.refresh().await?;
        Ok(updated)
    }
}

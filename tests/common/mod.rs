//! SQLite store wrapper that can hold chosen calls mid-flight.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Barrier, Notify};
use uuid::Uuid;

use flashdeck_lib::flashcards::{Flashcard, Membership, NewMembership};
use flashdeck_lib::store::{Editable, MembershipRow, Order, Resource, SqliteStore, Store};
use flashdeck_lib::Result;

/// One-shot rendezvous: the store signals `reached` and waits for `release`.
#[derive(Default)]
pub struct Checkpoint {
    reached: Notify,
    release: Notify,
}

impl Checkpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resolves once a gated call is parked at the checkpoint
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct Gates {
    /// Parks every `insert` until released
    pub insert: Option<Arc<Checkpoint>>,
    /// Holds each `max_position` result until all parties have read theirs
    pub max_position: Option<Arc<Barrier>>,
}

pub struct GatedStore {
    inner: SqliteStore,
    gates: Gates,
}

impl GatedStore {
    pub fn new(gates: Gates) -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            gates,
        }
    }

    /// The underlying store, for seeding rows without passing any gate
    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn count<R: Resource>(&self) -> Result<u64> {
        self.inner.count::<R>().await
    }

    async fn select_page<R: Resource>(
        &self,
        order: Order<R::Column>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<R>> {
        self.inner.select_page::<R>(order, offset, limit).await
    }

    async fn get<R: Resource>(&self, id: Uuid) -> Result<R> {
        self.inner.get::<R>(id).await
    }

    async fn insert<R: Resource>(&self, draft: &R::Draft) -> Result<R> {
        if let Some(checkpoint) = &self.gates.insert {
            checkpoint.pass().await;
        }
        self.inner.insert::<R>(draft).await
    }

    async fn update<R: Editable>(&self, id: Uuid, patch: &R::Patch) -> Result<R> {
        self.inner.update::<R>(id, patch).await
    }

    async fn delete<R: Resource>(&self, id: Uuid) -> Result<()> {
        self.inner.delete::<R>(id).await
    }

    async fn max_position(&self, deck_id: Uuid) -> Result<Option<u32>> {
        let max = self.inner.max_position(deck_id).await?;
        if let Some(barrier) = &self.gates.max_position {
            barrier.wait().await;
        }
        Ok(max)
    }

    async fn insert_membership(&self, membership: &NewMembership) -> Result<Membership> {
        self.inner.insert_membership(membership).await
    }

    async fn delete_membership(&self, id: Uuid) -> Result<()> {
        self.inner.delete_membership(id).await
    }

    async fn deck_memberships(&self, deck_id: Uuid) -> Result<Vec<MembershipRow>> {
        self.inner.deck_memberships(deck_id).await
    }

    async fn flashcards_outside_deck(&self, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        self.inner.flashcards_outside_deck(deck_id).await
    }
}

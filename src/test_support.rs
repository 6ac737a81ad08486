//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::{
    AuthProvider, BackendError, Card, CardStore, NewCard, NewReservation, Order, Reservation,
    ReservationId, ReservationQuery, ReservationStore, SortColumn, UserId,
};

/// Auth collaborator with a fixed answer.
pub struct FakeAuth {
    user: Option<UserId>,
}

impl FakeAuth {
    pub fn signed_in() -> Self {
        Self {
            user: Some(UserId(Uuid::new_v4())),
        }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }

    /// Panics when signed out.
    pub fn user_id(&self) -> UserId {
        self.user.expect("FakeAuth is signed out")
    }
}

impl AuthProvider for FakeAuth {
    fn current_user(&self) -> Option<UserId> {
        self.user
    }
}

/// Row store kept in memory, with call counting and one-shot failure injection.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Reservation>>,
    cards: Mutex<Vec<(UserId, Card)>>,
    next_id: AtomicI64,
    inserts: AtomicUsize,
    fail_next: Mutex<Option<BackendError>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, err: BackendError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Builds the row the backend would return, without storing it.
    pub fn materialize(&self, payload: &NewReservation) -> Reservation {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Reservation {
            id: ReservationId(id),
            user_id: payload.user_id,
            check_in: payload.check_in,
            check_out: payload.check_out,
            guests: payload.guests,
            total_price: payload.total_price,
            created_at: payload.created_at,
        }
    }

    pub fn push(&self, row: Reservation) {
        self.rows.lock().unwrap().push(row);
    }

    fn take_failure(&self) -> Option<BackendError> {
        self.fail_next.lock().unwrap().take()
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn insert(&self, reservation: &NewReservation) -> Result<Reservation, BackendError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let row = self.materialize(reservation);
        self.push(row.clone());
        Ok(row)
    }

    async fn query(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, BackendError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let mut rows: Vec<Reservation> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        match query.sort {
            SortColumn::CreatedAt => rows.sort_by_key(|r| r.created_at),
            SortColumn::Id => rows.sort_by_key(|r| r.id),
        }
        if query.order == Order::Descending {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn insert_card(&self, card: &NewCard) -> Result<Card, BackendError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let saved = Card {
            last4: card.last4.clone(),
            name_on_card: card.name_on_card.clone(),
            expiry: card.expiry.clone(),
        };
        self.cards.lock().unwrap().push((card.user_id, saved.clone()));
        Ok(saved)
    }

    async fn saved_card(&self, user_id: UserId) -> Result<Option<Card>, BackendError> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .find(|(owner, _)| *owner == user_id)
            .map(|(_, card)| card.clone()))
    }

    async fn delete_cards(&self, user_id: UserId) -> Result<(), BackendError> {
        self.cards.lock().unwrap().retain(|(owner, _)| *owner != user_id);
        Ok(())
    }
}

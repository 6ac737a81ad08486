//! # Reservation Submitter
//!
//! ```text
//!   Idle ──► Validating ──► Submitting ──► Confirmed
//!                │               │
//!                └──► Failed ◄───┘      (Failed accepts a new attempt)
//! ```
//!
//! `begin()` validates synchronously and hands back the payload to persist;
//! the caller performs the insert wherever its I/O lives and reports back
//! through `complete()`. Each attempt is numbered, and a completion for any
//! attempt other than the current in-flight one is dropped, so results that
//! arrive after `reset()` never touch the new flow.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};

use crate::backend::{
    AuthProvider, BackendError, NewReservation, Reservation, ReservationStore,
};
use crate::core::pricing::PricingCalculator;
use crate::core::selection::DateSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Check-in or check-out missing.
    IncompleteInterval,
    /// Interval does not span at least one night.
    NoNights,
    /// Guest count below 1.
    NoGuests,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::IncompleteInterval => {
                write!(f, "select check-in and check-out dates")
            }
            ValidationError::NoNights => write!(f, "stay must be at least one night"),
            ValidationError::NoGuests => write!(f, "at least one guest is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    Validation(ValidationError),
    AuthenticationRequired,
    Persistence(BackendError),
}

impl SubmitError {
    /// Short message for the status line.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => capitalize(&e.to_string()),
            SubmitError::AuthenticationRequired => {
                "Not logged in. Run `staybook login` first.".to_string()
            }
            SubmitError::Persistence(_) => {
                "Could not save the reservation. Try again.".to_string()
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Validation(e) => write!(f, "invalid booking: {e}"),
            SubmitError::AuthenticationRequired => write!(f, "not logged in"),
            SubmitError::Persistence(e) => write!(f, "could not save reservation: {e}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Validation(e) => Some(e),
            SubmitError::Persistence(e) => Some(e),
            SubmitError::AuthenticationRequired => None,
        }
    }
}

impl From<BackendError> for SubmitError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::AuthRequired => SubmitError::AuthenticationRequired,
            other => SubmitError::Persistence(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    Submitting,
    Confirmed(Reservation),
    Failed(SubmitError),
}

/// A validated reservation waiting to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub attempt: u64,
    pub payload: NewReservation,
}

/// Checks the interval and guest count. Returns the interval on success.
pub fn validate(
    selection: &DateSelection,
    guests: u32,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let (check_in, check_out) = selection
        .interval()
        .ok_or(ValidationError::IncompleteInterval)?;
    if selection.nights() <= 0 {
        return Err(ValidationError::NoNights);
    }
    if guests < 1 {
        return Err(ValidationError::NoGuests);
    }
    Ok((check_in, check_out))
}

#[derive(Debug)]
pub struct ReservationSubmitter {
    phase: SubmitPhase,
    attempt: u64,
}

impl Default for ReservationSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationSubmitter {
    pub fn new() -> Self {
        Self {
            phase: SubmitPhase::Idle,
            attempt: 0,
        }
    }

    pub fn phase(&self) -> &SubmitPhase {
        &self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, SubmitPhase::Submitting)
    }

    pub fn confirmed(&self) -> Option<&Reservation> {
        match &self.phase {
            SubmitPhase::Confirmed(reservation) => Some(reservation),
            _ => None,
        }
    }

    /// Submission is allowed from Idle and from Failed (manual retry).
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, SubmitPhase::Idle | SubmitPhase::Failed(_))
    }

    /// Starts an attempt. Returns the payload to persist, or `None` when the
    /// attempt ended immediately (validation/auth failure, already in flight,
    /// already confirmed).
    pub fn begin(
        &mut self,
        selection: &DateSelection,
        guests: u32,
        pricing: &PricingCalculator,
        auth: &dyn AuthProvider,
        now: DateTime<Utc>,
    ) -> Option<PendingSubmission> {
        if !self.can_submit() {
            debug!("Submit ignored in phase {:?}", self.phase);
            return None;
        }

        self.phase = SubmitPhase::Validating;
        let (check_in, check_out) = match validate(selection, guests) {
            Ok(interval) => interval,
            Err(e) => {
                info!("Booking validation failed: {}", e);
                self.phase = SubmitPhase::Failed(SubmitError::Validation(e));
                return None;
            }
        };

        let Some(user_id) = auth.current_user() else {
            info!("Booking blocked: no signed-in user");
            self.phase = SubmitPhase::Failed(SubmitError::AuthenticationRequired);
            return None;
        };

        let price = pricing.compute(selection);
        self.attempt += 1;
        self.phase = SubmitPhase::Submitting;
        info!(
            "Submitting attempt {}: {} -> {}, {} guests, total {}",
            self.attempt, check_in, check_out, guests, price.total
        );

        Some(PendingSubmission {
            attempt: self.attempt,
            payload: NewReservation {
                user_id,
                check_in,
                check_out,
                guests,
                total_price: price.total,
                created_at: now,
            },
        })
    }

    /// Applies the outcome of an attempt. Returns false if it was stale.
    pub fn complete(&mut self, attempt: u64, result: Result<Reservation, BackendError>) -> bool {
        if attempt != self.attempt || !self.is_submitting() {
            debug!(
                "Dropping stale result for attempt {} (current {}, phase {:?})",
                attempt, self.attempt, self.phase
            );
            return false;
        }

        self.phase = match result {
            Ok(reservation) => {
                info!("Reservation {:?} confirmed", reservation.id);
                SubmitPhase::Confirmed(reservation)
            }
            Err(e) => {
                warn!("Reservation attempt {} failed: {}", attempt, e);
                SubmitPhase::Failed(SubmitError::from(e))
            }
        };
        true
    }

    /// Back to Idle. Any attempt still in flight becomes stale.
    pub fn reset(&mut self) {
        self.attempt += 1;
        self.phase = SubmitPhase::Idle;
    }

    /// Runs a whole attempt inline: begin, insert, complete.
    pub async fn submit(
        &mut self,
        selection: &DateSelection,
        guests: u32,
        pricing: &PricingCalculator,
        auth: &dyn AuthProvider,
        store: &dyn ReservationStore,
    ) -> &SubmitPhase {
        if let Some(pending) = self.begin(selection, guests, pricing, auth, Utc::now()) {
            let result = store.insert(&pending.payload).await;
            self.complete(pending.attempt, result);
        }
        &self.phase
    }
}

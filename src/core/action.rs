//! # Actions
//!
//! Everything that can happen in staybook becomes an `Action`.
//! User taps a day? That's `Action::DayTapped(day)`.
//! The backend answers an insert? That's `Action::SubmissionFinished { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing any I/O the adapter must
//! perform. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};

use crate::backend::{BackendError, Reservation};
use crate::core::card::{PaymentStep, choose};
use crate::core::pricing::format_price;
use crate::core::selection::GuestCount;
use crate::core::state::App;
use crate::core::submit::{PendingSubmission, SubmitPhase};

#[derive(Debug)]
pub enum Action {
    DayTapped(NaiveDate),
    IncrementGuests,
    DecrementGuests,
    /// "Continue" on the summary: validate and persist.
    Continue,
    SubmissionFinished {
        attempt: u64,
        result: Result<Reservation, BackendError>,
    },
    /// Pick a payment option on the review, by position in the list.
    ChoosePayment(usize),
    /// Drop the current flow and start over with an empty selection.
    NewBooking,
    ToggleHistory,
    HistoryLoaded(Result<Vec<Reservation>, BackendError>),
    /// A row delivered by the change feed.
    ReservationInserted(Reservation),
    Quit,
}

/// Side effects requested by `update()`, executed by the adapter.
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    Submit(PendingSubmission),
    LoadHistory,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::DayTapped(day) => {
            if !app.is_selectable(day) {
                debug!("Ignoring tap on disabled day {}", day);
                return Effect::None;
            }
            if app.submitter.is_submitting() || app.submitter.confirmed().is_some() {
                debug!("Selection locked in phase {:?}", app.submitter.phase());
                return Effect::None;
            }
            app.selection.on_day_tapped(day);
            app.status_message = match app.selection.interval() {
                Some(_) => format!(
                    "{} nights, {}",
                    app.selection.nights(),
                    format_price(app.price().total, &app.currency)
                ),
                None => String::from("Pick your check-out date"),
            };
            Effect::None
        }
        Action::IncrementGuests => {
            if app.submitter.can_submit() {
                app.guests.increment();
            }
            Effect::None
        }
        Action::DecrementGuests => {
            if app.submitter.can_submit() {
                app.guests.decrement();
            }
            Effect::None
        }
        Action::Continue => {
            if app.submitter.is_submitting() {
                debug!("Continue ignored: submission already in flight");
                return Effect::None;
            }
            let pending = app.submitter.begin(
                &app.selection,
                app.guests.get(),
                &app.pricing,
                app.auth.as_ref(),
                Utc::now(),
            );
            match pending {
                Some(pending) => {
                    app.status_message = String::from("Saving reservation...");
                    Effect::Submit(pending)
                }
                None => {
                    if let SubmitPhase::Failed(e) = app.submitter.phase() {
                        app.status_message = e.user_message();
                    }
                    Effect::None
                }
            }
        }
        Action::SubmissionFinished { attempt, result } => {
            if !app.submitter.complete(attempt, result) {
                return Effect::None;
            }
            match app.submitter.phase() {
                SubmitPhase::Confirmed(reservation) => {
                    app.status_message = format!(
                        "Reservation confirmed: {}",
                        format_price(reservation.total_price, &app.currency)
                    );
                    let reservation = reservation.clone();
                    remember(app, reservation);
                }
                SubmitPhase::Failed(e) => {
                    app.status_message = e.user_message();
                }
                _ => {}
            }
            Effect::None
        }
        Action::ChoosePayment(index) => {
            if app.submitter.confirmed().is_none() {
                return Effect::None;
            }
            let Some((method, step)) = choose(app.saved_card.as_ref(), index) else {
                return Effect::None;
            };
            match step {
                PaymentStep::Review => {
                    app.status_message = format!("Paying with {}", method.label());
                    app.payment = Some(method);
                }
                PaymentStep::EnterCard => {
                    app.payment = None;
                    app.status_message =
                        String::from("Add your card with `staybook card add`, then pick it here");
                }
            }
            Effect::None
        }
        Action::NewBooking => {
            app.submitter.reset();
            app.payment = None;
            app.selection.clear();
            app.guests = GuestCount::default();
            app.status_message = String::from("Pick your check-in date");
            Effect::None
        }
        Action::ToggleHistory => {
            if app.history_open {
                app.history_open = false;
                return Effect::None;
            }
            app.history_open = true;
            app.history_loading = true;
            app.has_new_reservation = false;
            Effect::LoadHistory
        }
        Action::HistoryLoaded(result) => {
            app.history_loading = false;
            match result {
                Ok(rows) => {
                    info!("Loaded {} reservations", rows.len());
                    app.history = rows;
                }
                Err(e) => {
                    warn!("History load failed: {}", e);
                    app.status_message = match e {
                        BackendError::AuthRequired => {
                            String::from("Not logged in. Run `staybook login` first.")
                        }
                        _ => String::from("Could not load your reservations."),
                    };
                }
            }
            Effect::None
        }
        Action::ReservationInserted(reservation) => {
            let own = app
                .submitter
                .confirmed()
                .is_some_and(|confirmed| confirmed.id == reservation.id);
            if !own && !app.history.iter().any(|r| r.id == reservation.id) {
                info!("Change feed delivered reservation {:?}", reservation.id);
                app.has_new_reservation = !app.history_open;
                app.status_message = String::from("New reservation received");
            }
            remember(app, reservation);
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

/// Keeps the history list newest first without duplicates.
fn remember(app: &mut App, reservation: Reservation) {
    if app.history.iter().any(|r| r.id == reservation.id) {
        return;
    }
    let pos = app
        .history
        .iter()
        .position(|r| r.created_at < reservation.created_at)
        .unwrap_or(app.history.len());
    app.history.insert(pos, reservation);
}

//! # Application State
//!
//! Core booking state for staybook. Domain logic only, no TUI types.
//! Presentation state (cursor, overlay scroll) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── auth: Arc<dyn AuthProvider>       // who is booking
//! ├── store: Arc<dyn ReservationStore>  // where reservations go
//! ├── hotel_name / pricing / currency   // from ResolvedConfig
//! ├── window: BookingWindow             // today ..= max_date
//! ├── selection: DateSelection          // check-in / check-out
//! ├── guests: GuestCount
//! ├── submitter: ReservationSubmitter   // Idle → … → Confirmed
//! ├── saved_card: Option<Card>          // for the review summary
//! ├── payment: Option<PaymentMethod>    // chosen on the review
//! ├── history: Vec<Reservation>         // newest first
//! ├── history_open / history_loading
//! ├── has_new_reservation: bool         // raised by the change feed
//! └── status_message: String
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::backend::{AuthProvider, Card, Reservation, ReservationStore};
use crate::core::card::{PaymentMethod, ReviewSummary};
use crate::core::config::ResolvedConfig;
use crate::core::marks::{MarkMap, MarkPalette, compute_marks_with};
use crate::core::pricing::{PriceBreakdown, PricingCalculator};
use crate::core::selection::{BookingWindow, DateSelection, GuestCount};
use crate::core::submit::ReservationSubmitter;

pub struct App {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn ReservationStore>,
    pub hotel_name: String,
    pub pricing: PricingCalculator,
    pub currency: String,
    pub palette: MarkPalette,
    pub window: BookingWindow,
    pub selection: DateSelection,
    pub guests: GuestCount,
    pub submitter: ReservationSubmitter,
    pub saved_card: Option<Card>,
    pub payment: Option<PaymentMethod>,
    pub history: Vec<Reservation>,
    pub history_open: bool,
    pub history_loading: bool,
    pub has_new_reservation: bool,
    pub status_message: String,
}

impl App {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn ReservationStore>) -> Self {
        Self {
            auth,
            store,
            hotel_name: crate::core::config::DEFAULT_HOTEL_NAME.to_string(),
            pricing: PricingCalculator::default(),
            currency: crate::core::config::DEFAULT_CURRENCY.to_string(),
            palette: MarkPalette::default(),
            window: BookingWindow::default(),
            selection: DateSelection::new(),
            guests: GuestCount::default(),
            submitter: ReservationSubmitter::new(),
            saved_card: None,
            payment: None,
            history: Vec::new(),
            history_open: false,
            history_loading: false,
            has_new_reservation: false,
            status_message: String::from("Pick your check-in date"),
        }
    }

    pub fn from_config(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn ReservationStore>,
        config: &ResolvedConfig,
    ) -> Self {
        let mut app = Self::new(auth, store);
        app.hotel_name = config.hotel_name.clone();
        app.pricing = config.pricing;
        app.currency = config.currency.clone();
        app.window = BookingWindow::new(config.max_date);
        app
    }

    /// Days before today and after `max_date` cannot be tapped.
    pub fn is_selectable(&self, day: NaiveDate) -> bool {
        self.window.contains(day)
    }

    pub fn today(&self) -> NaiveDate {
        self.window.today()
    }

    pub fn price(&self) -> PriceBreakdown {
        self.pricing.compute(&self.selection)
    }

    pub fn marks(&self) -> MarkMap {
        compute_marks_with(&self.selection, &self.palette)
    }

    /// Summary of the confirmed reservation, once there is one.
    pub fn review(&self) -> Option<ReviewSummary> {
        self.submitter.confirmed().map(|reservation| {
            ReviewSummary::new(
                reservation.clone(),
                self.pricing.nightly_rate,
                self.pricing.service_fee_rate,
                self.saved_card.as_ref(),
            )
        })
    }
}

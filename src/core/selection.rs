//! # Date Selection
//!
//! The check-in / check-out pair and the guest count for one booking flow.
//!
//! ```text
//!   tap(d)   no check-in ───────────────► checkIn = d
//!            both set    ───────────────► checkIn = d, checkOut cleared
//!            checkIn only, d > checkIn ─► checkOut = d
//!            checkIn only, d <= checkIn ► checkIn = d
//! ```
//!
//! Every tap changes the visible state; there is no rejected gesture.

use std::fmt;

use chrono::{Local, NaiveDate};

/// Starting guest count for a new booking.
pub const DEFAULT_GUESTS: u32 = 2;

/// Invariant: when both dates are set, `check_out > check_in`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateSelection {
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

impl DateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    pub fn is_empty(&self) -> bool {
        self.check_in.is_none()
    }

    /// Both endpoints, if the interval is complete.
    pub fn interval(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.check_in?, self.check_out?))
    }

    /// Nights in the stay; 0 unless the interval is complete.
    pub fn nights(&self) -> i64 {
        self.interval()
            .map(|(check_in, check_out)| (check_out - check_in).num_days())
            .unwrap_or(0)
    }

    pub fn on_day_tapped(&mut self, day: NaiveDate) {
        match (self.check_in, self.check_out) {
            (Some(check_in), None) if day > check_in => {
                self.check_out = Some(day);
            }
            _ => {
                self.check_in = Some(day);
                self.check_out = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The local calendar date right now.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// A day outside the bookable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfWindow {
    BeforeToday { day: NaiveDate, today: NaiveDate },
    AfterLastDay { day: NaiveDate, last: NaiveDate },
}

impl fmt::Display for OutOfWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfWindow::BeforeToday { day, today } => {
                write!(f, "{day} is in the past (today is {today})")
            }
            OutOfWindow::AfterLastDay { day, last } => {
                write!(f, "{day} is after the last bookable day {last}")
            }
        }
    }
}

impl std::error::Error for OutOfWindow {}

/// Bookable days: today through an optional last day.
///
/// Today is read from the clock on every check, so a session left open past
/// midnight stops offering the day that just ended.
#[derive(Debug, Clone, Copy)]
pub struct BookingWindow {
    max_date: Option<NaiveDate>,
    clock: fn() -> NaiveDate,
}

impl BookingWindow {
    pub fn new(max_date: Option<NaiveDate>) -> Self {
        Self::with_clock(max_date, local_today)
    }

    pub fn with_clock(max_date: Option<NaiveDate>, clock: fn() -> NaiveDate) -> Self {
        Self { max_date, clock }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.max_date
    }

    pub fn check(&self, day: NaiveDate) -> Result<(), OutOfWindow> {
        let today = self.today();
        if day < today {
            return Err(OutOfWindow::BeforeToday { day, today });
        }
        if let Some(last) = self.max_date
            && day > last
        {
            return Err(OutOfWindow::AfterLastDay { day, last });
        }
        Ok(())
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.check(day).is_ok()
    }

    /// Taps both days in order, as the calendar would, after checking that
    /// each one is bookable.
    pub fn select(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<DateSelection, OutOfWindow> {
        self.check(check_in)?;
        self.check(check_out)?;
        let mut selection = DateSelection::new();
        selection.on_day_tapped(check_in);
        selection.on_day_tapped(check_out);
        Ok(selection)
    }
}

impl Default for BookingWindow {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Number of guests. Never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestCount(u32);

impl GuestCount {
    /// Values below 1 are raised to 1.
    pub fn new(count: u32) -> Self {
        Self(count.max(1))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// No-op at 1.
    pub fn decrement(&mut self) {
        if self.0 > 1 {
            self.0 -= 1;
        }
    }
}

impl Default for GuestCount {
    fn default() -> Self {
        Self::new(DEFAULT_GUESTS)
    }
}

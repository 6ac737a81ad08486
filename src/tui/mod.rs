//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the calendar
//! and summary, and translates keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background work
//!
//! Inserts and history loads run as tokio tasks that report back through a
//! std `mpsc` channel of `Action`s. The change feed is forwarded into the
//! same channel. On exit the feed is unsubscribed and every task still in
//! flight is aborted, so nothing touches `App` after the loop ends.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tokio::task::AbortHandle;

use crate::backend::{Reservation, ReservationFeed, ReservationQuery, Subscription};
use crate::core::action::{Action, Effect, update};
use crate::core::state::App;
use crate::core::submit::PendingSubmission;
use crate::tui::component::EventHandler;
use crate::tui::components::{CalendarEvent, CalendarState, HistoryEvent, HistoryState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Rows shown in the history overlay.
const HISTORY_LIMIT: usize = 50;

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub calendar: CalendarState,
    pub history: HistoryState,
}

impl TuiState {
    pub fn new(app: &App) -> Self {
        Self {
            calendar: CalendarState::new(app.window),
            history: HistoryState::default(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty protocol lets us drop key release events; ignored elsewhere
        execute!(
            stdout(),
            Hide,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, Show);
    }
}

/// Runs the booking calendar until the user quits.
///
/// Must be called from within a tokio runtime.
pub fn run(mut app: App, poll_interval: Duration) -> std::io::Result<()> {
    let mut tui = TuiState::new(&app);

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    let mut feed = start_feed(&app, poll_interval, tx.clone());

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Handle for the in-flight insert, aborted on new booking and on exit
    let mut submit_handle: Option<AbortHandle> = None;
    let mut history_handle: Option<AbortHandle> = None;
    let mut needs_redraw = true;

    'main: loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(Duration::from_millis(250));
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut actions = Vec::new();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let Some(action) = route_event(&event, &app, &mut tui) {
                actions.push(action);
            }
        }

        // Background results (inserts, history, change feed)
        while let Ok(action) = rx.try_recv() {
            debug!("Event loop received: {:?}", action);
            needs_redraw = true;
            actions.push(action);
        }

        for action in actions {
            if matches!(action, Action::NewBooking)
                && let Some(handle) = submit_handle.take()
            {
                handle.abort();
            }
            match update(&mut app, action) {
                Effect::None => {}
                Effect::Quit => break 'main,
                Effect::Submit(pending) => {
                    submit_handle = Some(spawn_submit(&app, pending, tx.clone()));
                }
                Effect::LoadHistory => {
                    if let Some(handle) = history_handle.take() {
                        handle.abort();
                    }
                    history_handle = Some(spawn_history(&app, tx.clone()));
                }
            }
        }
    }

    if let Some(sub) = feed.as_mut() {
        sub.unsubscribe();
    }
    for handle in [submit_handle, history_handle].into_iter().flatten() {
        handle.abort();
    }
    app.submitter.reset();

    ratatui::restore();
    Ok(())
}

/// Turns a terminal event into a core action, handling presentation-only
/// events (cursor movement, overlay scrolling) in place.
fn route_event(event: &TuiEvent, app: &App, tui: &mut TuiState) -> Option<Action> {
    match event {
        TuiEvent::Resize => return None,
        TuiEvent::ForceQuit => return Some(Action::Quit),
        _ => {}
    }

    // When the history overlay is open, route all events to it
    if app.history_open {
        return match tui.history.handle_event(event) {
            Some(HistoryEvent::Dismiss) => Some(Action::ToggleHistory),
            None => None,
        };
    }

    if let Some(CalendarEvent::DayTapped(day)) = tui.calendar.handle_event(event) {
        return Some(Action::DayTapped(day));
    }

    match event {
        TuiEvent::IncrementGuests => Some(Action::IncrementGuests),
        TuiEvent::DecrementGuests => Some(Action::DecrementGuests),
        TuiEvent::Continue => Some(Action::Continue),
        TuiEvent::NewBooking => Some(Action::NewBooking),
        TuiEvent::ToggleHistory => Some(Action::ToggleHistory),
        TuiEvent::PaymentOption(index) => Some(Action::ChoosePayment(*index)),
        TuiEvent::Quit | TuiEvent::Escape => Some(Action::Quit),
        _ => None,
    }
}

fn start_feed(
    app: &App,
    poll_interval: Duration,
    tx: mpsc::Sender<Action>,
) -> Option<Subscription> {
    let Some(user_id) = app.auth.current_user() else {
        info!("Not signed in; change feed disabled");
        return None;
    };

    let (feed_tx, mut feed_rx) = tokio::sync::mpsc::channel::<Reservation>(16);
    let subscription = ReservationFeed::subscribe(app.store.clone(), user_id, poll_interval, feed_tx);

    // Forward feed rows into the Action channel; ends when the feed stops
    tokio::spawn(async move {
        while let Some(reservation) = feed_rx.recv().await {
            if tx.send(Action::ReservationInserted(reservation)).is_err() {
                warn!("Failed to forward feed row: receiver dropped");
                return;
            }
        }
    });

    Some(subscription)
}

fn spawn_submit(app: &App, pending: PendingSubmission, tx: mpsc::Sender<Action>) -> AbortHandle {
    info!("Spawning insert for attempt {}", pending.attempt);
    let store = app.store.clone();
    let handle = tokio::spawn(async move {
        let result = store.insert(&pending.payload).await;
        if tx
            .send(Action::SubmissionFinished {
                attempt: pending.attempt,
                result,
            })
            .is_err()
        {
            warn!("Failed to send submission result: receiver dropped");
        }
    });
    handle.abort_handle()
}

fn spawn_history(app: &App, tx: mpsc::Sender<Action>) -> AbortHandle {
    let store = app.store.clone();
    let user = app.auth.current_user();
    let handle = tokio::spawn(async move {
        let result = match user {
            Some(user_id) => {
                store
                    .query(&ReservationQuery::for_user(user_id).limit(HISTORY_LIMIT))
                    .await
            }
            None => Err(crate::backend::BackendError::AuthRequired),
        };
        if tx.send(Action::HistoryLoaded(result)).is_err() {
            warn!("Failed to send history: receiver dropped");
        }
    });
    handle.abort_handle()
}

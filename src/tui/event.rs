use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI-specific input events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiEvent {
    // Calendar navigation (handled directly in TUI)
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    PrevMonth,
    NextMonth,

    // Core actions (passed to core::update)
    Select,
    IncrementGuests,
    DecrementGuests,
    Continue,
    NewBooking,
    ToggleHistory,
    /// Digit key on the review, zero-based.
    PaymentOption(usize),
    Escape,
    Quit,
    ForceQuit,

    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            log::warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(Event::Key(key_event)) => map_key(key_event),
        Ok(Event::Resize(_, _)) => Some(TuiEvent::Resize),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Event read failed: {}", e);
            None
        }
    }
}

/// Translate a key press into a `TuiEvent`.
pub fn map_key(key_event: KeyEvent) -> Option<TuiEvent> {
    // Kitty protocol reports releases too
    if key_event.kind == KeyEventKind::Release {
        return None;
    }
    log::debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
    match (key_event.modifiers, key_event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
        (_, KeyCode::Left) => Some(TuiEvent::CursorLeft),
        (_, KeyCode::Right) => Some(TuiEvent::CursorRight),
        (_, KeyCode::Up) => Some(TuiEvent::CursorUp),
        (_, KeyCode::Down) => Some(TuiEvent::CursorDown),
        (_, KeyCode::PageUp) => Some(TuiEvent::PrevMonth),
        (_, KeyCode::PageDown) => Some(TuiEvent::NextMonth),
        (_, KeyCode::Enter) | (_, KeyCode::Char(' ')) => Some(TuiEvent::Select),
        (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => Some(TuiEvent::IncrementGuests),
        (_, KeyCode::Char('-')) => Some(TuiEvent::DecrementGuests),
        (_, KeyCode::Char('c')) => Some(TuiEvent::Continue),
        (_, KeyCode::Char('n')) => Some(TuiEvent::NewBooking),
        (_, KeyCode::Char('h')) => Some(TuiEvent::ToggleHistory),
        (_, KeyCode::Char('q')) => Some(TuiEvent::Quit),
        (_, KeyCode::Esc) => Some(TuiEvent::Escape),
        (_, KeyCode::Char(c @ '1'..='9')) => Some(TuiEvent::PaymentOption(c as usize - '1' as usize)),
        _ => None,
    }
}

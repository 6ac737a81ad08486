//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: top status line with hotel name and status
//! - `Summary`: stay, price lines, submission state, review
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that keep presentation state and emit events:
//! - `Calendar`: month grid with a cursor, emits day taps
//! - `History`: reservations overlay with total spent
//!
//! Components receive external data as props instead of reaching into
//! `App`, so each one can be rendered against a `TestBackend` in isolation.
//!
//! ```text
//! components/
//! ├── mod.rs        (this file)
//! ├── title_bar.rs  (top status bar)
//! ├── calendar.rs   (month grid + cursor)
//! ├── summary.rs    (price + submission panel)
//! └── history.rs    (reservations overlay)
//! ```

pub mod calendar;
pub mod history;
pub mod summary;
mod title_bar;

pub use calendar::{Calendar, CalendarEvent, CalendarState};
pub use history::{History, HistoryEvent, HistoryState};
pub use summary::Summary;
pub use title_bar::TitleBar;

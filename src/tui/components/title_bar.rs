//! # TitleBar Component
//!
//! Top status bar: hotel name, the latest status message, and a "● New"
//! marker when the change feed delivered a reservation the user has not
//! looked at yet.
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state.
//!
//! The title text changes based on state:
//!
//! 1. **New reservation**: `"staybook · Pousada | Saving... | ● New"`
//! 2. **Status message**: `"staybook · Pousada | Saving..."`
//! 3. **Default**: `"staybook · Pousada"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

pub struct TitleBar {
    pub hotel_name: String,
    pub status_message: String,
    pub has_new_reservation: bool,
}

impl TitleBar {
    pub fn new(hotel_name: String, status_message: String, has_new_reservation: bool) -> Self {
        Self {
            hotel_name,
            status_message,
            has_new_reservation,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title_text = if self.has_new_reservation {
            format!(
                "staybook · {} | {} | ● New",
                self.hotel_name, self.status_message
            )
        } else if self.status_message.is_empty() {
            format!("staybook · {}", self.hotel_name)
        } else {
            format!("staybook · {} | {}", self.hotel_name, self.status_message)
        };

        frame.render_widget(Span::raw(title_text), area);
    }
}

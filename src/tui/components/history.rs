//! # History Component
//!
//! Full-screen overlay listing the user's reservations, newest first, with
//! the total spent. Opened with `h`, dismissed with `h` or Esc.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `HistoryState` lives in `TuiState`
//! - `History` is created each frame with borrowed state and rows

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::backend::Reservation;
use crate::core::card::total_spent;
use crate::core::pricing::format_price;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Persistent state for the history overlay.
#[derive(Default)]
pub struct HistoryState {
    pub selected: usize,
    pub list_state: ListState,
}

impl HistoryState {
    /// Keeps the selection inside `len` rows.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
    }
}

/// Events emitted by the history overlay.
#[derive(Debug, PartialEq, Eq)]
pub enum HistoryEvent {
    Dismiss,
}

impl EventHandler for HistoryState {
    type Event = HistoryEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<HistoryEvent> {
        match event {
            TuiEvent::Escape | TuiEvent::ToggleHistory => Some(HistoryEvent::Dismiss),
            TuiEvent::CursorUp => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            TuiEvent::CursorDown => {
                self.selected += 1;
                None
            }
            _ => None,
        }
    }
}

/// Transient render wrapper for the history overlay.
pub struct History<'a> {
    state: &'a mut HistoryState,
    reservations: &'a [Reservation],
    loading: bool,
    currency: &'a str,
}

impl<'a> History<'a> {
    pub fn new(
        state: &'a mut HistoryState,
        reservations: &'a [Reservation],
        loading: bool,
        currency: &'a str,
    ) -> Self {
        Self {
            state,
            reservations,
            loading,
            currency,
        }
    }
}

impl Component for History<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let total = format!(
            " Total spent {} ",
            format_price(total_spent(self.reservations), self.currency)
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" My reservations ")
            .title_alignment(Alignment::Left)
            .title(Line::from(total).right_aligned())
            .title_bottom(Line::from(" ↑↓ Scroll  Esc Back ").centered())
            .padding(Padding::horizontal(1));

        if self.loading || self.reservations.is_empty() {
            let text = if self.loading {
                "Loading..."
            } else {
                "No reservations yet."
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        self.state.clamp(self.reservations.len());

        let items: Vec<ListItem> = self
            .reservations
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let style = if i == self.state.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let line = Line::from(vec![
                    Span::styled(
                        format!(
                            "{} → {}",
                            r.check_in.format("%b %d"),
                            r.check_out.format("%b %d %Y")
                        ),
                        style,
                    ),
                    Span::styled(format!("  {:>2} nights", r.nights()), style),
                    Span::styled(format!("  {} guests", r.guests), style),
                    Span::styled(
                        format!("  {}", format_price(r.total_price, self.currency)),
                        style,
                    ),
                ]);
                ListItem::new(line)
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

//! # Calendar Component
//!
//! Month grid with a keyboard cursor. Days outside the bookable window are
//! dimmed and cannot be tapped; days covered by the selection are painted
//! from the core's `MarkMap`.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `CalendarState` lives in `TuiState`
//! - `Calendar` is created each frame with borrowed state and marks

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};

use crate::core::marks::{MarkMap, date_key};
use crate::core::selection::BookingWindow;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

const WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa ";

/// Weeks of the month, Sunday first. `None` pads days from other months.
pub fn month_grid(year: i32, month: u32) -> Vec<[Option<NaiveDate>; 7]> {
    let mut weeks = Vec::new();
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return weeks;
    };

    let mut week = [None; 7];
    let mut day = first;
    while day.month() == month {
        let col = day.weekday().num_days_from_sunday() as usize;
        week[col] = Some(day);
        if day.weekday() == Weekday::Sat {
            weeks.push(week);
            week = [None; 7];
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

/// Parses a palette color (`#RRGGBB` or a named color).
fn parse_color(value: &str) -> Color {
    value.parse().unwrap_or(Color::Reset)
}

/// Persistent state for the calendar.
pub struct CalendarState {
    pub cursor: NaiveDate,
    pub window: BookingWindow,
}

impl CalendarState {
    /// Cursor starts on today.
    pub fn new(window: BookingWindow) -> Self {
        Self {
            cursor: window.today(),
            window,
        }
    }

    pub fn is_enabled(&self, day: NaiveDate) -> bool {
        self.window.contains(day)
    }

    fn shift_days(&mut self, delta: i64) {
        let moved = if delta >= 0 {
            self.cursor.checked_add_days(Days::new(delta as u64))
        } else {
            self.cursor.checked_sub_days(Days::new(delta.unsigned_abs()))
        };
        if let Some(day) = moved {
            self.cursor = day;
        }
    }

    fn shift_months(&mut self, delta: i32) {
        let moved = if delta >= 0 {
            self.cursor.checked_add_months(Months::new(delta as u32))
        } else {
            self.cursor.checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        if let Some(day) = moved {
            self.cursor = day;
        }
    }
}

/// Events emitted by the calendar.
#[derive(Debug, PartialEq, Eq)]
pub enum CalendarEvent {
    DayTapped(NaiveDate),
}

impl EventHandler for CalendarState {
    type Event = CalendarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<CalendarEvent> {
        match event {
            TuiEvent::CursorLeft => self.shift_days(-1),
            TuiEvent::CursorRight => self.shift_days(1),
            TuiEvent::CursorUp => self.shift_days(-7),
            TuiEvent::CursorDown => self.shift_days(7),
            TuiEvent::PrevMonth => self.shift_months(-1),
            TuiEvent::NextMonth => self.shift_months(1),
            TuiEvent::Select if self.is_enabled(self.cursor) => {
                return Some(CalendarEvent::DayTapped(self.cursor));
            }
            _ => {}
        }
        None
    }
}

/// Transient render wrapper for the calendar.
pub struct Calendar<'a> {
    state: &'a CalendarState,
    marks: &'a MarkMap,
}

impl<'a> Calendar<'a> {
    pub fn new(state: &'a CalendarState, marks: &'a MarkMap) -> Self {
        Self { state, marks }
    }

    fn day_style(&self, day: NaiveDate) -> Style {
        let mut style = Style::default();
        if !self.state.is_enabled(day) {
            style = style.fg(Color::DarkGray).add_modifier(Modifier::DIM);
        } else if let Some(mark) = self.marks.get(&date_key(day)) {
            style = style
                .bg(parse_color(&mark.band_color))
                .fg(parse_color(&mark.text_color));
            if mark.is_start || mark.is_end {
                style = style.add_modifier(Modifier::BOLD);
            }
        }
        if day == self.state.cursor {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        }
        style
    }
}

impl Component for Calendar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let cursor = self.state.cursor;
        let title = format!(" {} ", cursor.format("%B %Y"));

        let mut lines = vec![Line::from(Span::styled(
            WEEKDAY_HEADER,
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        ))];

        for week in month_grid(cursor.year(), cursor.month()) {
            let spans: Vec<Span> = week
                .iter()
                .map(|slot| match slot {
                    Some(day) => Span::styled(format!(" {:>2} ", day.day()), self.day_style(*day)),
                    None => Span::raw("    "),
                })
                .collect();
            lines.push(Line::from(spans));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title)
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(" PgUp/PgDn month ").centered())
            .padding(Padding::horizontal(1));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::DateSelection;
    use crate::core::marks::compute_marks;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_month_grid_june_2025() {
        // June 1st 2025 is a Sunday.
        let grid = month_grid(2025, 6);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0][0], Some(day(6, 1)));
        assert_eq!(grid[4][1], Some(day(6, 30)));
        assert_eq!(grid[4][2], None);
    }

    #[test]
    fn test_month_grid_pads_leading_days() {
        // February 1st 2025 is a Saturday.
        let grid = month_grid(2025, 2);
        assert_eq!(grid[0][..6], [None; 6]);
        assert_eq!(grid[0][6], Some(day(2, 1)));
        let days: usize = grid.iter().map(|w| w.iter().flatten().count()).sum();
        assert_eq!(days, 28);
    }

    #[test]
    fn test_invalid_month_is_empty() {
        assert!(month_grid(2025, 13).is_empty());
    }

    #[test]
    fn test_cursor_navigation() {
        let mut state = CalendarState::new(BookingWindow::with_clock(None, || day(6, 10)));
        state.handle_event(&TuiEvent::CursorRight);
        assert_eq!(state.cursor, day(6, 11));
        state.handle_event(&TuiEvent::CursorDown);
        assert_eq!(state.cursor, day(6, 18));
        state.handle_event(&TuiEvent::NextMonth);
        assert_eq!(state.cursor, day(7, 18));
        state.handle_event(&TuiEvent::PrevMonth);
        state.handle_event(&TuiEvent::CursorUp);
        assert_eq!(state.cursor, day(6, 11));
    }

    #[test]
    fn test_select_emits_tap_only_for_enabled_days() {
        let mut state =
            CalendarState::new(BookingWindow::with_clock(Some(day(6, 20)), || day(6, 10)));
        assert_eq!(
            state.handle_event(&TuiEvent::Select),
            Some(CalendarEvent::DayTapped(day(6, 10)))
        );

        state.handle_event(&TuiEvent::CursorLeft);
        assert_eq!(state.handle_event(&TuiEvent::Select), None);

        state.cursor = day(6, 21);
        assert_eq!(state.handle_event(&TuiEvent::Select), None);
    }

    #[test]
    fn test_render_paints_selected_days() {
        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();

        let state = CalendarState::new(BookingWindow::with_clock(None, || day(6, 1)));
        let mut selection = DateSelection::new();
        selection.on_day_tapped(day(6, 10));
        selection.on_day_tapped(day(6, 15));
        let marks = compute_marks(&selection);

        terminal
            .draw(|f| {
                Calendar::new(&state, &marks).render(f, f.area());
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text = buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("June 2025"));
        assert!(text.contains("Su  Mo"));

        let endpoint = Color::Rgb(0xD4, 0xA3, 0x73);
        let band = Color::Rgb(0xF0, 0xE6, 0xD2);
        assert!(buffer.content().iter().any(|c| c.bg == endpoint));
        assert!(buffer.content().iter().any(|c| c.bg == band));
    }

    #[test]
    fn test_parse_color_falls_back() {
        assert_eq!(parse_color("white"), Color::White);
        assert_eq!(parse_color("not-a-color"), Color::Reset);
    }
}

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{Calendar, History, Summary, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

const CALENDAR_WIDTH: u16 = 34;
const HELP_TEXT: &str = " +/- Guests  c Continue  1-9 Pay  n New booking  h History  q Quit";

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(1)]);
    let [title_area, main_area, help_area] = layout.areas(frame.area());

    TitleBar::new(
        app.hotel_name.clone(),
        app.status_message.clone(),
        app.has_new_reservation,
    )
    .render(frame, title_area);

    let [calendar_area, summary_area] =
        Layout::horizontal([Length(CALENDAR_WIDTH), Min(0)]).areas(main_area);

    let marks = app.marks();
    Calendar::new(&tui.calendar, &marks).render(frame, calendar_area);

    Summary {
        hotel_name: &app.hotel_name,
        currency: &app.currency,
        selection: &app.selection,
        guests: app.guests.get(),
        price: app.price(),
        phase: app.submitter.phase(),
        review: app.review(),
        saved_card: app.saved_card.as_ref(),
        payment: app.payment.as_ref(),
    }
    .render(frame, summary_area);

    frame.render_widget(
        Span::styled(HELP_TEXT, Style::default().fg(Color::DarkGray)),
        help_area,
    );

    if app.history_open {
        History::new(
            &mut tui.history,
            &app.history,
            app.history_loading,
            &app.currency,
        )
        .render(frame, frame.area());
    }
}

//! # Summary Component
//!
//! Right-hand panel: the stay being booked, its price lines, and the state
//! of the submission. Once a reservation is confirmed it switches to the
//! review summary with the available payment options.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};

use crate::core::card::{PaymentMethod, ReviewSummary, payment_options};
use crate::core::pricing::{PriceBreakdown, format_price};
use crate::core::selection::DateSelection;
use crate::core::submit::SubmitPhase;
use crate::backend::Card;
use crate::tui::component::Component;

pub struct Summary<'a> {
    pub hotel_name: &'a str,
    pub currency: &'a str,
    pub selection: &'a DateSelection,
    pub guests: u32,
    pub price: PriceBreakdown,
    pub phase: &'a SubmitPhase,
    pub review: Option<ReviewSummary>,
    pub saved_card: Option<&'a Card>,
    pub payment: Option<&'a PaymentMethod>,
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{text:<12}"), Style::default().fg(Color::Gray))
}

impl Summary<'_> {
    fn money(&self, amount: rust_decimal::Decimal) -> String {
        format_price(amount, self.currency)
    }

    fn booking_lines(&self) -> Vec<Line<'static>> {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%a, %b %d").to_string())
                .unwrap_or_else(|| "--".to_string())
        };
        let mut lines = vec![
            Line::from(vec![label("Check-in"), Span::raw(date(self.selection.check_in()))]),
            Line::from(vec![label("Check-out"), Span::raw(date(self.selection.check_out()))]),
            Line::from(vec![label("Guests"), Span::raw(format!("{}  (+/-)", self.guests))]),
            Line::default(),
        ];

        if self.price.is_bookable() {
            lines.push(Line::from(vec![
                label("Stay"),
                Span::raw(format!(
                    "{} x {} nights = {}",
                    self.money(self.price.nightly_rate),
                    self.price.nights,
                    self.money(self.price.subtotal)
                )),
            ]));
            lines.push(Line::from(vec![
                label("Service fee"),
                Span::raw(self.money(self.price.service_fee)),
            ]));
            lines.push(Line::from(vec![
                label("Total"),
                Span::styled(
                    self.money(self.price.total),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                "Select check-in and check-out dates",
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines.push(Line::default());
        lines.push(match self.phase {
            SubmitPhase::Submitting | SubmitPhase::Validating => Line::from(Span::styled(
                "Saving reservation...",
                Style::default().fg(Color::Yellow),
            )),
            SubmitPhase::Failed(e) => Line::from(Span::styled(
                format!("{}  (c to retry)", e.user_message()),
                Style::default().fg(Color::Red),
            )),
            _ => Line::from(Span::styled(
                "c Continue",
                Style::default().fg(Color::Cyan),
            )),
        });
        lines
    }

    fn review_lines(&self, review: &ReviewSummary) -> Vec<Line<'static>> {
        let stay = &review.reservation;
        let mut lines = vec![
            Line::from(Span::styled(
                "Reservation confirmed",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(vec![
                label("Dates"),
                Span::raw(format!("{} → {}", stay.check_in, stay.check_out)),
            ]),
            Line::from(vec![
                label("Nights"),
                Span::raw(review.price.nights.to_string()),
            ]),
            Line::from(vec![label("Guests"), Span::raw(stay.guests.to_string())]),
            Line::from(vec![
                label("Service fee"),
                Span::raw(self.money(review.price.service_fee)),
            ]),
            Line::from(vec![
                label("Amount due"),
                Span::styled(
                    self.money(review.amount_due()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::default(),
            Line::from(Span::styled("Pay with (1-9)", Style::default().fg(Color::Gray))),
        ];
        for (i, method) in payment_options(self.saved_card).iter().enumerate() {
            let chosen = self.payment == Some(method);
            let marker = if chosen { "✓" } else { " " };
            let style = if chosen {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{marker} {} {}", i + 1, method.label()),
                style,
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "n New booking",
            Style::default().fg(Color::Cyan),
        )));
        lines
    }
}

impl Component for Summary<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = match &self.review {
            Some(review) => self.review_lines(review),
            None => self.booking_lines(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", self.hotel_name))
            .padding(Padding::horizontal(1));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Reservation, ReservationId, UserId};
    use crate::core::pricing::PricingCalculator;
    use crate::core::submit::{SubmitError, ValidationError};
    use chrono::{NaiveDate, Utc};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn render(summary: &mut Summary) -> String {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| summary.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_renders_price_lines() {
        let mut selection = DateSelection::new();
        selection.on_day_tapped(day(6, 10));
        selection.on_day_tapped(day(6, 15));
        let price = PricingCalculator::default().compute(&selection);

        let mut summary = Summary {
            hotel_name: "Pousada Vale Verde",
            currency: "R$",
            selection: &selection,
            guests: 2,
            price,
            phase: &SubmitPhase::Idle,
            review: None,
            saved_card: None,
            payment: None,
        };
        let text = render(&mut summary);
        assert!(text.contains("Pousada Vale Verde"));
        assert!(text.contains("R$ 725.00"));
        assert!(text.contains("R$ 72.50"));
        assert!(text.contains("R$ 797.50"));
        assert!(text.contains("c Continue"));
    }

    #[test]
    fn test_renders_failure_message() {
        let selection = DateSelection::new();
        let phase = SubmitPhase::Failed(SubmitError::Validation(
            ValidationError::IncompleteInterval,
        ));
        let mut summary = Summary {
            hotel_name: "Hotel",
            currency: "R$",
            selection: &selection,
            guests: 1,
            price: PricingCalculator::default().compute(&selection),
            phase: &phase,
            review: None,
            saved_card: None,
            payment: None,
        };
        let text = render(&mut summary);
        assert!(text.contains("c to retry"));
    }

    #[test]
    fn test_renders_review_with_saved_card() {
        let reservation = Reservation {
            id: ReservationId(7),
            user_id: UserId(Uuid::nil()),
            check_in: day(6, 10),
            check_out: day(6, 15),
            guests: 2,
            total_price: Decimal::new(7975, 1),
            created_at: Utc::now(),
        };
        let card = Card {
            last4: "4242".into(),
            name_on_card: "ANA".into(),
            expiry: "12/29".into(),
        };
        let review = ReviewSummary::new(
            reservation.clone(),
            Decimal::from(145),
            Decimal::new(10, 2),
            Some(&card),
        );
        let selection = DateSelection::new();
        let phase = SubmitPhase::Confirmed(reservation);
        let mut summary = Summary {
            hotel_name: "Hotel",
            currency: "R$",
            selection: &selection,
            guests: 2,
            price: PricingCalculator::default().compute(&selection),
            phase: &phase,
            review: Some(review),
            saved_card: Some(&card),
            payment: Some(&PaymentMethod::ApplePay),
        };
        let text = render(&mut summary);
        assert!(text.contains("Reservation confirmed"));
        assert!(text.contains("R$ 797.50"));
        assert!(text.contains("4242"));
        assert!(text.contains("✓ 2 Apple Pay"));
        assert!(text.contains("3 •••• •••• •••• 4242"));
    }
}

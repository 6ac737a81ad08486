//! # Card Entry, Payment Choice, Review
//!
//! Form state for adding a card, the list of payment options shown after a
//! booking is confirmed, and the review summary of the latest reservation.
//! Only the last four digits of a card number are ever persisted.

use rust_decimal::Decimal;

use crate::backend::{Card, NewCard, Reservation, UserId};
use crate::core::pricing::PriceBreakdown;

const NUMBER_DIGITS: usize = 16;
const EXPIRY_DIGITS: usize = 4;
const CVV_DIGITS: usize = 3;

fn digits(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_digit).take(max).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    number: String,
    name: String,
    expiry: String,
    cvv: String,
}

impl CardDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_number(&mut self, input: &str) {
        self.number = digits(input, NUMBER_DIGITS);
    }

    pub fn set_name(&mut self, input: &str) {
        self.name = input.trim().to_uppercase();
    }

    pub fn set_expiry(&mut self, input: &str) {
        self.expiry = digits(input, EXPIRY_DIGITS);
    }

    pub fn set_cvv(&mut self, input: &str) {
        self.cvv = digits(input, CVV_DIGITS);
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last4(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        &self.number[start..]
    }

    pub fn is_complete(&self) -> bool {
        self.number.len() == NUMBER_DIGITS
            && !self.name.is_empty()
            && self.expiry.len() == EXPIRY_DIGITS
            && self.cvv.len() == CVV_DIGITS
    }

    /// Row payload; `None` until every field is filled in.
    pub fn to_new_card(&self, user_id: UserId) -> Option<NewCard> {
        if !self.is_complete() {
            return None;
        }
        Some(NewCard {
            user_id,
            last4: self.last4().to_string(),
            name_on_card: self.name.clone(),
            expiry: format_expiry(&self.expiry),
        })
    }
}

/// Groups digits by four with all but the last four masked; a fully masked
/// placeholder when empty.
pub fn format_card_number(number: &str) -> String {
    let cleaned = digits(number, NUMBER_DIGITS);
    if cleaned.is_empty() {
        return "•••• •••• •••• ••••".to_string();
    }
    let visible_from = cleaned.len().saturating_sub(4);
    let chars: Vec<char> = cleaned
        .chars()
        .enumerate()
        .map(|(i, c)| if i < visible_from { '•' } else { c })
        .collect();
    chars
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `MMYY` → `MM/YY`; shows `MM/YY` placeholder when empty.
pub fn format_expiry(expiry: &str) -> String {
    let cleaned = digits(expiry, EXPIRY_DIGITS);
    if cleaned.is_empty() {
        return "MM/YY".to_string();
    }
    if cleaned.len() > 2 {
        format!("{}/{}", &cleaned[..2], &cleaned[2..])
    } else {
        cleaned
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    GooglePay,
    ApplePay,
    SavedCard { last4: String },
    AddCard,
}

impl PaymentMethod {
    pub fn label(&self) -> String {
        match self {
            PaymentMethod::GooglePay => "Google Pay".to_string(),
            PaymentMethod::ApplePay => "Apple Pay".to_string(),
            PaymentMethod::SavedCard { last4 } => format_card_number(&format!("{last4:0>16}")),
            PaymentMethod::AddCard => "Add credit card".to_string(),
        }
    }
}

/// Where choosing a payment method leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStep {
    EnterCard,
    Review,
}

pub fn payment_options(saved: Option<&Card>) -> Vec<PaymentMethod> {
    let mut options = vec![PaymentMethod::GooglePay, PaymentMethod::ApplePay];
    if let Some(card) = saved {
        options.push(PaymentMethod::SavedCard {
            last4: card.last4.clone(),
        });
    }
    options.push(PaymentMethod::AddCard);
    options
}

pub fn next_step(method: &PaymentMethod) -> PaymentStep {
    match method {
        PaymentMethod::AddCard => PaymentStep::EnterCard,
        _ => PaymentStep::Review,
    }
}

/// Picks the option at `index` of [`payment_options`] and where it leads.
pub fn choose(saved: Option<&Card>, index: usize) -> Option<(PaymentMethod, PaymentStep)> {
    let method = payment_options(saved).into_iter().nth(index)?;
    let step = next_step(&method);
    Some((method, step))
}

/// What the review / ticket screen shows for a persisted reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub reservation: Reservation,
    pub price: PriceBreakdown,
    pub card_last4: Option<String>,
}

impl ReviewSummary {
    /// Re-derives the price lines for the stored stay at the given rates.
    pub fn new(
        reservation: Reservation,
        nightly_rate: Decimal,
        service_fee_rate: Decimal,
        card: Option<&Card>,
    ) -> Self {
        let price = PriceBreakdown::for_nights(reservation.nights(), nightly_rate, service_fee_rate);
        Self {
            reservation,
            price,
            card_last4: card.map(|c| c.last4.clone()),
        }
    }

    /// The amount charged is the one stored at booking time.
    pub fn amount_due(&self) -> Decimal {
        self.reservation.total_price
    }
}

/// Sum of all reservation totals.
pub fn total_spent(reservations: &[Reservation]) -> Decimal {
    reservations.iter().map(|r| r.total_price).sum()
}

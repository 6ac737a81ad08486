//! # Pricing
//!
//! Nights, subtotal, service fee and total for a selection. All amounts are
//! `Decimal`; rounding happens only in [`format_price`].

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::selection::DateSelection;

/// Nightly rate used when the config does not set one.
pub fn default_nightly_rate() -> Decimal {
    Decimal::from(145)
}

/// 10% service fee.
pub fn default_service_fee_rate() -> Decimal {
    Decimal::new(10, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub nights: i64,
    pub nightly_rate: Decimal,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Breakdown for an explicit night count. Negative counts price as zero.
    pub fn for_nights(nights: i64, nightly_rate: Decimal, service_fee_rate: Decimal) -> Self {
        let nights = nights.max(0);
        let subtotal = Decimal::from(nights) * nightly_rate;
        let service_fee = subtotal * service_fee_rate;
        Self {
            nights,
            nightly_rate,
            subtotal,
            service_fee,
            total: subtotal + service_fee,
        }
    }

    pub fn is_bookable(&self) -> bool {
        self.nights > 0
    }
}

pub fn compute_total(
    selection: &DateSelection,
    nightly_rate: Decimal,
    service_fee_rate: Decimal,
) -> PriceBreakdown {
    PriceBreakdown::for_nights(selection.nights(), nightly_rate, service_fee_rate)
}

/// Hotel-scoped rates, so callers don't thread two decimals everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingCalculator {
    pub nightly_rate: Decimal,
    pub service_fee_rate: Decimal,
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self {
            nightly_rate: default_nightly_rate(),
            service_fee_rate: default_service_fee_rate(),
        }
    }
}

impl PricingCalculator {
    pub fn new(nightly_rate: Decimal, service_fee_rate: Decimal) -> Self {
        Self {
            nightly_rate,
            service_fee_rate,
        }
    }

    pub fn compute(&self, selection: &DateSelection) -> PriceBreakdown {
        compute_total(selection, self.nightly_rate, self.service_fee_rate)
    }
}

/// Rounds to cents (half away from zero) and prefixes the currency symbol.
pub fn format_price(amount: Decimal, currency: &str) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("{currency} {rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn interval(a: NaiveDate, b: NaiveDate) -> DateSelection {
        let mut sel = DateSelection::new();
        sel.on_day_tapped(a);
        sel.on_day_tapped(b);
        sel
    }

    #[test]
    fn test_five_nights_at_145() {
        let sel = interval(day(6, 10), day(6, 15));
        let price = compute_total(&sel, Decimal::from(145), default_service_fee_rate());
        assert_eq!(price.nights, 5);
        assert_eq!(price.subtotal, Decimal::from(725));
        assert_eq!(price.service_fee, Decimal::new(725, 1));
        assert_eq!(price.total, Decimal::new(7975, 1));
        assert!(price.is_bookable());
    }

    #[test]
    fn test_no_interval_totals_zero() {
        let mut sel = DateSelection::new();
        assert_eq!(PricingCalculator::default().compute(&sel).total, Decimal::ZERO);

        sel.on_day_tapped(day(6, 10));
        let price = PricingCalculator::default().compute(&sel);
        assert_eq!(price.nights, 0);
        assert_eq!(price.total, Decimal::ZERO);
        assert!(!price.is_bookable());
    }

    #[test]
    fn test_total_identity() {
        let rate = Decimal::new(19999, 2);
        let fee = Decimal::new(125, 3);
        for nights in 0..30 {
            let price = PriceBreakdown::for_nights(nights, rate, fee);
            assert_eq!(
                price.total,
                Decimal::from(nights) * rate * (Decimal::ONE + fee)
            );
        }
    }

    #[test]
    fn test_no_float_drift() {
        // 0.1 + 0.2 style amounts stay exact.
        let price = PriceBreakdown::for_nights(3, Decimal::new(10, 2), Decimal::new(10, 2));
        assert_eq!(price.subtotal, Decimal::new(30, 2));
        assert_eq!(price.service_fee, Decimal::new(30, 3));
        assert_eq!(price.total, Decimal::new(330, 3));
    }

    #[test]
    fn test_negative_nights_price_as_zero() {
        let price = PriceBreakdown::for_nights(-3, Decimal::from(100), Decimal::ZERO);
        assert_eq!(price.nights, 0);
        assert_eq!(price.total, Decimal::ZERO);
    }

    #[test]
    fn test_format_price_rounds_only_at_display() {
        assert_eq!(format_price(Decimal::new(7975, 1), "R$"), "R$ 797.50");
        assert_eq!(format_price(Decimal::new(1005, 3), "$"), "$ 1.01");
        assert_eq!(format_price(Decimal::ZERO, "R$"), "R$ 0.00");
        assert_eq!(format_price(Decimal::from(725), "R$"), "R$ 725.00");
    }
}

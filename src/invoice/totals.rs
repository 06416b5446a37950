//! Derived money figures for a billing record.
//!
//! Line amounts are exact decimal products. The subtotal is rounded once to
//! cents, tax is computed on the rounded subtotal and rounded to cents, and
//! the total is the sum of both rounded figures, so the printed numbers
//! always add up.

use rust_decimal::{Decimal, RoundingStrategy};

use super::models::LineItem;
use super::GeneratorError;

const CENTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> Result<Self, GeneratorError> {
        let mut sum = Decimal::ZERO;
        for item in items {
            sum = item
                .amount()
                .and_then(|amount| sum.checked_add(amount))
                .ok_or_else(|| GeneratorError::AmountOverflow(item.description.clone()))?;
        }

        let subtotal = round_cents(sum);
        let tax = subtotal
            .checked_mul(tax_rate)
            .map(round_cents)
            .ok_or_else(|| GeneratorError::AmountOverflow("tax".to_string()))?;
        let total = subtotal
            .checked_add(tax)
            .ok_or_else(|| GeneratorError::AmountOverflow("total".to_string()))?;

        Ok(Self {
            subtotal,
            tax,
            total,
        })
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

/// Two-decimal amount followed by the currency symbol, e.g. `121.00€`.
pub fn format_currency(value: Decimal, symbol: &str) -> String {
    let mut rounded = round_cents(value);
    rounded.rescale(CENTS);
    format!("{rounded}{symbol}")
}

/// Quantity as plain text without trailing zeros.
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

/// Percentage label for a rate, `0.21` becomes `21`.
pub fn format_rate(rate: Decimal) -> String {
    (rate * Decimal::ONE_HUNDRED).normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(quantity: Decimal, unit_price: Decimal) -> LineItem {
        LineItem {
            description: "item".to_string(),
            quantity,
            unit_price,
        }
    }

    fn rate() -> Decimal {
        Decimal::new(21, 2)
    }

    #[test]
    fn test_single_service_totals() {
        let totals = Totals::compute(&[item(Decimal::TWO, Decimal::new(5000, 2))], rate()).unwrap();

        assert_eq!(format_currency(totals.subtotal, "€"), "100.00€");
        assert_eq!(format_currency(totals.tax, "€"), "21.00€");
        assert_eq!(format_currency(totals.total, "€"), "121.00€");
    }

    #[test]
    fn test_subtotal_is_exact_sum_of_lines() {
        let items = vec![
            item(Decimal::new(3, 0), Decimal::new(333, 2)),
            item(Decimal::new(15, 1), Decimal::new(1999, 2)),
            item(Decimal::ONE, Decimal::new(1, 1)),
        ];
        let totals = Totals::compute(&items, rate()).unwrap();

        // 9.99 + 29.985 + 0.1 = 40.075
        assert_eq!(totals.subtotal, Decimal::new(4008, 2));
        assert_eq!(totals.tax, Decimal::new(842, 2));
        assert_eq!(totals.total, totals.subtotal + totals.tax);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.50 * 0.21 = 0.105
        let totals = Totals::compute(&[item(Decimal::ONE, Decimal::new(50, 2))], rate()).unwrap();
        assert_eq!(totals.tax, Decimal::new(11, 2));
    }

    #[test]
    fn test_empty_items_total_zero() {
        let totals = Totals::compute(&[], rate()).unwrap();
        assert_eq!(format_currency(totals.total, "€"), "0.00€");
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = Totals::compute(&[item(Decimal::MAX, Decimal::TWO)], rate()).unwrap_err();
        assert!(matches!(err, GeneratorError::AmountOverflow(_)));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_quantity(Decimal::new(200, 2)), "2");
        assert_eq!(format_quantity(Decimal::new(25, 1)), "2.5");
        assert_eq!(format_currency(Decimal::new(12345, 3), "€"), "12.35€");
        assert_eq!(format_rate(rate()), "21");
    }
}

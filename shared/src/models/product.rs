//! Product metrics

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived figures shown next to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub stock_value: Decimal,
    /// Percentage over purchase price
    pub profit_margin: Decimal,
    pub is_low_stock: bool,
}

impl ProductMetrics {
    /// Metrics for unvalidated prices, `None` on overflow
    pub fn try_compute(
        stock_quantity: i32,
        minimum_stock: i32,
        purchase_price: Decimal,
        selling_price: Decimal,
    ) -> Option<Self> {
        Some(Self {
            stock_value: checked_stock_value(stock_quantity, purchase_price)?,
            profit_margin: checked_profit_margin(purchase_price, selling_price)?,
            is_low_stock: is_low_stock(stock_quantity, minimum_stock),
        })
    }

    pub fn compute(
        stock_quantity: i32,
        minimum_stock: i32,
        purchase_price: Decimal,
        selling_price: Decimal,
    ) -> Self {
        Self {
            stock_value: stock_value(stock_quantity, purchase_price),
            profit_margin: profit_margin(purchase_price, selling_price),
            is_low_stock: is_low_stock(stock_quantity, minimum_stock),
        }
    }
}

/// A product is low on stock once it reaches its minimum
pub fn is_low_stock(stock_quantity: i32, minimum_stock: i32) -> bool {
    stock_quantity <= minimum_stock
}

/// Value of stock on hand at purchase price.
///
/// Prices that pass `validate_price` never overflow; use
/// [`checked_stock_value`] for unvalidated input.
pub fn stock_value(stock_quantity: i32, purchase_price: Decimal) -> Decimal {
    Decimal::from(stock_quantity) * purchase_price
}

/// Stock value, or `None` when it does not fit a `Decimal`
pub fn checked_stock_value(stock_quantity: i32, purchase_price: Decimal) -> Option<Decimal> {
    Decimal::from(stock_quantity).checked_mul(purchase_price)
}

/// Margin of selling over purchase price in percent, rounded to 2 places.
/// Zero when the purchase price is not positive.
///
/// Prices that pass `validate_price` never overflow; use
/// [`checked_profit_margin`] for unvalidated input.
pub fn profit_margin(purchase_price: Decimal, selling_price: Decimal) -> Decimal {
    if purchase_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((selling_price - purchase_price) / purchase_price * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Profit margin, or `None` when an intermediate result overflows
pub fn checked_profit_margin(purchase_price: Decimal, selling_price: Decimal) -> Option<Decimal> {
    if purchase_price <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    selling_price
        .checked_sub(purchase_price)?
        .checked_div(purchase_price)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|margin| margin.round_dp(2))
}

/// Units missing to reach the minimum. Zero or negative when not short.
pub fn shortage(stock_quantity: i32, minimum_stock: i32) -> i32 {
    minimum_stock - stock_quantity
}

/// Units to order to get back to the minimum
pub fn restock_quantity(stock_quantity: i32, minimum_stock: i32) -> i32 {
    shortage(stock_quantity, minimum_stock).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn low_stock_includes_the_minimum_itself() {
        assert!(is_low_stock(10, 10));
        assert!(is_low_stock(0, 0));
        assert!(!is_low_stock(11, 10));
    }

    #[test]
    fn margin_of_laptop() {
        // 12,000,000 -> 15,000,000 is a 25% margin
        assert_eq!(profit_margin(dec("12000000"), dec("15000000")), dec("25"));
    }

    #[test]
    fn margin_rounds_to_cents() {
        assert_eq!(profit_margin(dec("3"), dec("4")), dec("33.33"));
    }

    #[test]
    fn margin_without_purchase_price() {
        assert_eq!(profit_margin(Decimal::ZERO, dec("10")), Decimal::ZERO);
    }

    #[test]
    fn restock_never_negative() {
        assert_eq!(restock_quantity(8, 10), 2);
        assert_eq!(restock_quantity(12, 10), 0);
        assert_eq!(shortage(12, 10), -2);
    }

    #[test]
    fn checked_metrics_report_overflow() {
        let huge = Decimal::from_scientific("1e26").unwrap();
        assert_eq!(checked_stock_value(i32::MAX, huge), None);
        assert_eq!(checked_profit_margin(dec("0.01"), Decimal::from_scientific("1e27").unwrap()), None);
        assert!(ProductMetrics::try_compute(i32::MAX, 10, huge, huge).is_none());
    }

    #[test]
    fn checked_metrics_match_plain_ones() {
        assert_eq!(checked_stock_value(12, dec("2500.50")), Some(stock_value(12, dec("2500.50"))));
        assert_eq!(checked_profit_margin(dec("3"), dec("4")), Some(dec("33.33")));
        assert_eq!(checked_profit_margin(Decimal::ZERO, dec("4")), Some(Decimal::ZERO));
        assert_eq!(
            ProductMetrics::try_compute(4, 5, dec("2.50"), dec("3.00")),
            Some(ProductMetrics::compute(4, 5, dec("2.50"), dec("3.00")))
        );
    }

    #[test]
    fn metrics_bundle() {
        let m = ProductMetrics::compute(4, 5, dec("2.50"), dec("3.00"));
        assert_eq!(m.stock_value, dec("10.00"));
        assert_eq!(m.profit_margin, dec("20"));
        assert!(m.is_low_stock);
    }
}

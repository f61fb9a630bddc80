//! Stock ledger arithmetic
//!
//! A product's `stock_quantity` is a running balance over its stock
//! transactions. Every function here is pure so the same rules can be
//! enforced by the backend inside a database transaction and checked
//! client-side through the WASM module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl TransactionType {
    /// Stored and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::In => "IN",
            TransactionType::Out => "OUT",
        }
    }

    /// Human readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionType::In => "Stock In",
            TransactionType::Out => "Stock Out",
        }
    }

    /// The movement that undoes this one
    pub fn opposite(&self) -> Self {
        match self {
            TransactionType::In => TransactionType::Out,
            TransactionType::Out => TransactionType::In,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(TransactionType::In),
            "OUT" => Ok(TransactionType::Out),
            _ => Err(LedgerError::UnknownTransactionType(s.to_string())),
        }
    }
}

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("stock balance cannot be negative ({0})")]
    NegativeBalance(i64),

    #[error("stock balance overflow")]
    Overflow,

    #[error("unknown transaction type '{0}'")]
    UnknownTransactionType(String),
}

/// Apply a movement to the current balance and return the new balance.
///
/// OUT movements that would take the balance below zero are rejected;
/// nothing is ever clamped.
pub fn apply_movement(
    current: i32,
    transaction_type: TransactionType,
    quantity: i32,
) -> Result<i32, LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    if current < 0 {
        return Err(LedgerError::NegativeBalance(current as i64));
    }

    match transaction_type {
        TransactionType::In => current.checked_add(quantity).ok_or(LedgerError::Overflow),
        TransactionType::Out => {
            if quantity > current {
                return Err(LedgerError::InsufficientStock {
                    available: current,
                    requested: quantity,
                });
            }
            Ok(current - quantity)
        }
    }
}

/// Undo a committed movement.
///
/// Reversing an IN whose stock has since been shipped out fails with
/// `InsufficientStock`.
pub fn reverse_movement(
    current: i32,
    transaction_type: TransactionType,
    quantity: i32,
) -> Result<i32, LedgerError> {
    apply_movement(current, transaction_type.opposite(), quantity)
}

/// Ledger entry that moves `current` to `target`, if any
pub fn correction_for(
    current: i32,
    target: i32,
) -> Result<Option<(TransactionType, i32)>, LedgerError> {
    if target < 0 {
        return Err(LedgerError::NegativeBalance(target as i64));
    }
    if current < 0 {
        return Err(LedgerError::NegativeBalance(current as i64));
    }

    let correction = match target.cmp(&current) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some((TransactionType::In, target - current)),
        std::cmp::Ordering::Less => Some((TransactionType::Out, current - target)),
    };
    Ok(correction)
}

/// Balance implied by a sequence of ledger entries: SUM(IN) - SUM(OUT)
pub fn ledger_balance<I>(entries: I) -> i64
where
    I: IntoIterator<Item = (TransactionType, i32)>,
{
    entries
        .into_iter()
        .fold(0i64, |acc, (kind, quantity)| match kind {
            TransactionType::In => acc + quantity as i64,
            TransactionType::Out => acc - quantity as i64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_in_adds() {
        assert_eq!(apply_movement(10, TransactionType::In, 5), Ok(15));
    }

    #[test]
    fn stock_out_subtracts_down_to_zero() {
        assert_eq!(apply_movement(10, TransactionType::Out, 10), Ok(0));
    }

    #[test]
    fn stock_out_beyond_balance_is_rejected() {
        assert_eq!(
            apply_movement(3, TransactionType::Out, 4),
            Err(LedgerError::InsufficientStock {
                available: 3,
                requested: 4
            })
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert_eq!(
            apply_movement(3, TransactionType::In, 0),
            Err(LedgerError::InvalidQuantity(0))
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            apply_movement(i32::MAX, TransactionType::In, 1),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn reversing_consumed_stock_in_fails() {
        // 10 received, 8 shipped: the receipt can no longer be undone
        assert!(reverse_movement(2, TransactionType::In, 10).is_err());
        assert_eq!(reverse_movement(2, TransactionType::Out, 8), Ok(10));
    }

    #[test]
    fn correction_direction() {
        assert_eq!(correction_for(5, 5), Ok(None));
        assert_eq!(correction_for(5, 9), Ok(Some((TransactionType::In, 4))));
        assert_eq!(correction_for(5, 1), Ok(Some((TransactionType::Out, 4))));
        assert_eq!(correction_for(5, -1), Err(LedgerError::NegativeBalance(-1)));
    }

    #[test]
    fn parse_transaction_type() {
        assert_eq!("IN".parse::<TransactionType>(), Ok(TransactionType::In));
        assert_eq!(" out ".parse::<TransactionType>(), Ok(TransactionType::Out));
        assert!("ADJ".parse::<TransactionType>().is_err());
    }

    #[test]
    fn transaction_type_serializes_uppercase() {
        let json = serde_json::to_string(&TransactionType::Out).unwrap();
        assert_eq!(json, "\"OUT\"");
    }
}

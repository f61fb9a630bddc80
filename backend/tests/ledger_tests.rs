//! Stock ledger tests
//!
//! Unit and property-based tests for the ledger rules:
//! - stock never goes negative
//! - OUT beyond the balance is rejected, never clamped
//! - the balance always equals SUM(IN) - SUM(OUT)
//! - corrections and reversals land exactly where they should

use proptest::prelude::*;
use shared::{
    apply_movement, correction_for, ledger_balance, reverse_movement, LedgerError, TransactionType,
};

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    /// Receiving stock adds to the balance
    #[test]
    fn test_stock_in() {
        assert_eq!(apply_movement(0, TransactionType::In, 25), Ok(25));
    }

    /// Shipping the whole balance leaves exactly zero
    #[test]
    fn test_stock_out_to_zero() {
        assert_eq!(apply_movement(25, TransactionType::Out, 25), Ok(0));
    }

    /// Shipping more than is on hand fails and reports both numbers
    #[test]
    fn test_insufficient_stock_reports_available_and_requested() {
        let err = apply_movement(7, TransactionType::Out, 10).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: 7,
                requested: 10
            }
        );
        assert_eq!(
            err.to_string(),
            "insufficient stock: available 7, requested 10"
        );
    }

    /// Quantities must be positive in both directions
    #[test]
    fn test_non_positive_quantity() {
        assert_eq!(
            apply_movement(10, TransactionType::Out, -3),
            Err(LedgerError::InvalidQuantity(-3))
        );
        assert_eq!(
            apply_movement(10, TransactionType::In, 0),
            Err(LedgerError::InvalidQuantity(0))
        );
    }

    /// A corrupted negative balance is never moved further
    #[test]
    fn test_negative_current_balance_is_rejected() {
        assert_eq!(
            apply_movement(-1, TransactionType::In, 5),
            Err(LedgerError::NegativeBalance(-1))
        );
    }

    /// Balance of a typical product history
    #[test]
    fn test_ledger_balance_of_history() {
        let history = vec![
            (TransactionType::In, 50),
            (TransactionType::In, 30),
            (TransactionType::Out, 20),
            (TransactionType::In, 10),
            (TransactionType::Out, 15),
        ];

        // 50 + 30 - 20 + 10 - 15 = 55
        assert_eq!(ledger_balance(history), 55);
    }

    /// An empty ledger balances to zero
    #[test]
    fn test_empty_ledger() {
        assert_eq!(ledger_balance(Vec::new()), 0);
    }

    /// Deleting an OUT entry gives the stock back
    #[test]
    fn test_reverse_out() {
        assert_eq!(reverse_movement(5, TransactionType::Out, 3), Ok(8));
    }

    /// Deleting a receipt that was already shipped would go negative
    #[test]
    fn test_reverse_consumed_in() {
        assert_eq!(
            reverse_movement(2, TransactionType::In, 5),
            Err(LedgerError::InsufficientStock {
                available: 2,
                requested: 5
            })
        );
    }

    /// Wire and display forms
    #[test]
    fn test_transaction_type_forms() {
        assert_eq!(TransactionType::In.as_str(), "IN");
        assert_eq!(TransactionType::Out.display_name(), "Stock Out");
        assert_eq!("in".parse::<TransactionType>(), Ok(TransactionType::In));
        assert_eq!(
            "ADJUST".parse::<TransactionType>(),
            Err(LedgerError::UnknownTransactionType("ADJUST".to_string()))
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn movement_strategy() -> impl Strategy<Value = (TransactionType, i32)> {
        (
            prop_oneof![Just(TransactionType::In), Just(TransactionType::Out)],
            1..500i32,
        )
    }

    proptest! {
        /// Applying any sequence of movements, skipping rejected ones,
        /// keeps the balance non-negative and equal to the ledger of
        /// accepted entries
        #[test]
        fn prop_balance_matches_accepted_ledger(
            movements in prop::collection::vec(movement_strategy(), 0..60)
        ) {
            let mut balance = 0i32;
            let mut accepted = Vec::new();

            for (kind, quantity) in movements {
                match apply_movement(balance, kind, quantity) {
                    Ok(next) => {
                        balance = next;
                        accepted.push((kind, quantity));
                    }
                    Err(LedgerError::InsufficientStock { available, requested }) => {
                        prop_assert_eq!(kind, TransactionType::Out);
                        prop_assert_eq!(available, balance);
                        prop_assert!(requested > available);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
                prop_assert!(balance >= 0);
            }

            prop_assert_eq!(ledger_balance(accepted), balance as i64);
        }

        /// OUT either succeeds exactly or fails; it never clamps to zero
        #[test]
        fn prop_out_never_clamps(current in 0..1000i32, quantity in 1..2000i32) {
            match apply_movement(current, TransactionType::Out, quantity) {
                Ok(next) => prop_assert_eq!(next, current - quantity),
                Err(_) => prop_assert!(quantity > current),
            }
        }

        /// A reversal undoes the movement it reverses
        #[test]
        fn prop_reverse_undoes_apply(
            current in 0..10_000i32,
            (kind, quantity) in movement_strategy()
        ) {
            if let Ok(next) = apply_movement(current, kind, quantity) {
                prop_assert_eq!(reverse_movement(next, kind, quantity), Ok(current));
            }
        }

        /// The correction entry always lands on the target
        #[test]
        fn prop_correction_reaches_target(current in 0..10_000i32, target in 0..10_000i32) {
            match correction_for(current, target).unwrap() {
                None => prop_assert_eq!(current, target),
                Some((kind, quantity)) => {
                    prop_assert!(quantity >= 1);
                    prop_assert_eq!(apply_movement(current, kind, quantity), Ok(target));
                }
            }
        }

        /// Negative targets are never accepted
        #[test]
        fn prop_negative_target_rejected(current in 0..1000i32, target in i32::MIN..0) {
            prop_assert!(correction_for(current, target).is_err());
        }
    }
}

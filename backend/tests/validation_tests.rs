//! Input validation and pagination tests
//!
//! Catalogue field rules, account rules, pagination arithmetic and
//! report date ranges.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    validate_email, validate_name, validate_password, validate_phone, validate_price,
    validate_pricing, validate_quantity, validate_sku, validate_stock_level, validate_username,
    DateRange, PaginatedResponse, Pagination, PaginationMeta, UserRole, CATEGORY_NAME_MAX_LEN,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_sku_rules() {
        assert!(validate_sku("ELK001").is_ok());
        assert!(validate_sku("PKN-2024_01").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("ELK 001").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("Elektronik", CATEGORY_NAME_MAX_LEN).is_ok());
        assert!(validate_name("   ", CATEGORY_NAME_MAX_LEN).is_err());
        assert!(validate_name(&"x".repeat(101), CATEGORY_NAME_MAX_LEN).is_err());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("+62 21-555-1234").is_ok());
        assert!(validate_phone("(021) 5551234").is_ok());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_price_rules() {
        assert!(validate_price(dec("0.01")).is_ok());
        assert!(validate_price(dec("99999999.99")).is_ok());
        assert!(validate_price(dec("0.00")).is_err());
        assert!(validate_price(dec("-5.00")).is_err());
        assert!(validate_price(dec("1.005")).is_err());
        assert!(validate_price(dec("100000000.00")).is_err());
        // Trailing zeros beyond two places are fine
        assert!(validate_price(dec("12.5000")).is_ok());
    }

    #[test]
    fn test_selling_not_below_purchase() {
        assert!(validate_pricing(dec("100.00"), dec("100.00")).is_ok());
        assert!(validate_pricing(dec("100.00"), dec("99.99")).is_err());
    }

    #[test]
    fn test_stock_and_quantity_rules() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_account_rules() {
        assert!(validate_username("gudang.admin").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_password("admin123").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_email("staff@tokoku.co.id").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_only_superusers_delete_transactions() {
        assert!(UserRole::from_superuser_flag(true).can_delete_transactions());
        assert!(!UserRole::from_superuser_flag(false).can_delete_transactions());
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let p = Pagination::from_query(None, None, 100);
        assert_eq!((p.page, p.per_page), (1, 20));
        assert_eq!(p.offset(), 0);

        let p = Pagination::from_query(Some(0), Some(500), 100);
        assert_eq!((p.page, p.per_page), (1, 100));

        let p = Pagination::from_query(Some(3), Some(25), 100);
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_pagination_meta() {
        let response = PaginatedResponse::new(vec![1, 2, 3], Pagination::from_query(Some(2), Some(3), 100), 7);
        assert_eq!(
            response.pagination,
            PaginationMeta {
                page: 2,
                per_page: 3,
                total_items: 7,
                total_pages: 3,
            }
        );
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let range = DateRange::new(Some(start), Some(end)).unwrap();

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(DateRange::new(Some(end), Some(start)).is_err());
        assert!(DateRange::default().contains(start));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    proptest! {
        /// Generated SKUs of the allowed alphabet always validate
        #[test]
        fn prop_valid_skus(sku in "[A-Za-z0-9_-]{1,50}") {
            prop_assert!(validate_sku(&sku).is_ok());
        }

        /// Any whitespace inside a SKU is rejected
        #[test]
        fn prop_sku_with_space_rejected(left in "[A-Z]{1,10}", right in "[0-9]{1,10}") {
            let sku = format!("{} {}", left, right);
            prop_assert!(validate_sku(&sku).is_err());
        }

        /// Every item is on exactly one page
        #[test]
        fn prop_pages_cover_all_items(total in 0u64..10_000, per_page in 1u32..=100) {
            let meta = PaginationMeta::new(Pagination { page: 1, per_page }, total);
            let capacity = meta.total_pages as u64 * per_page as u64;
            prop_assert!(capacity >= total);
            prop_assert!(capacity < total + per_page as u64);
        }

        /// Whole-cent prices in range always validate
        #[test]
        fn prop_cent_prices_valid(cents in 1i64..=9_999_999_999i64) {
            prop_assert!(validate_price(Decimal::new(cents, 2)).is_ok());
        }
    }
}

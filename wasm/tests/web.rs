//! Browser-side checks of the exported functions, including the error
//! values handed back to JavaScript.
//!
//! Run with `wasm-pack test --headless --firefox wasm`.

#![cfg(target_arch = "wasm32")]

use inventory_wasm::{
    calculate_profit_margin, calculate_stock_value, preview_stock_movement, product_metrics,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const HUGE_PRICE: &str = "1000000000000000000000000000";

#[wasm_bindgen_test]
fn margin_is_returned_as_decimal_string() {
    assert_eq!(calculate_profit_margin("3.00", "4.00").unwrap(), "33.33");
}

#[wasm_bindgen_test]
fn oversized_margin_is_an_error_not_a_trap() {
    let err = calculate_profit_margin("0.01", HUGE_PRICE).unwrap_err();
    assert_eq!(err.as_string().as_deref(), Some("Result is too large to calculate"));
}

#[wasm_bindgen_test]
fn oversized_stock_value_is_an_error_not_a_trap() {
    assert!(calculate_stock_value(i32::MAX, HUGE_PRICE).is_err());
    assert!(product_metrics(i32::MAX, 10, HUGE_PRICE, HUGE_PRICE).is_err());
}

#[wasm_bindgen_test]
fn garbage_price_is_reported() {
    let err = calculate_stock_value(3, "tiga ribu").unwrap_err();
    assert!(err.as_string().unwrap_or_default().contains("Invalid price"));
}

#[wasm_bindgen_test]
fn shipping_more_than_on_hand_is_rejected() {
    let err = preview_stock_movement(7, "OUT", 10).unwrap_err();
    assert_eq!(
        err.as_string().as_deref(),
        Some("insufficient stock: available 7, requested 10")
    );
}

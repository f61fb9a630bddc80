//! WebAssembly module for InventoryPro
//!
//! Runs the shared stock rules in the browser so forms can preview
//! margins, low stock flags and ledger movements before submitting.
//! Money crosses the boundary as decimal strings, the same form the API uses.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::{
    apply_movement, checked_profit_margin, checked_stock_value, is_low_stock, restock_quantity,
    validate_price, validate_pricing, validate_sku, ProductMetrics, TransactionType,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str(concat!(
        "inventory-wasm ",
        env!("CARGO_PKG_VERSION"),
        " ready"
    )));
}

fn parse_price(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("Invalid price '{}': {}", value, e))
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

const OUT_OF_RANGE: &str = "Result is too large to calculate";

fn margin_of(purchase_price: &str, selling_price: &str) -> Result<Decimal, String> {
    checked_profit_margin(parse_price(purchase_price)?, parse_price(selling_price)?)
        .ok_or_else(|| OUT_OF_RANGE.to_string())
}

fn value_of(stock_quantity: i32, purchase_price: &str) -> Result<Decimal, String> {
    checked_stock_value(stock_quantity, parse_price(purchase_price)?)
        .ok_or_else(|| OUT_OF_RANGE.to_string())
}

fn metrics_of(
    stock_quantity: i32,
    minimum_stock: i32,
    purchase_price: &str,
    selling_price: &str,
) -> Result<ProductMetrics, String> {
    ProductMetrics::try_compute(
        stock_quantity,
        minimum_stock,
        parse_price(purchase_price)?,
        parse_price(selling_price)?,
    )
    .ok_or_else(|| OUT_OF_RANGE.to_string())
}

/// Profit margin in percent, as a decimal string
#[wasm_bindgen]
pub fn calculate_profit_margin(purchase_price: &str, selling_price: &str) -> Result<String, JsValue> {
    margin_of(purchase_price, selling_price)
        .map(|margin| margin.to_string())
        .map_err(to_js)
}

/// Stock value at purchase price, as a decimal string
#[wasm_bindgen]
pub fn calculate_stock_value(stock_quantity: i32, purchase_price: &str) -> Result<String, JsValue> {
    value_of(stock_quantity, purchase_price)
        .map(|value| value.to_string())
        .map_err(to_js)
}

/// True once stock has reached the minimum level
#[wasm_bindgen]
pub fn check_low_stock(stock_quantity: i32, minimum_stock: i32) -> bool {
    is_low_stock(stock_quantity, minimum_stock)
}

/// Units to order to get back to the minimum level
#[wasm_bindgen]
pub fn suggest_restock(stock_quantity: i32, minimum_stock: i32) -> i32 {
    restock_quantity(stock_quantity, minimum_stock)
}

/// All product metrics as JSON
#[wasm_bindgen]
pub fn product_metrics(
    stock_quantity: i32,
    minimum_stock: i32,
    purchase_price: &str,
    selling_price: &str,
) -> Result<String, JsValue> {
    let metrics = metrics_of(stock_quantity, minimum_stock, purchase_price, selling_price)
        .map_err(to_js)?;
    serde_json::to_string(&metrics).map_err(|e| to_js(e.to_string()))
}

/// Balance after a movement, or the reason it would be rejected
#[wasm_bindgen]
pub fn preview_stock_movement(
    current_stock: i32,
    transaction_type: &str,
    quantity: i32,
) -> Result<i32, JsValue> {
    let transaction_type =
        TransactionType::from_str(transaction_type).map_err(|e| to_js(e.to_string()))?;
    apply_movement(current_stock, transaction_type, quantity).map_err(|e| to_js(e.to_string()))
}

/// Validation message for a SKU, or undefined when valid
#[wasm_bindgen]
pub fn check_sku(sku: &str) -> Option<String> {
    validate_sku(sku.trim()).err().map(str::to_string)
}

/// Validation message for a price pair, or undefined when valid
#[wasm_bindgen]
pub fn check_prices(purchase_price: &str, selling_price: &str) -> Option<String> {
    let (purchase, selling) = match (
        Decimal::from_str(purchase_price.trim()),
        Decimal::from_str(selling_price.trim()),
    ) {
        (Ok(p), Ok(s)) => (p, s),
        _ => return Some("Prices must be decimal numbers".to_string()),
    };

    validate_price(purchase)
        .and_then(|_| validate_price(selling))
        .and_then(|_| validate_pricing(purchase, selling))
        .err()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_margin() {
        let margin = calculate_profit_margin("100.00", "125.00").unwrap();
        assert_eq!(Decimal::from_str(&margin).unwrap(), Decimal::from(25));
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(calculate_stock_value(3, "85000.00").unwrap(), "255000.00");
    }

    #[test]
    fn test_low_stock_and_restock() {
        assert!(check_low_stock(10, 10));
        assert!(!check_low_stock(11, 10));
        assert_eq!(suggest_restock(4, 10), 6);
        assert_eq!(suggest_restock(15, 10), 0);
    }

    #[test]
    fn test_preview_stock_movement() {
        assert_eq!(preview_stock_movement(10, "IN", 5).unwrap(), 15);
        assert_eq!(preview_stock_movement(10, "out", 10).unwrap(), 0);
    }

    #[test]
    fn test_check_sku() {
        assert!(check_sku("ELK-001").is_none());
        assert!(check_sku("").is_some());
    }

    #[test]
    fn test_check_prices() {
        assert!(check_prices("100.00", "120.00").is_none());
        assert!(check_prices("120.00", "100.00").is_some());
        assert!(check_prices("abc", "100.00").is_some());
    }

    #[test]
    fn test_oversized_prices_are_errors() {
        let huge = "1000000000000000000000000000";
        assert_eq!(margin_of("0.01", huge), Err(OUT_OF_RANGE.to_string()));
        assert_eq!(value_of(i32::MAX, huge), Err(OUT_OF_RANGE.to_string()));
        assert!(metrics_of(i32::MAX, 10, huge, huge).is_err());
    }

    #[test]
    fn test_unparseable_price_is_an_error() {
        assert!(margin_of("abc", "10.00").unwrap_err().contains("Invalid price 'abc'"));
    }

    #[test]
    fn test_product_metrics_json() {
        let json = product_metrics(5, 10, "100.00", "150.00").unwrap();
        assert!(json.contains("\"is_low_stock\":true"));
    }
}

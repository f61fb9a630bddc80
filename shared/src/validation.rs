//! Validation utilities for the inventory platform

use rust_decimal::Decimal;

// ============================================================================
// Catalog Validations
// ============================================================================

pub const SKU_MAX_LEN: usize = 50;
pub const CATEGORY_NAME_MAX_LEN: usize = 100;
pub const SUPPLIER_NAME_MAX_LEN: usize = 200;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
pub const PHONE_MAX_LEN: usize = 20;

/// Smallest accepted price
pub fn minimum_price() -> Decimal {
    Decimal::new(1, 2)
}

/// Prices are stored as NUMERIC(10, 2)
pub fn maximum_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Validate SKU format (1-50 letters, digits, '-' or '_')
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU is required");
    }
    if sku.chars().count() > SKU_MAX_LEN {
        return Err("SKU must be at most 50 characters");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("SKU may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}

/// Validate a display name against a maximum length
pub fn validate_name(name: &str, max_len: usize) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    if name.chars().count() > max_len {
        return Err("Name is too long");
    }
    Ok(())
}

/// Validate a phone number (digits with optional '+', '-', spaces, parentheses)
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if phone.chars().count() > PHONE_MAX_LEN {
        return Err("Phone must be at most 20 characters");
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err("Phone may only contain digits, '+', '-', spaces and parentheses");
    }
    Ok(())
}

/// Validate a price: at least 0.01, at most two decimal places, fits NUMERIC(10, 2)
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < minimum_price() {
        return Err("Price must be at least 0.01");
    }
    if price.normalize().scale() > 2 {
        return Err("Price may have at most two decimal places");
    }
    if price > maximum_price() {
        return Err("Price is too large");
    }
    Ok(())
}

/// Selling below purchase price is rejected
pub fn validate_pricing(purchase_price: Decimal, selling_price: Decimal) -> Result<(), &'static str> {
    if selling_price < purchase_price {
        return Err("Selling price is lower than purchase price");
    }
    Ok(())
}

/// Validate a stock level (stock quantity or minimum stock)
pub fn validate_stock_level(level: i32) -> Result<(), &'static str> {
    if level < 0 {
        return Err("Stock level cannot be negative");
    }
    Ok(())
}

/// Validate a transaction quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate username (3-150 letters, digits, '.', '_', '-', '@', '+')
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if len < 3 {
        return Err("Username must be at least 3 characters");
    }
    if len > 150 {
        return Err("Username must be at most 150 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+'))
    {
        return Err("Username contains invalid characters");
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_valid_skus() {
        assert!(validate_sku("ELK001").is_ok());
        assert!(validate_sku("prd-01_a").is_ok());
        assert!(validate_sku(&"A".repeat(50)).is_ok());
    }

    #[test]
    fn test_invalid_skus() {
        assert!(validate_sku("").is_err());
        assert!(validate_sku("ELK 001").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_prices() {
        assert!(validate_price(dec("0.01")).is_ok());
        assert!(validate_price(dec("15000000.00")).is_ok());
        assert!(validate_price(dec("0.00")).is_err());
        assert!(validate_price(dec("1.005")).is_err());
        assert!(validate_price(dec("100000000")).is_err());
    }

    #[test]
    fn test_pricing_rule() {
        assert!(validate_pricing(dec("10"), dec("10")).is_ok());
        assert!(validate_pricing(dec("10"), dec("9.99")).is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("021-1234567").is_ok());
        assert!(validate_phone("+62 812 3456 7890").is_ok());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_names() {
        assert!(validate_name("Elektronik", CATEGORY_NAME_MAX_LEN).is_ok());
        assert!(validate_name("   ", CATEGORY_NAME_MAX_LEN).is_err());
        assert!(validate_name(&"x".repeat(101), CATEGORY_NAME_MAX_LEN).is_err());
    }

    #[test]
    fn test_accounts() {
        assert!(validate_username("staff1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_email("admin@inventorypro.com").is_ok());
        assert!(validate_email("admin").is_err());
        assert!(validate_password("admin123").is_ok());
        assert!(validate_password("short").is_err());
    }
}

// Field-level checks shared by the request types. Each returns the first
// violation found, carrying the offending field name.

use rust_decimal::Decimal;

use super::error::{CatalogError, CatalogResult};

pub fn required(field: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(field, "is required"));
    }
    Ok(())
}

pub fn length(field: &str, value: &str, min: usize, max: usize) -> CatalogResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(CatalogError::validation(
            field,
            format!("must be between {} and {} characters", min, max),
        ));
    }
    Ok(())
}

pub fn max_length(field: &str, value: &str, max: usize) -> CatalogResult<()> {
    if value.chars().count() > max {
        return Err(CatalogError::validation(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

pub fn longitude(field: &str, value: f64) -> CatalogResult<()> {
    if !value.is_finite() || !(-180.0..=180.0).contains(&value) {
        return Err(CatalogError::validation(field, "must be within [-180, 180]"));
    }
    Ok(())
}

pub fn latitude(field: &str, value: f64) -> CatalogResult<()> {
    if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
        return Err(CatalogError::validation(field, "must be within [-90, 90]"));
    }
    Ok(())
}

pub fn price_amount(field: &str, value: Decimal) -> CatalogResult<()> {
    if value <= Decimal::ZERO {
        return Err(CatalogError::validation(field, "must be greater than zero"));
    }
    // NUMERIC(12, 2)
    if value > Decimal::new(999_999_999_999, 2) {
        return Err(CatalogError::validation(field, "must be at most 9999999999.99"));
    }
    if value.normalize().scale() > 2 {
        return Err(CatalogError::validation(field, "must have at most two decimal places"));
    }
    Ok(())
}

pub fn currency_code(field: &str, value: &str) -> CatalogResult<()> {
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(CatalogError::validation(
            field,
            "must be a three letter ISO 4217 code",
        ));
    }
    Ok(())
}

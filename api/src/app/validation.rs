//! Input validation shared by the services
//!
//! Each helper returns the normalised value or a `BadRequest`.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::entities::MAX_AMOUNT;
use crate::error::AppError;

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"))
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9.\-]{1,12}$").expect("valid symbol regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    })
}

/// Trimmed, non-empty text of at most `max` characters
pub fn text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(AppError::BadRequest(format!(
            "{} must be between 1 and {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Optional free text; blank becomes `None`
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// ISO 4217 style code, upper-cased
pub fn currency(value: &str) -> Result<String, AppError> {
    let code = value.trim().to_uppercase();
    if !currency_re().is_match(&code) {
        return Err(AppError::BadRequest(format!(
            "Invalid currency code: {}",
            value
        )));
    }
    Ok(code)
}

/// Ticker symbol, upper-cased
pub fn symbol(value: &str) -> Result<String, AppError> {
    let symbol = value.trim().to_uppercase();
    if !symbol_re().is_match(&symbol) {
        return Err(AppError::BadRequest(format!("Invalid symbol: {}", value)));
    }
    Ok(symbol)
}

/// Lower-cased email address
pub fn email(value: &str) -> Result<String, AppError> {
    let email = value.trim().to_lowercase();
    if email.len() > 255 || !email_re().is_match(&email) {
        return Err(AppError::BadRequest(format!("Invalid email: {}", value)));
    }
    Ok(email)
}

fn too_large(field: &str) -> AppError {
    AppError::BadRequest(format!(
        "{} must not exceed {} in magnitude",
        field, MAX_AMOUNT
    ))
}

/// Strictly positive amount in minor units, at most `MAX_AMOUNT`
pub fn positive_amount(field: &str, value: i64) -> Result<i64, AppError> {
    if value <= 0 {
        return Err(AppError::BadRequest(format!("{} must be positive", field)));
    }
    if value > MAX_AMOUNT {
        return Err(too_large(field));
    }
    Ok(value)
}

pub fn non_negative_amount(field: &str, value: i64) -> Result<i64, AppError> {
    if value < 0 {
        return Err(AppError::BadRequest(format!(
            "{} must not be negative",
            field
        )));
    }
    if value > MAX_AMOUNT {
        return Err(too_large(field));
    }
    Ok(value)
}

/// Amount of either sign, such as an opening balance
pub fn signed_amount(field: &str, value: i64) -> Result<i64, AppError> {
    if !(-MAX_AMOUNT..=MAX_AMOUNT).contains(&value) {
        return Err(too_large(field));
    }
    Ok(value)
}

pub fn quantity(value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(
            "quantity must be a positive number".to_string(),
        ));
    }
    Ok(value)
}

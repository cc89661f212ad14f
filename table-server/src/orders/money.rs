//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal` internally and converts to `f64` only
//! at the point of storage/serialization, rounded to 2 decimal places
//! half-up. The intermediate subtotal is never pre-rounded before tax and
//! service charge are derived from it.

use rust_decimal::prelude::*;
use shared::models::{OrderItem, Restaurant};
use shared::{AppError, AppResult};

/// Minor-unit precision for stored monetary values
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i32 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
/// half-up
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Validate a snapshotted price and a requested quantity before they enter
/// the aggregate
pub fn validate_line(unit_price: f64, quantity: i32) -> AppResult<()> {
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(AppError::validation(format!(
            "unit price must be a non-negative finite number, got {}",
            unit_price
        )));
    }
    if unit_price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "unit price exceeds maximum allowed ({})",
            MAX_PRICE
        )));
    }
    if quantity < 1 {
        return Err(AppError::validation(format!(
            "quantity must be at least 1, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({})",
            MAX_QUANTITY
        )));
    }
    Ok(())
}

/// Line subtotal: quantity × unit price, rounded at storage
pub fn line_subtotal(unit_price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Recomputed money fields of the order row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub service_charge: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
}

impl Totals {
    pub const ZERO: Totals = Totals {
        subtotal: 0.0,
        tax_amount: 0.0,
        service_charge: 0.0,
        discount_amount: 0.0,
        total_amount: 0.0,
    };
}

/// Recompute all money fields from the item collection
///
/// subtotal = Σ quantity × unit_price, accumulated unrounded; tax and
/// service charge are percentages of the unrounded subtotal; every stored
/// field is rounded half-up to 2 decimals; total is the sum of the
/// already-stored (rounded) components so the money identity holds exactly.
pub fn compute_totals(items: &[OrderItem], restaurant: &Restaurant, discount: f64) -> Totals {
    let subtotal: Decimal = items
        .iter()
        .map(|i| to_decimal(i.unit_price) * Decimal::from(i.quantity))
        .sum();

    let tax = subtotal * to_decimal(restaurant.tax_rate) / Decimal::ONE_HUNDRED;
    let service = subtotal * to_decimal(restaurant.service_charge_rate) / Decimal::ONE_HUNDRED;

    let subtotal_f = to_f64(subtotal);
    let tax_f = to_f64(tax);
    let service_f = to_f64(service);
    let discount_f = to_f64(to_decimal(discount));

    let total = to_decimal(subtotal_f) + to_decimal(tax_f) + to_decimal(service_f)
        - to_decimal(discount_f);

    Totals {
        subtotal: subtotal_f,
        tax_amount: tax_f,
        service_charge: service_f,
        discount_amount: discount_f,
        total_amount: to_f64(total),
    }
}

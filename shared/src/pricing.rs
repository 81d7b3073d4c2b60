//! Pricing valuator using rust_decimal for precision
//!
//! All monetary math runs through `Decimal` internally, then converts
//! back to `f64` for storage/serialization. Weight-based lines price as
//! `price_per_unit * selected_weight`; unit lines as `price * quantity`.

use crate::models::Product;
use crate::order::CartLineInput;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Weight adjustments move in 0.5 steps
pub const WEIGHT_STEP: f64 = 0.5;
/// Absolute weight floor when a product declares no minimum
pub const MIN_WEIGHT: f64 = 0.5;

/// Maximum allowed price per line
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 9999;

/// Pricing/validation failures
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("weight {weight} is below minimum {min} for {product}")]
    WeightBelowMinimum {
        product: String,
        weight: f64,
        min: f64,
    },

    #[error("weight {weight} is above maximum {max} for {product}")]
    WeightAboveMaximum {
        product: String,
        weight: f64,
        max: f64,
    },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
pub fn require_finite(value: f64, field_name: &str) -> Result<(), PricingError> {
    if !value.is_finite() {
        return Err(PricingError::InvalidAmount(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Effective weight bounds for a product: declared min/max with the
/// absolute floor applied when no minimum is declared.
pub fn weight_bounds(product: &Product) -> (f64, Option<f64>) {
    let min = product.min_weight.unwrap_or(MIN_WEIGHT).max(MIN_WEIGHT);
    (min, product.max_weight)
}

/// Clamp a weight into a product's bounds. Used for increment/decrement
/// adjustments, which saturate at the bounds instead of failing.
pub fn clamp_weight(product: &Product, weight: f64) -> f64 {
    let (min, max) = weight_bounds(product);
    let mut w = weight.max(min);
    if let Some(max) = max {
        w = w.min(max);
    }
    w
}

/// Validate an explicitly entered weight against a product's bounds.
/// Unlike [`clamp_weight`], out-of-bounds values are rejected with an
/// error naming the violated bound.
pub fn validate_weight(product: &Product, weight: f64) -> Result<(), PricingError> {
    require_finite(weight, "weight")?;
    let (min, max) = weight_bounds(product);
    if weight < min {
        return Err(PricingError::WeightBelowMinimum {
            product: product.name.clone(),
            weight,
            min,
        });
    }
    if let Some(max) = max
        && weight > max
    {
        return Err(PricingError::WeightAboveMaximum {
            product: product.name.clone(),
            weight,
            max,
        });
    }
    Ok(())
}

/// Line price for a weight-based product: rate * weight, where rate is
/// `price_per_unit` with the flat `price` as fallback.
pub fn weight_line_price(product: &Product, weight: f64) -> f64 {
    let rate = to_decimal(product.effective_unit_rate());
    to_f64(rate * to_decimal(weight))
}

/// Line price for a unit product: price * quantity.
pub fn unit_line_price(unit_price: f64, quantity: i32) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Line price for a cart line (chooses weight or unit pricing).
pub fn line_price(unit_price: f64, quantity: i32, selected_weight: Option<f64>) -> f64 {
    match selected_weight {
        Some(weight) => to_f64(to_decimal(unit_price) * to_decimal(weight)),
        None => unit_line_price(unit_price, quantity),
    }
}

/// Validate a CartLineInput before processing
pub fn validate_cart_line(line: &CartLineInput) -> Result<(), PricingError> {
    require_finite(line.unit_price, "unit_price")?;
    if line.unit_price < 0.0 {
        return Err(PricingError::InvalidAmount(format!(
            "unit_price must be non-negative, got {}",
            line.unit_price
        )));
    }
    require_finite(line.price, "price")?;
    if line.price < 0.0 {
        return Err(PricingError::InvalidAmount(format!(
            "price must be non-negative, got {}",
            line.price
        )));
    }
    if line.price > MAX_PRICE {
        return Err(PricingError::InvalidAmount(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, line.price
        )));
    }

    match line.selected_weight {
        Some(weight) => {
            require_finite(weight, "selected_weight")?;
            if weight < MIN_WEIGHT {
                return Err(PricingError::WeightBelowMinimum {
                    product: line.name.clone(),
                    weight,
                    min: MIN_WEIGHT,
                });
            }
            // Weight-based lines carry a fixed quantity of one
            if line.quantity != 1 {
                return Err(PricingError::InvalidQuantity(format!(
                    "weight-based lines have quantity 1, got {}",
                    line.quantity
                )));
            }
        }
        None => {
            if line.quantity <= 0 {
                return Err(PricingError::InvalidQuantity(format!(
                    "quantity must be positive, got {}",
                    line.quantity
                )));
            }
            if line.quantity > MAX_QUANTITY {
                return Err(PricingError::InvalidQuantity(format!(
                    "quantity exceeds maximum allowed ({}), got {}",
                    MAX_QUANTITY, line.quantity
                )));
            }
        }
    }

    Ok(())
}

/// Sum line prices with precise arithmetic
pub fn sum_lines(prices: impl IntoIterator<Item = f64>) -> f64 {
    let total: Decimal = prices.into_iter().map(to_decimal).sum();
    to_f64(total)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_product(min: Option<f64>, max: Option<f64>) -> Product {
        Product {
            id: "prod-salmon".to_string(),
            name: "Salmon Fillet".to_string(),
            category: "Seafood".to_string(),
            price: 12.99,
            weight_based: true,
            price_per_unit: Some(9.5),
            weight_unit: Some("lb".to_string()),
            min_weight: min,
            max_weight: max,
            is_active: true,
        }
    }

    fn unit_line(quantity: i32) -> CartLineInput {
        CartLineInput {
            product_id: "prod-milk".to_string(),
            name: "Whole Milk".to_string(),
            quantity,
            selected_weight: None,
            unit_price: 3.49,
            price: 3.49 * quantity as f64,
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_unit_line_price() {
        assert_eq!(unit_line_price(10.99, 3), 32.97);
        assert_eq!(unit_line_price(0.01, 100), 1.0);
    }

    #[test]
    fn test_weight_line_price_uses_per_unit_rate() {
        let product = weight_product(None, None);
        // 9.5 * 1.5 = 14.25
        assert_eq!(weight_line_price(&product, 1.5), 14.25);
    }

    #[test]
    fn test_weight_line_price_falls_back_to_flat_price() {
        let mut product = weight_product(None, None);
        product.price_per_unit = None;
        // 12.99 * 2.0 = 25.98
        assert_eq!(weight_line_price(&product, 2.0), 25.98);
    }

    #[test]
    fn test_clamp_weight_saturates_at_bounds() {
        let product = weight_product(Some(1.0), Some(5.0));
        assert_eq!(clamp_weight(&product, 0.5), 1.0);
        assert_eq!(clamp_weight(&product, 5.5), 5.0);
        assert_eq!(clamp_weight(&product, 2.5), 2.5);
    }

    #[test]
    fn test_clamp_weight_applies_absolute_floor() {
        let product = weight_product(None, None);
        assert_eq!(clamp_weight(&product, 0.0), MIN_WEIGHT);
    }

    #[test]
    fn test_validate_weight_names_violated_bound() {
        let product = weight_product(Some(1.0), Some(5.0));

        match validate_weight(&product, 0.5) {
            Err(PricingError::WeightBelowMinimum { min, .. }) => assert_eq!(min, 1.0),
            other => panic!("expected WeightBelowMinimum, got {:?}", other),
        }

        match validate_weight(&product, 6.0) {
            Err(PricingError::WeightAboveMaximum { max, .. }) => assert_eq!(max, 5.0),
            other => panic!("expected WeightAboveMaximum, got {:?}", other),
        }

        assert!(validate_weight(&product, 3.0).is_ok());
    }

    #[test]
    fn test_validate_weight_rejects_nan() {
        let product = weight_product(None, None);
        assert!(validate_weight(&product, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_cart_line_unit() {
        assert!(validate_cart_line(&unit_line(3)).is_ok());
        assert!(validate_cart_line(&unit_line(0)).is_err());
        assert!(validate_cart_line(&unit_line(-2)).is_err());
        assert!(validate_cart_line(&unit_line(MAX_QUANTITY + 1)).is_err());
    }

    #[test]
    fn test_validate_cart_line_weight_requires_quantity_one() {
        let mut line = unit_line(2);
        line.selected_weight = Some(1.5);
        assert!(matches!(
            validate_cart_line(&line),
            Err(PricingError::InvalidQuantity(_))
        ));

        line.quantity = 1;
        assert!(validate_cart_line(&line).is_ok());
    }

    #[test]
    fn test_require_finite_names_the_field() {
        assert!(require_finite(4.99, "delivery_fee").is_ok());

        match require_finite(f64::NAN, "delivery_fee") {
            Err(PricingError::InvalidAmount(msg)) => {
                assert!(msg.contains("delivery_fee"));
                assert!(msg.contains("NaN"));
            }
            other => panic!("expected InvalidAmount, got {:?}", other),
        }
        assert!(require_finite(f64::INFINITY, "tip_amount").is_err());
    }

    #[test]
    fn test_validate_cart_line_rejects_nonfinite_price() {
        let mut line = unit_line(1);
        line.unit_price = f64::NAN;
        assert!(validate_cart_line(&line).is_err());

        let mut line = unit_line(1);
        line.price = f64::INFINITY;
        assert!(validate_cart_line(&line).is_err());
    }

    #[test]
    fn test_sum_lines_accumulation_precision() {
        // 1000 lines at 0.01
        let total = sum_lines(std::iter::repeat_n(0.01, 1000));
        assert_eq!(total, 10.0);
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));
    }

    #[test]
    fn test_rounding_half_up() {
        let value = Decimal::new(5, 3); // 0.005
        assert_eq!(to_f64(value), 0.01);

        let value2 = Decimal::new(4, 3); // 0.004
        assert_eq!(to_f64(value2), 0.0);
    }
}

//! Customer cart
//!
//! Lines merge per product: unit products add quantities, weight-based
//! products grow a single line's weight. Stepper adjustments clamp to
//! the product's weight bounds; typing a weight in rejects values
//! outside them, naming the violated bound.

use shared::models::Product;
use shared::order::types::CartLineInput;
use shared::pricing::{self, clamp_weight, line_price, validate_weight, MAX_QUANTITY, WEIGHT_STEP};

use crate::error::{ClientError, ClientResult};

/// One cart line, bound to its catalog product
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
    pub selected_weight: Option<f64>,
}

impl CartLine {
    fn unit_rate(&self) -> f64 {
        if self.selected_weight.is_some() {
            self.product.effective_unit_rate()
        } else {
            self.product.price
        }
    }

    /// Current line price
    pub fn price(&self) -> f64 {
        line_price(self.unit_rate(), self.quantity, self.selected_weight)
    }

    fn to_input(&self) -> CartLineInput {
        CartLineInput {
            product_id: self.product.id.clone(),
            name: self.product.name.clone(),
            quantity: self.quantity,
            selected_weight: self.selected_weight,
            unit_price: self.unit_rate(),
            price: self.price(),
        }
    }
}

/// Customer cart
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product.id == product_id)
    }

    /// Add a unit product; an existing line for the same product grows
    /// its quantity instead of duplicating.
    pub fn add_unit(&mut self, product: &Product, quantity: i32) -> ClientResult<()> {
        if quantity <= 0 {
            return Err(ClientError::Validation(format!(
                "Quantity must be positive: {quantity}"
            )));
        }
        if let Some(line) = self.find_mut(&product.id) {
            line.quantity = (line.quantity + quantity).min(MAX_QUANTITY);
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: quantity.min(MAX_QUANTITY),
                selected_weight: None,
            });
        }
        Ok(())
    }

    /// Add weight of a weight-based product; an existing line grows its
    /// weight on the same line. The result clamps to the product's
    /// bounds like any stepper adjustment.
    pub fn add_weight(&mut self, product: &Product, weight: f64) -> ClientResult<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ClientError::Validation(format!(
                "Weight must be positive: {weight}"
            )));
        }
        if let Some(line) = self.find_mut(&product.id) {
            let current = line.selected_weight.unwrap_or(0.0);
            line.selected_weight = Some(clamp_weight(product, current + weight));
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
                selected_weight: Some(clamp_weight(product, weight)),
            });
        }
        Ok(())
    }

    /// Stepper +1 on a unit line
    pub fn increment(&mut self, product_id: &str) -> ClientResult<()> {
        let line = self
            .find_mut(product_id)
            .ok_or_else(|| ClientError::NotFound(product_id.to_string()))?;
        line.quantity = (line.quantity + 1).min(MAX_QUANTITY);
        Ok(())
    }

    /// Stepper -1 on a unit line; reaching zero removes the line
    pub fn decrement(&mut self, product_id: &str) -> ClientResult<()> {
        let line = self
            .find_mut(product_id)
            .ok_or_else(|| ClientError::NotFound(product_id.to_string()))?;
        line.quantity -= 1;
        if line.quantity <= 0 {
            self.remove(product_id);
        }
        Ok(())
    }

    /// Stepper weight adjustment; saturates at the product's bounds
    pub fn step_weight(&mut self, product_id: &str, up: bool) -> ClientResult<()> {
        let line = self
            .find_mut(product_id)
            .ok_or_else(|| ClientError::NotFound(product_id.to_string()))?;
        let current = line
            .selected_weight
            .ok_or_else(|| ClientError::Validation("Not a weight-based line".to_string()))?;
        let step = if up { WEIGHT_STEP } else { -WEIGHT_STEP };
        let product = line.product.clone();
        line.selected_weight = Some(clamp_weight(&product, current + step));
        Ok(())
    }

    /// Explicit weight edit; values outside the product's bounds are
    /// rejected rather than clamped
    pub fn set_weight(&mut self, product_id: &str, weight: f64) -> ClientResult<()> {
        let line = self
            .find_mut(product_id)
            .ok_or_else(|| ClientError::NotFound(product_id.to_string()))?;
        if line.selected_weight.is_none() {
            return Err(ClientError::Validation("Not a weight-based line".to_string()));
        }
        let product = line.product.clone();
        validate_weight(&product, weight)
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        line.selected_weight = Some(weight);
        Ok(())
    }

    /// Explicit quantity edit
    pub fn set_quantity(&mut self, product_id: &str, quantity: i32) -> ClientResult<()> {
        if quantity < 1 || quantity > MAX_QUANTITY {
            return Err(ClientError::Validation(format!(
                "Quantity must be between 1 and {MAX_QUANTITY}: {quantity}"
            )));
        }
        let line = self
            .find_mut(product_id)
            .ok_or_else(|| ClientError::NotFound(product_id.to_string()))?;
        if line.selected_weight.is_some() {
            return Err(ClientError::Validation(
                "Weight-based lines have a fixed quantity of 1".to_string(),
            ));
        }
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Cart subtotal with money rounding
    pub fn subtotal(&self) -> f64 {
        pricing::sum_lines(self.lines.iter().map(|l| l.price()))
    }

    /// Snapshot the cart into checkout lines for PlaceOrder
    pub fn checkout_lines(&self) -> Vec<CartLineInput> {
        self.lines.iter().map(CartLine::to_input).collect()
    }
}

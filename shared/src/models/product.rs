//! Product Model

use serde::{Deserialize, Serialize};

/// Catalog product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Category reference (String ID)
    pub category: String,
    /// Price per discrete unit (also the flat-price fallback for
    /// weight-based products without `price_per_unit`)
    pub price: f64,
    /// Whether this product is priced by weight instead of by unit
    #[serde(default)]
    pub weight_based: bool,
    /// Price per weight unit (weight-based products only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<f64>,
    /// Display unit for weight-based products (e.g., "lb", "kg")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<String>,
    /// Minimum purchasable weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_weight: Option<f64>,
    /// Maximum purchasable weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,
    pub is_active: bool,
}

impl Product {
    /// Effective per-weight-unit price, falling back to the flat price
    /// when `price_per_unit` is absent.
    pub fn effective_unit_rate(&self) -> f64 {
        self.price_per_unit.unwrap_or(self.price)
    }
}

/// Lightweight product metadata injected into the order pipeline
/// (pricing fields only, no display/catalog baggage).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductMeta {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub weight_based: bool,
    pub price_per_unit: Option<f64>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
}

impl From<&Product> for ProductMeta {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            price: p.price,
            weight_based: p.weight_based,
            price_per_unit: p.price_per_unit,
            min_weight: p.min_weight,
            max_weight: p.max_weight,
        }
    }
}

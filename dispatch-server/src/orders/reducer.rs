//! Order snapshot utilities
//!
//! - `generate_item_id`: content-addressed item instance IDs
//! - `line_to_snapshot`: convert a checkout cart line to an item snapshot,
//!   repricing from catalog metadata when available
//! - `merge_lines`: collapse duplicate cart lines before conversion
//! - `replay_events`: rebuild a snapshot from the event stream
//!
//! Event application logic lives in the appliers module; replay simply
//! runs the same appliers over the stored stream.

use super::appliers::EventAction;
use super::traits::{EventApplier, OrderError};
use shared::models::ProductMeta;
use shared::order::{CartLineInput, OrderEvent, OrderItemSnapshot, OrderSnapshot};
use shared::pricing;

/// Generate a content-addressed item_id from a cart line
///
/// The item_id is a hash of the line's identity-defining properties:
/// product_id, unit price, and whether it is weight-based. Lines with
/// the same item_id merge rather than duplicating (quantities or
/// weights added together).
pub fn generate_item_id(product_id: &str, unit_price: f64, weight_based: bool) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(product_id.as_bytes());
    hasher.update(unit_price.to_be_bytes());
    hasher.update([weight_based as u8]);

    let result = hasher.finalize();
    hex::encode(&result[..16]) // First 16 bytes for a shorter ID
}

/// Collapse duplicate cart lines by product before conversion
///
/// Unit lines for the same product add quantities; weight-based lines
/// for the same product add weights onto a single line (quantity stays
/// fixed at 1).
pub fn merge_lines(lines: &[CartLineInput]) -> Vec<CartLineInput> {
    let mut merged: Vec<CartLineInput> = Vec::new();

    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => match (existing.selected_weight, line.selected_weight) {
                (Some(w0), Some(w1)) => {
                    existing.selected_weight = Some(w0 + w1);
                    existing.price =
                        pricing::line_price(existing.unit_price, 1, existing.selected_weight);
                }
                (None, None) => {
                    existing.quantity += line.quantity;
                    existing.price =
                        pricing::line_price(existing.unit_price, existing.quantity, None);
                }
                // Mixed unit/weight lines for one product stay separate
                _ => merged.push(line.clone()),
            },
            None => merged.push(line.clone()),
        }
    }

    merged
}

/// Convert a validated cart line to an order item snapshot
///
/// When catalog metadata is present the server reprices the line from
/// it (name, unit rate, weight bounds); otherwise the client's figures
/// are kept as-is after validation.
pub fn line_to_snapshot(
    line: &CartLineInput,
    meta: Option<&ProductMeta>,
) -> Result<OrderItemSnapshot, OrderError> {
    pricing::validate_cart_line(line)?;

    let (name, unit_price, weight_based) = match meta {
        Some(meta) => {
            let rate = if line.selected_weight.is_some() {
                meta.price_per_unit.unwrap_or(meta.price)
            } else {
                meta.price
            };
            (meta.name.clone(), rate, meta.weight_based)
        }
        None => (
            line.name.clone(),
            line.unit_price,
            line.selected_weight.is_some(),
        ),
    };

    // Catalog-declared weight bounds are enforced for known products
    if let (Some(weight), Some(meta)) = (line.selected_weight, meta) {
        let product = shared::models::Product {
            id: meta.id.clone(),
            name: meta.name.clone(),
            category: String::new(),
            price: meta.price,
            weight_based: meta.weight_based,
            price_per_unit: meta.price_per_unit,
            weight_unit: None,
            min_weight: meta.min_weight,
            max_weight: meta.max_weight,
            is_active: true,
        };
        pricing::validate_weight(&product, weight)?;
    }

    let price = pricing::line_price(unit_price, line.quantity, line.selected_weight);

    Ok(OrderItemSnapshot {
        item_id: generate_item_id(&line.product_id, unit_price, weight_based),
        product_id: line.product_id.clone(),
        name,
        weight_based,
        quantity: line.quantity,
        selected_weight: line.selected_weight,
        unit_price,
        price,
        status: Default::default(),
        found_quantity: None,
        note: None,
    })
}

/// Rebuild a snapshot by replaying the full event stream
///
/// Events must be sorted by sequence (storage returns them that way).
pub fn replay_events(order_id: &str, events: &[OrderEvent]) -> OrderSnapshot {
    let mut snapshot = OrderSnapshot::new(order_id.to_string());
    for event in events {
        let applier: EventAction = event.into();
        applier.apply(&mut snapshot, event);
    }
    snapshot
}

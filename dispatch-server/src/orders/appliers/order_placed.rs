//! OrderPlaced event applier
//!
//! Applies the OrderPlaced event to create initial snapshot state.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderPlaced {
            customer_id,
            items,
            subtotal,
            delivery_fee,
            tip_amount,
            estimated_payout,
            delivery_distance,
            estimated_minutes,
        } = &event.payload
        {
            // Set order_id from event (important for replay scenarios)
            snapshot.order_id = event.order_id.clone();
            snapshot.customer_id = customer_id.clone();
            snapshot.items = items.clone();
            snapshot.subtotal = *subtotal;
            snapshot.delivery_fee = *delivery_fee;
            snapshot.tip_amount = *tip_amount;
            snapshot.estimated_payout = *estimated_payout;
            snapshot.delivery_distance = *delivery_distance;
            snapshot.estimated_minutes = *estimated_minutes;
            snapshot.status = OrderStatus::Pending;
            snapshot.created_at = event.timestamp;
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

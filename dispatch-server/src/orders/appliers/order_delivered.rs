//! OrderDelivered event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderDelivered applier
pub struct OrderDeliveredApplier;

impl EventApplier for OrderDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderDelivered {
            actual_delivery_fee,
            ..
        } = &event.payload
        {
            snapshot.status = OrderStatus::Delivered;
            snapshot.actual_delivery_fee = *actual_delivery_fee;
            snapshot.delivered_at = Some(event.timestamp);
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

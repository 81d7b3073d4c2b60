//! OrderCancelled event applier
//!
//! Driver fields are left as they were at cancellation time, so the
//! record shows who held the order when it died.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled { .. } = &event.payload {
            snapshot.status = OrderStatus::Cancelled;
            snapshot.cancelled_at = Some(event.timestamp);
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

//! ShoppingCompleted event applier
//!
//! The tallies live in the event for the audit trail; the snapshot
//! derives them from item statuses, so only bookkeeping fields move.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// ShoppingCompleted applier
pub struct ShoppingCompletedApplier;

impl EventApplier for ShoppingCompletedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ShoppingCompleted { .. } = &event.payload {
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

//! ShoppingStarted event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// ShoppingStarted applier
pub struct ShoppingStartedApplier;

impl EventApplier for ShoppingStartedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ShoppingStarted {} = &event.payload {
            snapshot.shopping_started_at = Some(event.timestamp);
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

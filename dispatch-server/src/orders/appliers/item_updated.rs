//! Item status event applier
//!
//! Handles ItemFound, ItemSubstituted and ItemUnavailable events; all
//! three carry the same ItemStatusUpdated payload.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// Item status applier
pub struct ItemUpdatedApplier;

impl EventApplier for ItemUpdatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ItemStatusUpdated {
            item_id,
            status,
            found_quantity,
            note,
            ..
        } = &event.payload
        {
            if let Some(item) = snapshot.items.iter_mut().find(|i| &i.item_id == item_id) {
                item.status = *status;
                item.found_quantity = *found_quantity;
                item.note = note.clone();
            }
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

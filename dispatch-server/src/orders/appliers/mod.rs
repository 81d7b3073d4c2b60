//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions.

use enum_dispatch::enum_dispatch;

use shared::order::{EventPayload, OrderEvent};

mod delivery_started;
mod item_updated;
mod order_cancelled;
mod order_claimed;
mod order_delivered;
mod order_placed;
mod shopping_completed;
mod shopping_started;

pub use delivery_started::DeliveryStartedApplier;
pub use item_updated::ItemUpdatedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_claimed::OrderClaimedApplier;
pub use order_delivered::OrderDeliveredApplier;
pub use order_placed::OrderPlacedApplier;
pub use shopping_completed::ShoppingCompletedApplier;
pub use shopping_started::ShoppingStartedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    OrderClaimed(OrderClaimedApplier),
    ShoppingStarted(ShoppingStartedApplier),
    ItemUpdated(ItemUpdatedApplier),
    ShoppingCompleted(ShoppingCompletedApplier),
    DeliveryStarted(DeliveryStartedApplier),
    OrderDelivered(OrderDeliveredApplier),
    OrderCancelled(OrderCancelledApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            EventPayload::OrderClaimed { .. } => EventAction::OrderClaimed(OrderClaimedApplier),
            EventPayload::ShoppingStarted {} => {
                EventAction::ShoppingStarted(ShoppingStartedApplier)
            }
            EventPayload::ItemStatusUpdated { .. } => {
                EventAction::ItemUpdated(ItemUpdatedApplier)
            }
            EventPayload::ShoppingCompleted { .. } => {
                EventAction::ShoppingCompleted(ShoppingCompletedApplier)
            }
            EventPayload::DeliveryStarted {} => {
                EventAction::DeliveryStarted(DeliveryStartedApplier)
            }
            EventPayload::OrderDelivered { .. } => {
                EventAction::OrderDelivered(OrderDeliveredApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
        }
    }
}


#[cfg(test)]
pub(crate) mod test_support {
    use shared::order::command::ActorRole;
    use shared::order::{EventPayload, OrderEvent, OrderEventType};

    pub fn driver_event(
        sequence: u64,
        order_id: &str,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> OrderEvent {
        OrderEvent::new(
            sequence,
            order_id.to_string(),
            Some("driver-1".to_string()),
            "Test Driver".to_string(),
            ActorRole::Driver,
            "cmd-1".to_string(),
            Some(1234567890),
            event_type,
            payload,
        )
    }
}

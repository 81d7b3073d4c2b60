//! DeliveryStarted event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// DeliveryStarted applier
pub struct DeliveryStartedApplier;

impl EventApplier for DeliveryStartedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::DeliveryStarted {} = &event.payload {
            snapshot.status = OrderStatus::Delivering;
            snapshot.delivery_started_at = Some(event.timestamp);
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::driver_event;
    use shared::order::OrderEventType;

    #[test]
    fn test_delivery_started_applier() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::Shopping;

        let event = driver_event(
            6,
            "order-1",
            OrderEventType::DeliveryStarted,
            EventPayload::DeliveryStarted {},
        );

        DeliveryStartedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, OrderStatus::Delivering);
        assert_eq!(snapshot.delivery_started_at, Some(event.timestamp));
        assert_eq!(snapshot.progress_step(), 3);
    }
}

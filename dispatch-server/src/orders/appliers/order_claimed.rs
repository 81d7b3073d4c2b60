//! OrderClaimed event applier
//!
//! Assigns the driver and moves the order into the Shopping phase.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderClaimed applier
pub struct OrderClaimedApplier;

impl EventApplier for OrderClaimedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderClaimed {
            driver_id,
            driver_name,
        } = &event.payload
        {
            snapshot.driver_id = Some(driver_id.clone());
            snapshot.driver_name = Some(driver_name.clone());
            snapshot.status = OrderStatus::Shopping;
            snapshot.accepted_at = Some(event.timestamp);
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
    fn test_order_claimed_applier() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());

        let event = driver_event(
            2,
            "order-1",
            OrderEventType::OrderClaimed,
            EventPayload::OrderClaimed {
                driver_id: "driver-1".to_string(),
                driver_name: "Dana".to_string(),
            },
        );

        OrderClaimedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.driver_id.as_deref(), Some("driver-1"));
        assert_eq!(snapshot.driver_name.as_deref(), Some("Dana"));
        assert_eq!(snapshot.status, OrderStatus::Shopping);
        assert_eq!(snapshot.accepted_at, Some(event.timestamp));
        assert_eq!(snapshot.last_sequence, 2);
        assert!(!snapshot.is_claimable());
    }
}

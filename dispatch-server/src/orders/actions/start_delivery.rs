//! StartDelivery command handler
//!
//! Transitions Shopping -> Delivering. Requires every item to have a
//! recorded shopping outcome.

use async_trait::async_trait;

use crate::orders::actions::ensure_assigned_driver;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// StartDelivery action
#[derive(Debug, Clone)]
pub struct StartDeliveryAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for StartDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        match snapshot.status {
            OrderStatus::Shopping => {}
            OrderStatus::Delivered => {
                return Err(OrderError::OrderAlreadyDelivered(self.order_id.clone()));
            }
            OrderStatus::Cancelled => {
                return Err(OrderError::OrderAlreadyCancelled(self.order_id.clone()));
            }
            _ => {
                return Err(OrderError::InvalidOperation(format!(
                    "Cannot start delivery in {:?} status",
                    snapshot.status
                )));
            }
        }

        ensure_assigned_driver(metadata, &snapshot)?;

        if !snapshot.all_items_resolved() {
            return Err(OrderError::InvalidOperation(format!(
                "Order {} still has unresolved items",
                self.order_id
            )));
        }

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor_id.clone(),
            metadata.actor_name.clone(),
            metadata.actor_role,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::DeliveryStarted,
            EventPayload::DeliveryStarted {},
        );

        Ok(vec![event])
    }
}

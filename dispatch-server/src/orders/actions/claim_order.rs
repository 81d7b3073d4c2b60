//! ClaimOrder command handler
//!
//! Exclusive assignment of a pending order to a driver. Both checks
//! (order still unassigned, driver has no active order) run inside the
//! write transaction, so concurrent claims serialize on the single
//! writer and exactly one contender wins.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// ClaimOrder action
#[derive(Debug, Clone)]
pub struct ClaimOrderAction {
    pub order_id: String,
    pub driver_id: String,
    pub driver_name: String,
}

#[async_trait]
impl CommandHandler for ClaimOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Load existing snapshot
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        // 2. Order must be pending and unassigned
        match snapshot.status {
            OrderStatus::Pending if snapshot.driver_id.is_none() => {}
            OrderStatus::Delivered => {
                return Err(OrderError::OrderAlreadyDelivered(self.order_id.clone()));
            }
            OrderStatus::Cancelled => {
                return Err(OrderError::OrderAlreadyCancelled(self.order_id.clone()));
            }
            _ => {
                return Err(OrderError::OrderAlreadyClaimed(self.order_id.clone()));
            }
        }

        // 3. One active order per driver
        if let Some(active) = ctx.driver_active_order(&self.driver_id)? {
            return Err(OrderError::DriverHasActiveOrder(active));
        }

        // 4. Allocate sequence and create event
        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor_id.clone(),
            metadata.actor_name.clone(),
            metadata.actor_role,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderClaimed,
            EventPayload::OrderClaimed {
                driver_id: self.driver_id.clone(),
                driver_name: self.driver_name.clone(),
            },
        );

        Ok(vec![event])
    }
}

//! StartShopping command handler
//!
//! Records the moment the driver actually begins shopping. The order is
//! already in Shopping status from the claim; this only stamps the
//! phase timestamp for performance tracking.

use async_trait::async_trait;

use crate::orders::actions::ensure_assigned_driver;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// StartShopping action
#[derive(Debug, Clone)]
pub struct StartShoppingAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for StartShoppingAction {
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
                    "Cannot start shopping in {:?} status",
                    snapshot.status
                )));
            }
        }

        ensure_assigned_driver(metadata, &snapshot)?;

        if snapshot.shopping_started_at.is_some() {
            return Err(OrderError::InvalidOperation(format!(
                "Shopping already started for order {}",
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
            OrderEventType::ShoppingStarted,
            EventPayload::ShoppingStarted {},
        );

        Ok(vec![event])
    }
}

//! CancelOrder command handler
//!
//! Cancels any non-terminal order. The assignment history is preserved:
//! cancellation never clears driver fields from the snapshot.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::command::ActorRole;
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        match snapshot.status {
            OrderStatus::Delivered => {
                return Err(OrderError::OrderAlreadyDelivered(self.order_id.clone()));
            }
            OrderStatus::Cancelled => {
                return Err(OrderError::OrderAlreadyCancelled(self.order_id.clone()));
            }
            _ => {}
        }

        // The customer may cancel their own order; the assigned driver may
        // abandon theirs; Admin and System may cancel anything.
        let allowed = match metadata.actor_role {
            ActorRole::Admin | ActorRole::System => true,
            ActorRole::Customer => {
                metadata.actor_id.as_deref() == Some(snapshot.customer_id.as_str())
            }
            ActorRole::Driver => {
                snapshot.driver_id.is_some()
                    && metadata.actor_id.as_deref() == snapshot.driver_id.as_deref()
            }
        };
        if !allowed {
            return Err(OrderError::InvalidOperation(format!(
                "Actor may not cancel order {}",
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
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: self.reason.clone(),
            },
        );

        Ok(vec![event])
    }
}

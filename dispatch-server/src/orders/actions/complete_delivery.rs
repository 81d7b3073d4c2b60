//! CompleteDelivery command handler
//!
//! Transitions Delivering -> Delivered and fixes the final total,
//! substituting the actual delivery fee for the quote when one is
//! reported.

use async_trait::async_trait;

use crate::orders::actions::ensure_assigned_driver;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};
use shared::pricing::{to_decimal, to_f64};

/// CompleteDelivery action
#[derive(Debug, Clone)]
pub struct CompleteDeliveryAction {
    pub order_id: String,
    pub actual_delivery_fee: Option<f64>,
}

#[async_trait]
impl CommandHandler for CompleteDeliveryAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        match snapshot.status {
            OrderStatus::Delivering => {}
            OrderStatus::Delivered => {
                return Err(OrderError::OrderAlreadyDelivered(self.order_id.clone()));
            }
            OrderStatus::Cancelled => {
                return Err(OrderError::OrderAlreadyCancelled(self.order_id.clone()));
            }
            _ => {
                return Err(OrderError::InvalidOperation(format!(
                    "Cannot complete delivery in {:?} status",
                    snapshot.status
                )));
            }
        }

        ensure_assigned_driver(metadata, &snapshot)?;

        if let Some(fee) = self.actual_delivery_fee {
            shared::pricing::require_finite(fee, "actual_delivery_fee")?;
            if fee < 0.0 {
                return Err(OrderError::InvalidOperation(format!(
                    "actual_delivery_fee cannot be negative: {fee}"
                )));
            }
        }

        let fee = self.actual_delivery_fee.unwrap_or(snapshot.delivery_fee);
        let final_total = to_f64(
            to_decimal(snapshot.subtotal) + to_decimal(fee) + to_decimal(snapshot.tip_amount),
        );

        let seq = ctx.next_sequence();
        let event = OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor_id.clone(),
            metadata.actor_name.clone(),
            metadata.actor_role,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderDelivered,
            EventPayload::OrderDelivered {
                actual_delivery_fee: self.actual_delivery_fee,
                final_total,
            },
        );

        Ok(vec![event])
    }
}

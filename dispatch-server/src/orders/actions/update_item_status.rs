//! UpdateItemStatus command handler
//!
//! Records a shopping outcome for one item (found / substituted /
//! unavailable). When the update resolves the last pending item, a
//! ShoppingCompleted event is emitted in the same command.

use async_trait::async_trait;

use crate::orders::actions::ensure_assigned_driver;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::types::ItemStatus;
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderStatus};

/// UpdateItemStatus action
#[derive(Debug, Clone)]
pub struct UpdateItemStatusAction {
    pub order_id: String,
    pub item_id: String,
    pub status: ItemStatus,
    pub found_quantity: Option<i32>,
    pub note: Option<String>,
}

#[async_trait]
impl CommandHandler for UpdateItemStatusAction {
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
                    "Cannot update items in {:?} status",
                    snapshot.status
                )));
            }
        }

        ensure_assigned_driver(metadata, &snapshot)?;

        let Some(event_type) = OrderEventType::for_item_status(self.status) else {
            return Err(OrderError::InvalidOperation(
                "Item status must be a shopping outcome, not PENDING".to_string(),
            ));
        };

        let item = snapshot
            .find_item(&self.item_id)
            .ok_or_else(|| OrderError::ItemNotFound(self.item_id.clone()))?;

        if let Some(q) = self.found_quantity
            && (q < 0 || q > item.quantity)
        {
            return Err(OrderError::InvalidQuantity(format!(
                "found_quantity {q} out of range for item {} (quantity {})",
                self.item_id, item.quantity
            )));
        }

        let was_pending = item.status == ItemStatus::Pending;
        let item_name = item.name.clone();

        let seq = ctx.next_sequence();
        let mut events = vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.actor_id.clone(),
            metadata.actor_name.clone(),
            metadata.actor_role,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            event_type,
            EventPayload::ItemStatusUpdated {
                item_id: self.item_id.clone(),
                item_name,
                status: self.status,
                found_quantity: self.found_quantity,
                note: self.note.clone(),
            },
        )];

        // This was the last pending item: the shopping phase is done
        let others_pending = snapshot
            .items
            .iter()
            .any(|i| i.item_id != self.item_id && i.status == ItemStatus::Pending);
        if was_pending && !others_pending {
            let (mut found, mut substituted, mut unavailable) = (0, 0, 0);
            for i in &snapshot.items {
                let status = if i.item_id == self.item_id {
                    self.status
                } else {
                    i.status
                };
                match status {
                    ItemStatus::Found => found += 1,
                    ItemStatus::Substituted => substituted += 1,
                    ItemStatus::Unavailable => unavailable += 1,
                    ItemStatus::Pending => {}
                }
            }

            let seq = ctx.next_sequence();
            events.push(OrderEvent::new(
                seq,
                self.order_id.clone(),
                metadata.actor_id.clone(),
                metadata.actor_name.clone(),
                metadata.actor_role,
                metadata.command_id.clone(),
                Some(metadata.timestamp),
                OrderEventType::ShoppingCompleted,
                EventPayload::ShoppingCompleted {
                    found_count: found,
                    substituted_count: substituted,
                    unavailable_count: unavailable,
                },
            ));
        }

        Ok(events)
    }
}

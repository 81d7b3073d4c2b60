//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::command::ActorRole;
use shared::order::{OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot};

mod cancel_order;
mod claim_order;
mod complete_delivery;
mod place_order;
mod start_delivery;
mod start_shopping;
mod update_item_status;

pub use cancel_order::CancelOrderAction;
pub use claim_order::ClaimOrderAction;
pub use complete_delivery::CompleteDeliveryAction;
pub use place_order::PlaceOrderAction;
pub use start_delivery::StartDeliveryAction;
pub use start_shopping::StartShoppingAction;
pub use update_item_status::UpdateItemStatusAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    ClaimOrder(ClaimOrderAction),
    StartShopping(StartShoppingAction),
    UpdateItemStatus(UpdateItemStatusAction),
    StartDelivery(StartDeliveryAction),
    CompleteDelivery(CompleteDeliveryAction),
    CancelOrder(CancelOrderAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::ClaimOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::StartShopping(action) => action.execute(ctx, metadata).await,
            CommandAction::UpdateItemStatus(action) => action.execute(ctx, metadata).await,
            CommandAction::StartDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::CompleteDelivery(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert OrderCommand to CommandAction
///
/// This is the ONLY place with a match on OrderCommandPayload.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::PlaceOrder { .. } => {
                // PlaceOrder is handled specially in DispatchManager to inject
                // catalog pricing metadata. This path should never be reached.
                unreachable!("PlaceOrder should be handled by DispatchManager, not From<&OrderCommand>")
            }
            OrderCommandPayload::ClaimOrder {
                order_id,
                driver_id,
                driver_name,
            } => CommandAction::ClaimOrder(ClaimOrderAction {
                order_id: order_id.clone(),
                driver_id: driver_id.clone(),
                driver_name: driver_name.clone(),
            }),
            OrderCommandPayload::StartShopping { order_id } => {
                CommandAction::StartShopping(StartShoppingAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::UpdateItemStatus {
                order_id,
                item_id,
                status,
                found_quantity,
                note,
            } => CommandAction::UpdateItemStatus(UpdateItemStatusAction {
                order_id: order_id.clone(),
                item_id: item_id.clone(),
                status: *status,
                found_quantity: *found_quantity,
                note: note.clone(),
            }),
            OrderCommandPayload::StartDelivery { order_id } => {
                CommandAction::StartDelivery(StartDeliveryAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::CompleteDelivery {
                order_id,
                actual_delivery_fee,
            } => CommandAction::CompleteDelivery(CompleteDeliveryAction {
                order_id: order_id.clone(),
                actual_delivery_fee: *actual_delivery_fee,
            }),
            OrderCommandPayload::CancelOrder { order_id, reason } => {
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }
}

/// Check that the actor is the assigned driver (or back-office staff)
///
/// Driver-phase commands act on behalf of the driver who claimed the
/// order; Admin and System actors bypass the check.
pub(crate) fn ensure_assigned_driver(
    metadata: &CommandMetadata,
    snapshot: &OrderSnapshot,
) -> Result<(), OrderError> {
    if matches!(metadata.actor_role, ActorRole::Admin | ActorRole::System) {
        return Ok(());
    }
    let assigned = snapshot.driver_id.as_deref();
    if assigned.is_some() && metadata.actor_id.as_deref() == assigned {
        return Ok(());
    }
    Err(OrderError::InvalidOperation(format!(
        "Actor is not the assigned driver for order {}",
        snapshot.order_id
    )))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use shared::order::types::CartLineInput;
    use shared::order::{OrderItemSnapshot, OrderStatus};

    pub fn driver_metadata(driver_id: &str) -> CommandMetadata {
        CommandMetadata {
            command_id: format!("cmd-{}", uuid::Uuid::new_v4()),
            actor_id: Some(driver_id.to_string()),
            actor_name: "Test Driver".to_string(),
            actor_role: ActorRole::Driver,
            timestamp: 1234567890,
        }
    }

    pub fn customer_metadata(customer_id: &str) -> CommandMetadata {
        CommandMetadata {
            command_id: format!("cmd-{}", uuid::Uuid::new_v4()),
            actor_id: Some(customer_id.to_string()),
            actor_name: "Test Customer".to_string(),
            actor_role: ActorRole::Customer,
            timestamp: 1234567890,
        }
    }

    pub fn unit_item(item_id: &str, quantity: i32, unit_price: f64) -> OrderItemSnapshot {
        OrderItemSnapshot {
            item_id: item_id.to_string(),
            product_id: format!("prod-{item_id}"),
            name: format!("Item {item_id}"),
            weight_based: false,
            quantity,
            selected_weight: None,
            unit_price,
            price: unit_price * quantity as f64,
            status: Default::default(),
            found_quantity: None,
            note: None,
        }
    }

    pub fn unit_line(product_id: &str, quantity: i32, unit_price: f64) -> CartLineInput {
        CartLineInput {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            quantity,
            selected_weight: None,
            unit_price,
            price: unit_price * quantity as f64,
        }
    }

    /// An order already claimed by `driver-1`, in Shopping status
    pub fn shopping_snapshot(order_id: &str) -> OrderSnapshot {
        let mut snapshot = OrderSnapshot::new(order_id.to_string());
        snapshot.customer_id = "customer-1".to_string();
        snapshot.status = OrderStatus::Shopping;
        snapshot.driver_id = Some("driver-1".to_string());
        snapshot.driver_name = Some("Test Driver".to_string());
        snapshot.items = vec![unit_item("item-1", 2, 3.0), unit_item("item-2", 1, 5.0)];
        snapshot.subtotal = 11.0;
        snapshot.delivery_fee = 5.0;
        snapshot.accepted_at = Some(1234567000);
        snapshot
    }

    pub fn pending_snapshot(order_id: &str) -> OrderSnapshot {
        let mut snapshot = OrderSnapshot::new(order_id.to_string());
        snapshot.customer_id = "customer-1".to_string();
        snapshot.items = vec![unit_item("item-1", 2, 3.0)];
        snapshot.subtotal = 6.0;
        snapshot.delivery_fee = 5.0;
        snapshot
    }
}

//! PlaceOrder command handler
//!
//! Validates and prices checked-out cart lines, then creates the order.
//! The DispatchManager injects catalog metadata before execution so the
//! server reprices known products instead of trusting client figures.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::orders::reducer::{line_to_snapshot, merge_lines};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::ProductMeta;
use shared::order::types::CartLineInput;
use shared::order::{EventPayload, OrderEvent, OrderEventType};
use shared::pricing;

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    pub customer_id: String,
    pub items: Vec<CartLineInput>,
    pub delivery_fee: f64,
    pub tip_amount: f64,
    pub estimated_payout: f64,
    pub delivery_distance: f64,
    pub estimated_minutes: i64,
    /// Catalog pricing metadata, injected by DispatchManager.
    /// Lines for product IDs absent here keep their client prices.
    pub product_metadata: HashMap<String, ProductMeta>,
}

#[async_trait]
impl CommandHandler for PlaceOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Validate the order-level figures
        if self.items.is_empty() {
            return Err(OrderError::InvalidOperation(
                "Cannot place an order with no items".to_string(),
            ));
        }
        for (label, amount) in [
            ("delivery_fee", self.delivery_fee),
            ("tip_amount", self.tip_amount),
            ("estimated_payout", self.estimated_payout),
            ("delivery_distance", self.delivery_distance),
        ] {
            pricing::require_finite(amount, label)?;
            if amount < 0.0 {
                return Err(OrderError::InvalidOperation(format!(
                    "{label} cannot be negative: {amount}"
                )));
            }
        }

        // 2. Merge duplicate lines, then price each against the catalog
        let lines = merge_lines(&self.items);
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let meta = self.product_metadata.get(&line.product_id);
            items.push(line_to_snapshot(line, meta)?);
        }
        let subtotal = pricing::sum_lines(items.iter().map(|i| i.price));

        // 3. New order ID and sequence
        let order_id = uuid::Uuid::new_v4().to_string();
        let seq = ctx.next_sequence();

        // 4. Create event
        let event = OrderEvent::new(
            seq,
            order_id,
            metadata.actor_id.clone(),
            metadata.actor_name.clone(),
            metadata.actor_role,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderPlaced,
            EventPayload::OrderPlaced {
                customer_id: self.customer_id.clone(),
                items,
                subtotal,
                delivery_fee: self.delivery_fee,
                tip_amount: self.tip_amount,
                estimated_payout: self.estimated_payout,
                delivery_distance: self.delivery_distance,
                estimated_minutes: self.estimated_minutes,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{customer_metadata, unit_line};
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::CommandContext;

    fn action_with_lines(lines: Vec<CartLineInput>) -> PlaceOrderAction {
        PlaceOrderAction {
            customer_id: "customer-1".to_string(),
            items: lines,
            delivery_fee: 4.99,
            tip_amount: 2.0,
            estimated_payout: 12.5,
            delivery_distance: 1.8,
            estimated_minutes: 45,
            product_metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_place_order_success() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action_with_lines(vec![unit_line("p1", 2, 3.0), unit_line("p2", 1, 5.0)]);
        let metadata = customer_metadata("customer-1");
        let events = action.execute(&mut ctx, &metadata).await.unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type, OrderEventType::OrderPlaced);
        assert_eq!(event.sequence, 1);
        assert!(!event.order_id.is_empty());

        if let EventPayload::OrderPlaced {
            customer_id,
            items,
            subtotal,
            delivery_fee,
            tip_amount,
            ..
        } = &event.payload
        {
            assert_eq!(customer_id, "customer-1");
            assert_eq!(items.len(), 2);
            assert_eq!(*subtotal, 11.0);
            assert_eq!(*delivery_fee, 4.99);
            assert_eq!(*tip_amount, 2.0);
        } else {
            panic!("Expected OrderPlaced payload");
        }
    }

    #[tokio::test]
    async fn test_place_order_merges_duplicate_lines() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action_with_lines(vec![unit_line("p1", 2, 3.0), unit_line("p1", 3, 3.0)]);
        let metadata = customer_metadata("customer-1");
        let events = action.execute(&mut ctx, &metadata).await.unwrap();

        if let EventPayload::OrderPlaced { items, subtotal, .. } = &events[0].payload {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].quantity, 5);
            assert_eq!(*subtotal, 15.0);
        } else {
            panic!("Expected OrderPlaced payload");
        }
    }

    #[tokio::test]
    async fn test_place_order_reprices_from_catalog_metadata() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let mut action = action_with_lines(vec![unit_line("p1", 2, 3.0)]);
        action.product_metadata.insert(
            "p1".to_string(),
            ProductMeta {
                id: "p1".to_string(),
                name: "Catalog Milk".to_string(),
                price: 3.99,
                weight_based: false,
                price_per_unit: None,
                min_weight: None,
                max_weight: None,
            },
        );

        let metadata = customer_metadata("customer-1");
        let events = action.execute(&mut ctx, &metadata).await.unwrap();

        if let EventPayload::OrderPlaced { items, subtotal, .. } = &events[0].payload {
            assert_eq!(items[0].name, "Catalog Milk");
            assert_eq!(items[0].unit_price, 3.99);
            assert_eq!(*subtotal, 7.98);
        } else {
            panic!("Expected OrderPlaced payload");
        }
    }

    #[tokio::test]
    async fn test_place_order_empty_cart_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action_with_lines(vec![]);
        let metadata = customer_metadata("customer-1");
        let result = action.execute(&mut ctx, &metadata).await;
        assert!(matches!(result, Err(OrderError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_place_order_negative_fee_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let mut action = action_with_lines(vec![unit_line("p1", 1, 3.0)]);
        action.delivery_fee = -1.0;
        let metadata = customer_metadata("customer-1");
        let result = action.execute(&mut ctx, &metadata).await;
        assert!(matches!(result, Err(OrderError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_place_order_nonfinite_fee_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let mut action = action_with_lines(vec![unit_line("p1", 1, 3.0)]);
        action.tip_amount = f64::NAN;
        let metadata = customer_metadata("customer-1");
        let result = action.execute(&mut ctx, &metadata).await;
        match result {
            Err(OrderError::InvalidOperation(msg)) => assert!(msg.contains("tip_amount")),
            other => panic!("expected InvalidOperation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_place_order_bad_quantity_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action_with_lines(vec![unit_line("p1", 0, 3.0)]);
        let metadata = customer_metadata("customer-1");
        let result = action.execute(&mut ctx, &metadata).await;
        assert!(matches!(result, Err(OrderError::InvalidQuantity(_))));
    }
}

//! DispatchManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Snapshot updates and dispatch index maintenance
//! - Event broadcasting
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to snapshots via EventApplier
//!     ├─ 6. Persist events and snapshots, update dispatch indices
//!     ├─ 7. Mark command processed
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return response
//! ```

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::appliers::EventAction;
use super::reducer;
use super::storage::{OrderStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier};
use crate::catalog::CatalogService;
use shared::models::ProductMeta;
use shared::order::types::CartLineInput;
use shared::order::{
    CommandResponse, OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot, OrderStatus,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// DispatchManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and trigger full resync.
pub struct DispatchManager {
    storage: OrderStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Server instance epoch - unique ID generated on startup
    epoch: String,
    /// Catalog service for checkout repricing
    catalog_service: Option<Arc<CatalogService>>,
}

impl std::fmt::Debug for DispatchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl DispatchManager {
    /// Create a new DispatchManager with the given database path
    pub fn new(db_path: impl AsRef<Path>) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "DispatchManager started with new epoch");
        Ok(Self {
            storage,
            event_tx,
            epoch,
            catalog_service: None,
        })
    }

    /// Create a DispatchManager over existing storage
    pub fn with_storage(storage: OrderStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        Self {
            storage,
            event_tx,
            epoch,
            catalog_service: None,
        }
    }

    /// Set the catalog service for product metadata lookup
    pub fn set_catalog_service(&mut self, catalog_service: Arc<CatalogService>) {
        self.catalog_service = Some(catalog_service);
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        match self.process_command(cmd.clone()) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in events {
                    if self.event_tx.send(event).is_err() {
                        tracing::warn!("Event broadcast failed: no active receivers");
                        break;
                    }
                }
                response
            }
            Err(err) => CommandResponse::error(cmd.command_id, err.into()),
        }
    }

    /// Execute a command and return both the response and generated events
    ///
    /// Useful for embedding callers that forward events to their own UI
    /// channel; the events are still broadcast internally.
    pub fn execute_command_with_events(
        &self,
        cmd: OrderCommand,
    ) -> (CommandResponse, Vec<OrderEvent>) {
        match self.process_command(cmd.clone()) {
            Ok((response, events)) => {
                for event in &events {
                    if self.event_tx.send(event.clone()).is_err() {
                        tracing::warn!("Event broadcast failed: no active receivers");
                        break;
                    }
                }
                (response, events)
            }
            Err(err) => (CommandResponse::error(cmd.command_id, err.into()), vec![]),
        }
    }

    /// Get product metadata for cart lines from CatalogService
    fn get_product_metadata_for_lines(
        &self,
        lines: &[CartLineInput],
    ) -> HashMap<String, ProductMeta> {
        let Some(catalog) = &self.catalog_service else {
            return HashMap::new();
        };
        let product_ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        catalog.get_product_meta_batch(&product_ids)
    }

    /// Process command and return response with events
    ///
    /// Uses the action-based architecture:
    /// 1. Convert command to CommandAction
    /// 2. Execute action to generate events
    /// 3. Apply events to snapshots via EventApplier
    /// 4. Persist everything atomically
    fn process_command(
        &self,
        cmd: OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            return Ok((CommandResponse::duplicate(cmd.command_id), vec![]));
        }

        // 3. Get current sequence for context initialization
        let current_sequence = self.storage.get_current_sequence()?;

        // 4. Create context and metadata
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor_id: cmd.actor_id.clone(),
            actor_name: cmd.actor_name.clone(),
            actor_role: cmd.actor_role,
            timestamp: cmd.timestamp,
        };

        // 5. Convert to action and execute
        // For PlaceOrder: inject product metadata from CatalogService so the
        // server reprices known products
        let action: CommandAction = match &cmd.payload {
            OrderCommandPayload::PlaceOrder {
                customer_id,
                items,
                delivery_fee,
                tip_amount,
                estimated_payout,
                delivery_distance,
                estimated_minutes,
            } => {
                let product_metadata = self.get_product_metadata_for_lines(items);
                CommandAction::PlaceOrder(super::actions::PlaceOrderAction {
                    customer_id: customer_id.clone(),
                    items: items.clone(),
                    delivery_fee: *delivery_fee,
                    tip_amount: *tip_amount,
                    estimated_payout: *estimated_payout,
                    delivery_distance: *delivery_distance,
                    estimated_minutes: *estimated_minutes,
                    product_metadata,
                })
            }
            _ => (&cmd).into(),
        };
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))
            .map_err(ManagerError::from)?;

        // 6. Apply events to snapshots
        for event in &events {
            // Load or create snapshot for this order
            let mut snapshot = ctx
                .load_snapshot(&event.order_id)
                .unwrap_or_else(|_| OrderSnapshot::new(event.order_id.clone()));

            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);

            ctx.save_snapshot(snapshot);
        }

        // 7. Persist events
        for event in &events {
            self.storage.store_event(&txn, event)?;
        }

        // 8. Persist snapshots and maintain dispatch indices
        for snapshot in ctx.modified_snapshots() {
            self.storage.store_snapshot(&txn, snapshot)?;

            match snapshot.status {
                OrderStatus::Pending => {
                    self.storage.mark_claimable(&txn, &snapshot.order_id)?;
                }
                OrderStatus::Shopping | OrderStatus::Delivering => {
                    self.storage.unmark_claimable(&txn, &snapshot.order_id)?;
                    if let Some(driver_id) = &snapshot.driver_id {
                        self.storage
                            .set_driver_active(&txn, driver_id, &snapshot.order_id)?;
                    }
                }
                OrderStatus::Delivered | OrderStatus::Cancelled => {
                    self.storage.unmark_claimable(&txn, &snapshot.order_id)?;
                    if let Some(driver_id) = &snapshot.driver_id {
                        self.storage
                            .clear_driver_active(&txn, driver_id, &snapshot.order_id)?;
                    }
                }
            }
        }

        // 9. Update sequence counter
        let max_sequence = events
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(current_sequence);
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }

        // 10. Mark command processed
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // 11. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        // 12. Return response
        let order_id = events.first().map(|e| e.order_id.clone());
        tracing::info!(command_id = %cmd.command_id, order_id = ?order_id, event_count = events.len(), "Command processed successfully");
        Ok((CommandResponse::success(cmd.command_id, order_id), events))
    }

    // ========== Queries ==========

    /// Get a single order snapshot
    pub fn get_order(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.get_snapshot(order_id)?)
    }

    /// All orders currently open for claiming
    pub fn list_claimable_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_claimable_orders()?)
    }

    /// The order a driver is currently working, if any
    pub fn get_active_order_for_driver(
        &self,
        driver_id: &str,
    ) -> ManagerResult<Option<OrderSnapshot>> {
        match self.storage.get_driver_active(driver_id)? {
            Some(order_id) => Ok(self.storage.get_snapshot(&order_id)?),
            None => Ok(None),
        }
    }

    /// Full event history for one order, sorted by sequence
    pub fn get_order_events(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// All events after a sequence number (for client resync)
    pub fn get_events_since(&self, sequence: u64) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_events_since(sequence)?)
    }

    /// Rebuild a snapshot from its event stream and verify it against
    /// the stored snapshot checksum
    pub fn rebuild_snapshot(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        if events.is_empty() {
            return Err(ManagerError::OrderNotFound(order_id.to_string()));
        }

        let rebuilt = reducer::replay_events(order_id, &events);

        if let Some(stored) = self.storage.get_snapshot(order_id)?
            && stored.state_checksum != rebuilt.state_checksum
        {
            tracing::error!(
                order_id,
                stored = %stored.state_checksum,
                rebuilt = %rebuilt.state_checksum,
                "Snapshot checksum mismatch on replay"
            );
            return Err(ManagerError::Internal(format!(
                "Snapshot checksum mismatch for order {order_id}"
            )));
        }

        Ok(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::command::ActorRole;
    use shared::order::types::{CartLineInput, CommandErrorCode, ItemStatus};

    fn manager() -> DispatchManager {
        DispatchManager::with_storage(OrderStorage::open_in_memory().unwrap())
    }

    fn line(product_id: &str, quantity: i32, unit_price: f64) -> CartLineInput {
        CartLineInput {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            quantity,
            selected_weight: None,
            unit_price,
            price: unit_price * quantity as f64,
        }
    }

    fn place_order(manager: &DispatchManager) -> String {
        let cmd = OrderCommand::new(
            Some("customer-1".to_string()),
            "Test Customer",
            ActorRole::Customer,
            OrderCommandPayload::PlaceOrder {
                customer_id: "customer-1".to_string(),
                items: vec![line("p1", 2, 3.0), line("p2", 1, 5.0)],
                delivery_fee: 4.99,
                tip_amount: 2.0,
                estimated_payout: 12.5,
                delivery_distance: 1.8,
                estimated_minutes: 45,
            },
        );
        let response = manager.execute_command(cmd);
        assert!(response.success, "{:?}", response.error);
        response.order_id.unwrap()
    }

    fn driver_cmd(driver_id: &str, payload: OrderCommandPayload) -> OrderCommand {
        OrderCommand::new(
            Some(driver_id.to_string()),
            "Test Driver",
            ActorRole::Driver,
            payload,
        )
    }

    fn claim(manager: &DispatchManager, order_id: &str, driver_id: &str) -> CommandResponse {
        manager.execute_command(driver_cmd(
            driver_id,
            OrderCommandPayload::ClaimOrder {
                order_id: order_id.to_string(),
                driver_id: driver_id.to_string(),
                driver_name: "Test Driver".to_string(),
            },
        ))
    }

    #[test]
    fn test_place_order_is_claimable() {
        let manager = manager();
        let order_id = place_order(&manager);

        let snapshot = manager.get_order(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.subtotal, 11.0);
        assert!(snapshot.verify_checksum());

        let claimable = manager.list_claimable_orders().unwrap();
        assert_eq!(claimable.len(), 1);
        assert_eq!(claimable[0].order_id, order_id);
    }

    #[test]
    fn test_claim_moves_order_off_the_feed() {
        let manager = manager();
        let order_id = place_order(&manager);

        let response = claim(&manager, &order_id, "driver-1");
        assert!(response.success);

        assert!(manager.list_claimable_orders().unwrap().is_empty());
        let active = manager
            .get_active_order_for_driver("driver-1")
            .unwrap()
            .unwrap();
        assert_eq!(active.order_id, order_id);
        assert_eq!(active.status, OrderStatus::Shopping);
    }

    #[test]
    fn test_second_claim_rejected() {
        let manager = manager();
        let order_id = place_order(&manager);

        assert!(claim(&manager, &order_id, "driver-1").success);
        let response = claim(&manager, &order_id, "driver-2");
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::OrderAlreadyClaimed
        );
    }

    #[test]
    fn test_one_active_order_per_driver() {
        let manager = manager();
        let first = place_order(&manager);
        let second = place_order(&manager);

        assert!(claim(&manager, &first, "driver-1").success);
        let response = claim(&manager, &second, "driver-1");
        assert!(!response.success);
        assert_eq!(
            response.error.unwrap().code,
            CommandErrorCode::DriverHasActiveOrder
        );
    }

    #[test]
    fn test_duplicate_command_not_reapplied() {
        let manager = manager();
        let order_id = place_order(&manager);

        let cmd = driver_cmd(
            "driver-1",
            OrderCommandPayload::ClaimOrder {
                order_id: order_id.clone(),
                driver_id: "driver-1".to_string(),
                driver_name: "Test Driver".to_string(),
            },
        );
        let first = manager.execute_command(cmd.clone());
        assert!(first.success);

        let replay = manager.execute_command(cmd);
        assert!(replay.success);
        assert_eq!(replay.order_id, None);

        // Still exactly one claim event in the stream
        let events = manager.get_order_events(&order_id).unwrap();
        assert_eq!(events.len(), 2); // OrderPlaced + OrderClaimed
    }

    #[test]
    fn test_full_lifecycle() {
        let manager = manager();
        let order_id = place_order(&manager);
        assert!(claim(&manager, &order_id, "driver-1").success);

        let response = manager.execute_command(driver_cmd(
            "driver-1",
            OrderCommandPayload::StartShopping {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);

        let snapshot = manager.get_order(&order_id).unwrap().unwrap();
        for item in &snapshot.items {
            let response = manager.execute_command(driver_cmd(
                "driver-1",
                OrderCommandPayload::UpdateItemStatus {
                    order_id: order_id.clone(),
                    item_id: item.item_id.clone(),
                    status: ItemStatus::Found,
                    found_quantity: None,
                    note: None,
                },
            ));
            assert!(response.success);
        }

        let response = manager.execute_command(driver_cmd(
            "driver-1",
            OrderCommandPayload::StartDelivery {
                order_id: order_id.clone(),
            },
        ));
        assert!(response.success);

        let response = manager.execute_command(driver_cmd(
            "driver-1",
            OrderCommandPayload::CompleteDelivery {
                order_id: order_id.clone(),
                actual_delivery_fee: Some(5.5),
            },
        ));
        assert!(response.success);

        let snapshot = manager.get_order(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Delivered);
        assert_eq!(snapshot.actual_delivery_fee, Some(5.5));
        // subtotal 11.0 + actual fee 5.5 + tip 2.0
        assert_eq!(snapshot.final_total(), 18.5);

        // Driver is free again
        assert!(manager
            .get_active_order_for_driver("driver-1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_cancel_frees_driver_and_keeps_assignment() {
        let manager = manager();
        let order_id = place_order(&manager);
        assert!(claim(&manager, &order_id, "driver-1").success);

        let response = manager.execute_command(driver_cmd(
            "driver-1",
            OrderCommandPayload::CancelOrder {
                order_id: order_id.clone(),
                reason: Some("Store closed".to_string()),
            },
        ));
        assert!(response.success);

        let snapshot = manager.get_order(&order_id).unwrap().unwrap();
        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.driver_id.as_deref(), Some("driver-1"));

        assert!(manager
            .get_active_order_for_driver("driver-1")
            .unwrap()
            .is_none());
        assert!(manager.list_claimable_orders().unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_snapshot_matches_stored() {
        let manager = manager();
        let order_id = place_order(&manager);
        assert!(claim(&manager, &order_id, "driver-1").success);

        let rebuilt = manager.rebuild_snapshot(&order_id).unwrap();
        let stored = manager.get_order(&order_id).unwrap().unwrap();
        assert_eq!(rebuilt.state_checksum, stored.state_checksum);
        assert_eq!(rebuilt.status, stored.status);
        assert_eq!(rebuilt.last_sequence, stored.last_sequence);
    }

    #[test]
    fn test_events_broadcast_to_subscribers() {
        let manager = manager();
        let mut rx = manager.subscribe();

        let order_id = place_order(&manager);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.order_id, order_id);
        assert_eq!(
            event.event_type,
            shared::order::OrderEventType::OrderPlaced
        );
    }

    #[test]
    fn test_epoch_is_stable_per_instance() {
        let manager = manager();
        assert!(!manager.epoch().is_empty());
        assert_eq!(manager.epoch(), manager.epoch());
    }
}

//! Core traits and context for the action/applier architecture
//!
//! - `CommandHandler`: validates a command against current state and
//!   generates events. Handlers never mutate snapshots.
//! - `EventApplier`: pure state transition, applies one event to a
//!   snapshot. Appliers never fail and never validate.
//! - `CommandContext`: transaction-scoped view of storage, plus the
//!   in-flight snapshot working set and sequence allocator.

use super::appliers::{
    DeliveryStartedApplier, EventAction, ItemUpdatedApplier, OrderCancelledApplier,
    OrderClaimedApplier, OrderDeliveredApplier, OrderPlacedApplier, ShoppingCompletedApplier,
    ShoppingStartedApplier,
};
use super::storage::{OrderStorage, StorageError};
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use shared::order::command::ActorRole;
use shared::order::{OrderEvent, OrderSnapshot};
use shared::pricing::PricingError;
use std::collections::HashMap;
use thiserror::Error;

/// Domain errors raised by command handlers
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order already claimed: {0}")]
    OrderAlreadyClaimed(String),

    #[error("Driver already has an active order: {0}")]
    DriverHasActiveOrder(String),

    #[error("Order already delivered: {0}")]
    OrderAlreadyDelivered(String),

    #[error("Order already cancelled: {0}")]
    OrderAlreadyCancelled(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for OrderError {
    fn from(e: StorageError) -> Self {
        OrderError::Storage(e.to_string())
    }
}

impl From<PricingError> for OrderError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::WeightBelowMinimum { .. } | PricingError::WeightAboveMaximum { .. } => {
                OrderError::InvalidWeight(e.to_string())
            }
            PricingError::InvalidQuantity(msg) => OrderError::InvalidQuantity(msg),
            PricingError::InvalidAmount(msg) => OrderError::InvalidOperation(msg),
        }
    }
}

/// Command metadata passed to every handler
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor_id: Option<String>,
    pub actor_name: String,
    pub actor_role: ActorRole,
    /// Client timestamp (audit only; server time is authoritative)
    pub timestamp: i64,
}

/// Command handler trait - one implementation per command type
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier trait - pure snapshot mutation
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}

/// Transaction-scoped command context
///
/// Snapshots loaded or saved here live in a working set that the
/// manager persists after all events are applied, so a multi-event
/// command observes its own intermediate state.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    sequence: u64,
    modified: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a OrderStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            modified: HashMap::new(),
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Load a snapshot: working set first, then storage (within txn)
    pub fn load_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.modified.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Save a snapshot into the working set
    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.modified.insert(snapshot.order_id.clone(), snapshot);
    }

    /// All snapshots modified during this command
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.modified.values()
    }

    /// Order currently assigned to a driver, if any (reads within txn,
    /// so claim races serialize on the single writer)
    pub fn driver_active_order(&self, driver_id: &str) -> Result<Option<String>, OrderError> {
        Ok(self.storage.get_driver_active_txn(self.txn, driver_id)?)
    }
}

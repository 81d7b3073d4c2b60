//! Order commands - requests from clients to modify orders

use super::types::{CartLineInput, ItemStatus};
use serde::{Deserialize, Serialize};

/// Role of the acting user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Driver,
    Admin,
    System,
}

/// Order command - a request to change order state
///
/// `command_id` is the idempotency key: redelivering a processed
/// command returns the duplicate response without re-applying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Command unique ID (client-generated, idempotency key)
    pub command_id: String,
    /// Acting user (None for system-originated commands)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Actor name (snapshot for audit)
    pub actor_name: String,
    /// Actor role
    pub actor_role: ActorRole,
    /// Client timestamp (Unix milliseconds; server time is
    /// authoritative for state evolution)
    pub timestamp: i64,
    /// Command payload
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(
        actor_id: Option<String>,
        actor_name: impl Into<String>,
        actor_role: ActorRole,
        payload: OrderCommandPayload,
    ) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor_id,
            actor_name: actor_name.into(),
            actor_role,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Create a new pending order from checked-out cart lines
    PlaceOrder {
        customer_id: String,
        items: Vec<CartLineInput>,
        delivery_fee: f64,
        #[serde(default)]
        tip_amount: f64,
        /// Estimated driver payout, used by feed filters/sorts
        estimated_payout: f64,
        /// Delivery distance in distance-units
        delivery_distance: f64,
        /// Estimated fulfillment time in minutes
        estimated_minutes: i64,
    },

    /// Exclusive assignment of a pending, unassigned order to a driver
    ClaimOrder {
        order_id: String,
        driver_id: String,
        driver_name: String,
    },

    /// Driver explicitly starts shopping (records the phase timestamp)
    StartShopping { order_id: String },

    /// Driver reports an item outcome while shopping
    UpdateItemStatus {
        order_id: String,
        item_id: String,
        status: ItemStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        found_quantity: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    /// Driver leaves the store; requires every item terminal
    StartDelivery { order_id: String },

    /// Driver hands the order to the customer
    CompleteDelivery {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        actual_delivery_fee: Option<f64>,
    },

    /// Cancel a non-terminal order
    CancelOrder {
        order_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

//! Order events - immutable facts recorded after command processing

use super::command::ActorRole;
use super::types::{ItemStatus, OrderItemSnapshot};
use serde::{Deserialize, Serialize};

/// Order event - immutable timeline record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds) - AUTHORITATIVE for state evolution
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds) - for audit and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Acting user (None for system events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Actor name (snapshot for audit)
    pub actor_name: String,
    /// Actor role
    pub actor_role: ActorRole,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl OrderEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor_id: Option<String>,
        actor_name: String,
        actor_role: ActorRole,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            client_timestamp,
            actor_id,
            actor_name,
            actor_role,
            command_id,
            event_type,
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    // Lifecycle
    OrderPlaced,
    OrderClaimed,
    ShoppingStarted,
    ShoppingCompleted,
    DeliveryStarted,
    OrderDelivered,
    OrderCancelled,

    // Items
    ItemFound,
    ItemSubstituted,
    ItemUnavailable,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderPlaced => write!(f, "ORDER_PLACED"),
            OrderEventType::OrderClaimed => write!(f, "ORDER_CLAIMED"),
            OrderEventType::ShoppingStarted => write!(f, "SHOPPING_STARTED"),
            OrderEventType::ShoppingCompleted => write!(f, "SHOPPING_COMPLETED"),
            OrderEventType::DeliveryStarted => write!(f, "DELIVERY_STARTED"),
            OrderEventType::OrderDelivered => write!(f, "ORDER_DELIVERED"),
            OrderEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventType::ItemFound => write!(f, "ITEM_FOUND"),
            OrderEventType::ItemSubstituted => write!(f, "ITEM_SUBSTITUTED"),
            OrderEventType::ItemUnavailable => write!(f, "ITEM_UNAVAILABLE"),
        }
    }
}

impl OrderEventType {
    /// Map a terminal item status to its event type.
    pub fn for_item_status(status: ItemStatus) -> Option<Self> {
        match status {
            ItemStatus::Found => Some(OrderEventType::ItemFound),
            ItemStatus::Substituted => Some(OrderEventType::ItemSubstituted),
            ItemStatus::Unavailable => Some(OrderEventType::ItemUnavailable),
            ItemStatus::Pending => None,
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderPlaced {
        customer_id: String,
        /// Complete snapshots of the priced items
        items: Vec<OrderItemSnapshot>,
        subtotal: f64,
        delivery_fee: f64,
        tip_amount: f64,
        estimated_payout: f64,
        delivery_distance: f64,
        estimated_minutes: i64,
    },

    OrderClaimed {
        driver_id: String,
        driver_name: String,
    },

    ShoppingStarted {},

    ShoppingCompleted {
        /// Item tallies at completion, for the audit trail
        found_count: i32,
        substituted_count: i32,
        unavailable_count: i32,
    },

    DeliveryStarted {},

    OrderDelivered {
        #[serde(skip_serializing_if = "Option::is_none")]
        actual_delivery_fee: Option<f64>,
        final_total: f64,
    },

    OrderCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Items ==========
    ItemStatusUpdated {
        item_id: String,
        item_name: String,
        status: ItemStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        found_quantity: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_for_item_status() {
        assert_eq!(
            OrderEventType::for_item_status(ItemStatus::Found),
            Some(OrderEventType::ItemFound)
        );
        assert_eq!(
            OrderEventType::for_item_status(ItemStatus::Substituted),
            Some(OrderEventType::ItemSubstituted)
        );
        assert_eq!(
            OrderEventType::for_item_status(ItemStatus::Unavailable),
            Some(OrderEventType::ItemUnavailable)
        );
        assert_eq!(OrderEventType::for_item_status(ItemStatus::Pending), None);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = OrderEvent::new(
            7,
            "order-1".to_string(),
            Some("driver-1".to_string()),
            "Dana".to_string(),
            ActorRole::Driver,
            "cmd-1".to_string(),
            Some(1_700_000_000_000),
            OrderEventType::OrderClaimed,
            EventPayload::OrderClaimed {
                driver_id: "driver-1".to_string(),
                driver_name: "Dana".to_string(),
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        let parsed: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.event_type, OrderEventType::OrderClaimed);
        assert_eq!(parsed.actor_id.as_deref(), Some("driver-1"));
    }
}

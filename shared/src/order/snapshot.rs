//! Order snapshot - computed state from event stream
//!
//! The snapshot includes a `state_checksum` field for drift detection.
//! Clients can compare their locally computed checksum with the server's
//! to detect if the reducer logic has diverged.

use super::types::{ItemStatus, OrderItemSnapshot};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, waiting in the claimable feed
    #[default]
    Pending,
    /// Claimed by a driver, items being picked
    Shopping,
    /// Driver en route to the customer
    Delivering,
    /// Handed off to the customer (terminal)
    Delivered,
    /// Cancelled before delivery (terminal)
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Order snapshot - computed from event stream
///
/// Invariant: `driver_id` is `Some` exactly when status is
/// Shopping, Delivering or Delivered (cancellation freezes whatever
/// value was present at cancel time).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by server)
    pub order_id: String,
    /// Customer who placed the order
    pub customer_id: String,
    /// Order status
    pub status: OrderStatus,
    /// Assigned driver (set on claim)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    /// Driver name snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    /// Items in the order
    pub items: Vec<OrderItemSnapshot>,
    /// Sum of line prices
    pub subtotal: f64,
    /// Quoted delivery fee
    pub delivery_fee: f64,
    /// Delivery fee actually paid out (set on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery_fee: Option<f64>,
    /// Customer tip
    #[serde(default)]
    pub tip_amount: f64,
    /// Estimated driver payout, used by feed filters/sorts
    pub estimated_payout: f64,
    /// Delivery distance in distance-units
    pub delivery_distance: f64,
    /// Estimated fulfillment time in minutes
    pub estimated_minutes: i64,
    /// Creation timestamp
    pub created_at: i64,
    /// When a driver claimed the order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<i64>,
    /// When the driver started picking items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping_started_at: Option<i64>,
    /// When the driver left the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_started_at: Option<i64>,
    /// When the order was handed off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    /// When the order was cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    /// Last update timestamp
    pub updated_at: i64,
    /// Last applied event sequence (for incremental updates)
    pub last_sequence: u64,
    /// State checksum for drift detection (hex string)
    /// Computed from: items.len, subtotal, last_sequence, status,
    /// driver presence. Clients compare their computed checksum with
    /// this value to detect reducer drift and trigger full sync.
    #[serde(default)]
    pub state_checksum: String,
}

impl OrderSnapshot {
    /// Create a new empty pending order
    pub fn new(order_id: String) -> Self {
        let now = crate::util::now_millis();
        let mut snapshot = Self {
            order_id,
            customer_id: String::new(),
            status: OrderStatus::Pending,
            driver_id: None,
            driver_name: None,
            items: Vec::new(),
            subtotal: 0.0,
            delivery_fee: 0.0,
            actual_delivery_fee: None,
            tip_amount: 0.0,
            estimated_payout: 0.0,
            delivery_distance: 0.0,
            estimated_minutes: 0,
            created_at: now,
            accepted_at: None,
            shopping_started_at: None,
            delivery_started_at: None,
            delivered_at: None,
            cancelled_at: None,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    /// Check if order can appear in the claimable feed
    pub fn is_claimable(&self) -> bool {
        self.status == OrderStatus::Pending && self.driver_id.is_none()
    }

    /// Check if order reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress step for UI display: 1 pending, 2 shopping,
    /// 3 delivering, 4 delivered, 0 cancelled.
    pub fn progress_step(&self) -> u8 {
        match self.status {
            OrderStatus::Pending => 1,
            OrderStatus::Shopping => 2,
            OrderStatus::Delivering => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 0,
        }
    }

    /// Find an item by its instance ID
    pub fn find_item(&self, item_id: &str) -> Option<&OrderItemSnapshot> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Whether every item carries a terminal shopping status
    pub fn all_items_resolved(&self) -> bool {
        self.items.iter().all(|i| i.status.is_terminal())
    }

    /// Item tallies by terminal status: (found, substituted, unavailable)
    pub fn item_tallies(&self) -> (i32, i32, i32) {
        let mut found = 0;
        let mut substituted = 0;
        let mut unavailable = 0;
        for item in &self.items {
            match item.status {
                ItemStatus::Found => found += 1,
                ItemStatus::Substituted => substituted += 1,
                ItemStatus::Unavailable => unavailable += 1,
                ItemStatus::Pending => {}
            }
        }
        (found, substituted, unavailable)
    }

    /// Final order total: subtotal + (actual or quoted) delivery fee + tip
    pub fn final_total(&self) -> f64 {
        self.subtotal + self.actual_delivery_fee.unwrap_or(self.delivery_fee) + self.tip_amount
    }

    /// Compute state checksum for drift detection
    ///
    /// The checksum is computed from key state fields that should match
    /// between server and client after applying the same events.
    /// Returns a 16-character hex string.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();

        // Hash item count
        self.items.len().hash(&mut hasher);

        // Hash subtotal in cents (avoid float precision issues)
        ((self.subtotal * 100.0).round() as i64).hash(&mut hasher);

        // Hash last sequence
        self.last_sequence.hash(&mut hasher);

        // Hash status discriminant
        (self.status as u8).hash(&mut hasher);

        // Hash driver assignment
        self.driver_id.hash(&mut hasher);

        // Return as hex string
        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Verify that the state_checksum matches computed checksum
    /// Returns true if checksum matches, false if drift detected
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

impl Default for OrderSnapshot {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_claimable() {
        let snapshot = OrderSnapshot::new("order-1".to_string());
        assert!(snapshot.is_claimable());
        assert!(!snapshot.is_terminal());
        assert_eq!(snapshot.progress_step(), 1);
        assert!(snapshot.verify_checksum());
    }

    #[test]
    fn test_claimed_order_not_claimable() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.status = OrderStatus::Shopping;
        snapshot.driver_id = Some("driver-1".to_string());
        assert!(!snapshot.is_claimable());
        assert_eq!(snapshot.progress_step(), 2);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shopping.is_terminal());
        assert!(!OrderStatus::Delivering.is_terminal());
    }

    #[test]
    fn test_checksum_changes_with_state() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        let initial = snapshot.compute_checksum();

        snapshot.last_sequence = 5;
        assert_ne!(snapshot.compute_checksum(), initial);
        assert!(!snapshot.verify_checksum());

        snapshot.update_checksum();
        assert!(snapshot.verify_checksum());
    }

    #[test]
    fn test_final_total_prefers_actual_fee() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.subtotal = 40.0;
        snapshot.delivery_fee = 5.0;
        snapshot.tip_amount = 3.0;
        assert!((snapshot.final_total() - 48.0).abs() < f64::EPSILON);

        snapshot.actual_delivery_fee = Some(7.5);
        assert!((snapshot.final_total() - 50.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_item_tallies() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        for (i, status) in [
            ItemStatus::Found,
            ItemStatus::Found,
            ItemStatus::Substituted,
            ItemStatus::Unavailable,
            ItemStatus::Pending,
        ]
        .into_iter()
        .enumerate()
        {
            snapshot.items.push(OrderItemSnapshot {
                item_id: format!("item-{i}"),
                product_id: format!("prod-{i}"),
                name: format!("Product {i}"),
                weight_based: false,
                quantity: 1,
                selected_weight: None,
                unit_price: 1.0,
                price: 1.0,
                status,
                found_quantity: None,
                note: None,
            });
        }
        assert_eq!(snapshot.item_tallies(), (2, 1, 1));
        assert!(!snapshot.all_items_resolved());
    }
}

//! Shared types for order event sourcing

use serde::{Deserialize, Serialize};

// ============================================================================
// Item Types
// ============================================================================

/// Per-item shopping status set by the driver while shopping
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Not yet picked
    #[default]
    Pending,
    /// Found as requested
    Found,
    /// Replaced with a comparable product
    Substituted,
    /// Could not be fulfilled
    Unavailable,
}

impl ItemStatus {
    /// Terminal statuses end the shopping phase for an item; delivery
    /// cannot start until every item carries one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

/// Order item snapshot - complete snapshot for event recording
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemSnapshot {
    /// Item instance ID (content-addressed hash)
    pub item_id: String,
    /// Catalog product reference
    pub product_id: String,
    /// Product name snapshot
    pub name: String,
    /// Whether the product is priced by weight
    #[serde(default)]
    pub weight_based: bool,
    /// Unit count (fixed at 1 for weight-based items)
    pub quantity: i32,
    /// Selected weight (weight-based items only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_weight: Option<f64>,
    /// Per-unit (or per-weight-unit) price used by the valuator
    pub unit_price: f64,
    /// Line price computed by the pricing valuator
    pub price: f64,
    /// Shopping status, updated by the driver
    #[serde(default)]
    pub status: ItemStatus,
    /// Quantity actually found (set with a terminal status)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_quantity: Option<i32>,
    /// Item note (e.g., substitution details)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Cart line input - the checkout form of a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Catalog product reference
    pub product_id: String,
    /// Product name (display snapshot; server prefers its catalog)
    pub name: String,
    /// Unit count (unit-based lines; 1 for weight-based lines)
    pub quantity: i32,
    /// Selected weight (weight-based lines only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_weight: Option<f64>,
    /// Client-side unit price (server recomputes from its catalog
    /// when the product resolves)
    pub unit_price: f64,
    /// Client-computed line price estimate
    pub price: f64,
}

// ============================================================================
// Command Response Types
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// New order ID (only for PlaceOrder command)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            error: None,
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    /// Claim conflict: order no longer pending/unassigned
    OrderAlreadyClaimed,
    /// Claim rejected: driver already holds an active order
    DriverHasActiveOrder,
    OrderAlreadyDelivered,
    OrderAlreadyCancelled,
    ItemNotFound,
    InvalidWeight,
    InvalidQuantity,
    InvalidOperation,
    DuplicateCommand,
    InternalError,
    // Storage errors
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}

impl CommandErrorCode {
    /// Claim conflicts are the errors a driver recovers from by
    /// refreshing the feed rather than retrying the same request.
    pub fn is_claim_conflict(&self) -> bool {
        matches!(
            self,
            CommandErrorCode::OrderAlreadyClaimed | CommandErrorCode::DriverHasActiveOrder
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_terminal() {
        assert!(!ItemStatus::Pending.is_terminal());
        assert!(ItemStatus::Found.is_terminal());
        assert!(ItemStatus::Substituted.is_terminal());
        assert!(ItemStatus::Unavailable.is_terminal());
    }

    #[test]
    fn test_claim_conflict_codes() {
        assert!(CommandErrorCode::OrderAlreadyClaimed.is_claim_conflict());
        assert!(CommandErrorCode::DriverHasActiveOrder.is_claim_conflict());
        assert!(!CommandErrorCode::OrderNotFound.is_claim_conflict());
        assert!(!CommandErrorCode::InvalidOperation.is_claim_conflict());
    }

    #[test]
    fn test_command_response_roundtrip() {
        let resp = CommandResponse::error(
            "cmd-1".to_string(),
            CommandError::new(CommandErrorCode::OrderAlreadyClaimed, "claimed elsewhere"),
        );
        let json = serde_json::to_string(&resp).unwrap();
        let parsed: CommandResponse = serde_json::from_str(&json).unwrap();
        assert!(!parsed.success);
        assert_eq!(
            parsed.error.unwrap().code,
            CommandErrorCode::OrderAlreadyClaimed
        );
    }
}

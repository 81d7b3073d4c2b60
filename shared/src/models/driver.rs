//! Driver Model

use serde::{Deserialize, Serialize};

/// Delivery driver entity
///
/// The driver's active order is derived server-side from the order
/// store (driver index), never tracked as a field here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    /// Online/offline toggle. Going offline hides the claimable feed
    /// but never releases an in-progress order.
    pub is_online: bool,
}

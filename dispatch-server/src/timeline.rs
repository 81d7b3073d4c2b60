//! Performance metrics derived from order phase timestamps
//!
//! Durations are computed from the snapshot's server timestamps; a
//! metric is omitted when either endpoint is missing (e.g. the order
//! was cancelled mid-phase).

use serde::{Deserialize, Serialize};
use shared::order::{OrderEvent, OrderEventType, OrderSnapshot};

/// Phase durations for a single order, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PerformanceMetrics {
    /// shopping_started_at -> delivery_started_at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping_duration: Option<i64>,
    /// delivery_started_at -> delivered_at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_duration: Option<i64>,
    /// accepted_at -> delivered_at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_processing_time: Option<i64>,
}

impl PerformanceMetrics {
    pub fn from_snapshot(snapshot: &OrderSnapshot) -> Self {
        Self {
            shopping_duration: duration(snapshot.shopping_started_at, snapshot.delivery_started_at),
            delivery_duration: duration(snapshot.delivery_started_at, snapshot.delivered_at),
            total_processing_time: duration(snapshot.accepted_at, snapshot.delivered_at),
        }
    }

    /// Like `from_snapshot`, but when delivery has not started the
    /// shopping phase ends at the ShoppingCompleted event instead.
    pub fn from_snapshot_and_events(snapshot: &OrderSnapshot, events: &[OrderEvent]) -> Self {
        let mut metrics = Self::from_snapshot(snapshot);
        if metrics.shopping_duration.is_none() {
            let shopping_completed_at = events
                .iter()
                .find(|e| e.event_type == OrderEventType::ShoppingCompleted)
                .map(|e| e.timestamp);
            metrics.shopping_duration =
                duration(snapshot.shopping_started_at, shopping_completed_at);
        }
        metrics
    }
}

fn duration(start: Option<i64>, end: Option<i64>) -> Option<i64> {
    match (start, end) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => None,
    }
}

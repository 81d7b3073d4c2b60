//! Rendered order timeline
//!
//! Turns the raw event stream into display entries for the order
//! detail screen.

use chrono::DateTime;
use dispatch_server::PerformanceMetrics;
use serde::Serialize;
use shared::order::{EventPayload, OrderEvent, OrderEventType};

use crate::error::{ClientError, ClientResult};
use crate::service::OrderService;

/// One rendered timeline row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub icon: &'static str,
    pub title: String,
    /// Who acted; system events fall back to "System"
    pub actor: String,
    /// Server timestamp, Unix milliseconds
    pub timestamp: i64,
    /// Clock label (UTC, HH:MM)
    pub time_label: String,
    /// Age relative to now ("just now", "5 minutes ago", ...)
    pub relative_label: String,
}

const MINUTE_MILLIS: i64 = 60 * 1000;
const HOUR_MILLIS: i64 = 60 * MINUTE_MILLIS;
const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Human age of a timestamp relative to `now_millis`
pub fn relative_label(timestamp_millis: i64, now_millis: i64) -> String {
    let age = now_millis.saturating_sub(timestamp_millis);
    if age < MINUTE_MILLIS {
        return "just now".to_string();
    }
    let (count, unit) = if age < HOUR_MILLIS {
        (age / MINUTE_MILLIS, "minute")
    } else if age < DAY_MILLIS {
        (age / HOUR_MILLIS, "hour")
    } else {
        (age / DAY_MILLIS, "day")
    };
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn icon_for(event_type: OrderEventType) -> &'static str {
    match event_type {
        OrderEventType::OrderPlaced => "📦",
        OrderEventType::OrderClaimed => "🙋",
        OrderEventType::ShoppingStarted => "🛒",
        OrderEventType::ShoppingCompleted => "🧾",
        OrderEventType::DeliveryStarted => "🚗",
        OrderEventType::OrderDelivered => "🏠",
        OrderEventType::OrderCancelled => "🚫",
        OrderEventType::ItemFound => "✅",
        OrderEventType::ItemSubstituted => "🔄",
        OrderEventType::ItemUnavailable => "❌",
    }
}

fn title_for(event: &OrderEvent) -> String {
    match (&event.event_type, &event.payload) {
        (OrderEventType::OrderPlaced, EventPayload::OrderPlaced { items, .. }) => {
            format!("Order placed ({} items)", items.len())
        }
        (OrderEventType::OrderClaimed, EventPayload::OrderClaimed { driver_name, .. }) => {
            format!("Claimed by {driver_name}")
        }
        (OrderEventType::ShoppingStarted, _) => "Shopping started".to_string(),
        (
            OrderEventType::ShoppingCompleted,
            EventPayload::ShoppingCompleted {
                found_count,
                substituted_count,
                unavailable_count,
            },
        ) => format!(
            "Shopping done: {found_count} found, {substituted_count} substituted, {unavailable_count} unavailable"
        ),
        (OrderEventType::DeliveryStarted, _) => "Out for delivery".to_string(),
        (OrderEventType::OrderDelivered, EventPayload::OrderDelivered { final_total, .. }) => {
            format!("Delivered, total {final_total:.2}")
        }
        (OrderEventType::OrderCancelled, EventPayload::OrderCancelled { reason }) => {
            match reason {
                Some(reason) => format!("Cancelled: {reason}"),
                None => "Cancelled".to_string(),
            }
        }
        (
            OrderEventType::ItemFound | OrderEventType::ItemSubstituted
            | OrderEventType::ItemUnavailable,
            EventPayload::ItemStatusUpdated { item_name, .. },
        ) => {
            let verb = match event.event_type {
                OrderEventType::ItemFound => "found",
                OrderEventType::ItemSubstituted => "substituted",
                _ => "unavailable",
            };
            format!("{item_name}: {verb}")
        }
        _ => event.event_type.to_string(),
    }
}

fn time_label(timestamp_millis: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Rendered timeline plus derived phase metrics for one order
#[derive(Debug, Clone, Serialize)]
pub struct OrderTimeline {
    pub entries: Vec<TimelineEntry>,
    pub metrics: PerformanceMetrics,
}

/// Fetch and render the full timeline for an order
pub async fn fetch_timeline(
    service: &dyn OrderService,
    order_id: &str,
) -> ClientResult<OrderTimeline> {
    let snapshot = service
        .order(order_id)
        .await?
        .ok_or_else(|| ClientError::NotFound(order_id.to_string()))?;
    let events = service.order_events(order_id).await?;
    Ok(OrderTimeline {
        entries: render_timeline(&events, shared::util::now_millis()),
        metrics: PerformanceMetrics::from_snapshot_and_events(&snapshot, &events),
    })
}

/// Render the event stream as timeline entries, oldest first
pub fn render_timeline(events: &[OrderEvent], now_millis: i64) -> Vec<TimelineEntry> {
    events
        .iter()
        .map(|event| TimelineEntry {
            icon: icon_for(event.event_type),
            title: title_for(event),
            actor: if event.actor_name.is_empty() {
                "System".to_string()
            } else {
                event.actor_name.clone()
            },
            timestamp: event.timestamp,
            time_label: time_label(event.timestamp),
            relative_label: relative_label(event.timestamp, now_millis),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::command::ActorRole;

    fn event(
        event_type: OrderEventType,
        actor_name: &str,
        payload: EventPayload,
    ) -> OrderEvent {
        OrderEvent::new(
            1,
            "order-1".to_string(),
            Some("driver-1".to_string()),
            actor_name.to_string(),
            ActorRole::Driver,
            "cmd-1".to_string(),
            None,
            event_type,
            payload,
        )
    }

    #[test]
    fn test_render_claim_entry() {
        let events = vec![event(
            OrderEventType::OrderClaimed,
            "Dana",
            EventPayload::OrderClaimed {
                driver_id: "driver-1".to_string(),
                driver_name: "Dana".to_string(),
            },
        )];

        let now = events[0].timestamp + 5 * MINUTE_MILLIS;
        let entries = render_timeline(&events, now);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].icon, "🙋");
        assert_eq!(entries[0].title, "Claimed by Dana");
        assert_eq!(entries[0].actor, "Dana");
        assert_eq!(entries[0].time_label.len(), 5);
        assert_eq!(entries[0].relative_label, "5 minutes ago");
    }

    #[test]
    fn test_relative_label_buckets() {
        let now = 1_000_000_000_000;
        assert_eq!(relative_label(now - 30_000, now), "just now");
        assert_eq!(relative_label(now - MINUTE_MILLIS, now), "1 minute ago");
        assert_eq!(relative_label(now - 45 * MINUTE_MILLIS, now), "45 minutes ago");
        assert_eq!(relative_label(now - 3 * HOUR_MILLIS, now), "3 hours ago");
        assert_eq!(relative_label(now - 2 * DAY_MILLIS, now), "2 days ago");
        // Clock skew never yields a negative age
        assert_eq!(relative_label(now + MINUTE_MILLIS, now), "just now");
    }

    #[test]
    fn test_blank_actor_falls_back_to_system() {
        let events = vec![event(
            OrderEventType::OrderCancelled,
            "",
            EventPayload::OrderCancelled { reason: None },
        )];

        let entries = render_timeline(&events, events[0].timestamp);
        assert_eq!(entries[0].actor, "System");
        assert_eq!(entries[0].title, "Cancelled");
        assert_eq!(entries[0].relative_label, "just now");
    }

    #[test]
    fn test_item_entry_titles() {
        use shared::order::types::ItemStatus;
        let events = vec![event(
            OrderEventType::ItemSubstituted,
            "Dana",
            EventPayload::ItemStatusUpdated {
                item_id: "item-1".to_string(),
                item_name: "Salmon".to_string(),
                status: ItemStatus::Substituted,
                found_quantity: None,
                note: None,
            },
        )];

        let entries = render_timeline(&events, events[0].timestamp);
        assert_eq!(entries[0].title, "Salmon: substituted");
        assert_eq!(entries[0].icon, "🔄");
    }
}

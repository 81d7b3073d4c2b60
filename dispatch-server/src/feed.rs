//! Driver feed projection
//!
//! Filters and sorts claimable order snapshots into the list a driver
//! browses. The feed is a pure projection: it never mutates snapshots
//! and claim conflicts are resolved by the manager, not here.

use serde::{Deserialize, Serialize};
use shared::order::OrderSnapshot;

/// Payout threshold for the high-pay filter, in currency units
pub const HIGH_PAY_THRESHOLD: f64 = 15.0;

/// Distance ceiling for the nearby filter, in distance-units
pub const NEARBY_MAX_DISTANCE: f64 = 3.0;

const HOUR_MILLIS: i64 = 60 * 60 * 1000;

/// How soon an order wants to go out, derived from its age
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    /// Placed within the last hour
    Asap,
    /// Placed within the last four hours
    Today,
    /// Older than four hours
    TodayEvening,
}

impl Urgency {
    /// Classify an order by how long it has been waiting
    pub fn for_order(snapshot: &OrderSnapshot, now_millis: i64) -> Self {
        let age = now_millis.saturating_sub(snapshot.created_at);
        if age < HOUR_MILLIS {
            Urgency::Asap
        } else if age < 4 * HOUR_MILLIS {
            Urgency::Today
        } else {
            Urgency::TodayEvening
        }
    }
}

/// Feed filters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedFilter {
    #[default]
    All,
    /// Estimated payout at or above the high-pay threshold
    HighPay,
    /// Delivery distance within the nearby ceiling
    Nearby,
    /// Orders that want to go out now
    Urgent,
}

impl FeedFilter {
    fn matches(&self, snapshot: &OrderSnapshot, now_millis: i64) -> bool {
        match self {
            FeedFilter::All => true,
            FeedFilter::HighPay => snapshot.estimated_payout >= HIGH_PAY_THRESHOLD,
            FeedFilter::Nearby => snapshot.delivery_distance <= NEARBY_MAX_DISTANCE,
            FeedFilter::Urgent => Urgency::for_order(snapshot, now_millis) == Urgency::Asap,
        }
    }
}

/// Feed sort orders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedSort {
    /// Longest-waiting orders first
    #[default]
    Oldest,
    Newest,
    /// Highest estimated payout first
    Payout,
    /// Shortest delivery distance first
    Distance,
    /// Shortest estimated fulfillment time first
    Time,
}

/// Filter then sort claimable orders for display
///
/// Ties (and the Payout/Distance/Time sorts on equal keys) fall back to
/// created_at ascending, so the feed order is stable.
pub fn project_feed(
    mut orders: Vec<OrderSnapshot>,
    filter: FeedFilter,
    sort: FeedSort,
    now_millis: i64,
) -> Vec<OrderSnapshot> {
    orders.retain(|o| filter.matches(o, now_millis));

    match sort {
        FeedSort::Oldest => orders.sort_by_key(|o| o.created_at),
        FeedSort::Newest => orders.sort_by_key(|o| std::cmp::Reverse(o.created_at)),
        FeedSort::Payout => orders.sort_by(|a, b| {
            b.estimated_payout
                .total_cmp(&a.estimated_payout)
                .then(a.created_at.cmp(&b.created_at))
        }),
        FeedSort::Distance => orders.sort_by(|a, b| {
            a.delivery_distance
                .total_cmp(&b.delivery_distance)
                .then(a.created_at.cmp(&b.created_at))
        }),
        FeedSort::Time => orders.sort_by(|a, b| {
            a.estimated_minutes
                .cmp(&b.estimated_minutes)
                .then(a.created_at.cmp(&b.created_at))
        }),
    }

    orders
}

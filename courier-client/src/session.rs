//! Driver session state
//!
//! Holds everything the driver-facing UI binds to: online state, the
//! projected feed, and the one active order. Feed refreshes are
//! generation-stamped so a slow response can never overwrite a newer
//! one, and claims are guarded against double-submission.

use dispatch_server::{project_feed, FeedFilter, FeedSort};
use shared::models::Driver;
use shared::order::command::ActorRole;
use shared::order::types::ItemStatus;
use shared::order::{OrderCommand, OrderCommandPayload, OrderSnapshot, OrderStatus};
use shared::util::now_millis;
use std::sync::Arc;

use crate::error::{ClientError, ClientResult};
use crate::service::{expect_success, OrderService};

/// Compact view of the order a driver is working, for the session
/// header: progress plus time spent since the claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveOrderSummary {
    pub order_id: String,
    pub status: OrderStatus,
    pub items_total: usize,
    pub items_resolved: usize,
    /// Time since the order was claimed, milliseconds
    pub elapsed_millis: i64,
}

/// Driver-facing session over an order service
pub struct DriverSession {
    service: Arc<dyn OrderService>,
    driver_id: String,
    driver_name: String,
    is_online: bool,
    filter: FeedFilter,
    sort: FeedSort,
    feed: Vec<OrderSnapshot>,
    active_order: Option<OrderSnapshot>,
    /// Stamp for the most recent refresh; older completions are dropped
    refresh_generation: u64,
    claim_in_flight: bool,
}

impl DriverSession {
    pub fn new(
        service: Arc<dyn OrderService>,
        driver_id: impl Into<String>,
        driver_name: impl Into<String>,
    ) -> Self {
        Self {
            service,
            driver_id: driver_id.into(),
            driver_name: driver_name.into(),
            is_online: false,
            filter: FeedFilter::default(),
            sort: FeedSort::default(),
            feed: Vec::new(),
            active_order: None,
            refresh_generation: 0,
            claim_in_flight: false,
        }
    }

    /// Start a session from a stored driver profile, honoring its
    /// online flag
    pub fn from_profile(service: Arc<dyn OrderService>, driver: &Driver) -> Self {
        let mut session = Self::new(service, driver.id.clone(), driver.name.clone());
        session.set_online(driver.is_online);
        session
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    /// Current driver profile view
    pub fn profile(&self) -> Driver {
        Driver {
            id: self.driver_id.clone(),
            name: self.driver_name.clone(),
            is_online: self.is_online,
        }
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn feed(&self) -> &[OrderSnapshot] {
        &self.feed
    }

    pub fn active_order(&self) -> Option<&OrderSnapshot> {
        self.active_order.as_ref()
    }

    /// Summarize the active order at `now_millis`. Elapsed time counts
    /// from the claim (falling back to placement for odd data).
    pub fn active_summary(&self, now_millis: i64) -> Option<ActiveOrderSummary> {
        let order = self.active_order.as_ref()?;
        let started = order.accepted_at.unwrap_or(order.created_at);
        Some(ActiveOrderSummary {
            order_id: order.order_id.clone(),
            status: order.status,
            items_total: order.items.len(),
            items_resolved: order
                .items
                .iter()
                .filter(|i| i.status.is_terminal())
                .count(),
            elapsed_millis: now_millis.saturating_sub(started),
        })
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    pub fn sort(&self) -> FeedSort {
        self.sort
    }

    fn driver_command(&self, payload: OrderCommandPayload) -> OrderCommand {
        OrderCommand::new(
            Some(self.driver_id.clone()),
            self.driver_name.clone(),
            ActorRole::Driver,
            payload,
        )
    }

    // ========== Online toggle ==========

    /// Going offline empties the feed but never abandons an order the
    /// driver already holds.
    pub fn set_online(&mut self, online: bool) {
        if self.is_online == online {
            return;
        }
        self.is_online = online;
        if !online {
            self.feed.clear();
            // Invalidate any refresh still in flight
            self.refresh_generation += 1;
            tracing::debug!(driver_id = %self.driver_id, "Driver went offline, feed cleared");
        }
    }

    // ========== Feed ==========

    pub fn set_filter(&mut self, filter: FeedFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: FeedSort) {
        self.sort = sort;
    }

    /// Stamp the start of a refresh. The matching `complete_refresh`
    /// call only lands if no newer refresh (or offline toggle) happened
    /// in between.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_generation += 1;
        self.refresh_generation
    }

    /// Apply a fetched order list; stale responses are dropped.
    /// Returns whether the feed was updated.
    pub fn complete_refresh(&mut self, generation: u64, orders: Vec<OrderSnapshot>) -> bool {
        if generation != self.refresh_generation {
            tracing::debug!(
                generation,
                current = self.refresh_generation,
                "Dropping stale feed refresh"
            );
            return false;
        }
        if !self.is_online {
            return false;
        }
        self.feed = project_feed(orders, self.filter, self.sort, now_millis());
        true
    }

    /// Fetch and project the feed in one step
    pub async fn refresh_feed(&mut self) -> ClientResult<usize> {
        if !self.is_online {
            return Ok(0);
        }
        let generation = self.begin_refresh();
        let orders = self.service.claimable_orders().await?;
        self.complete_refresh(generation, orders);
        Ok(self.feed.len())
    }

    // ========== Claim ==========

    /// Claim an order from the feed
    ///
    /// On a conflict (someone else won, or this driver already holds an
    /// order server-side) the loser's feed entry is dropped and the
    /// typed error is returned for the UI to display.
    pub async fn claim(&mut self, order_id: &str) -> ClientResult<()> {
        if self.claim_in_flight {
            return Err(ClientError::Busy("A claim is already in flight".to_string()));
        }
        if self.active_order.is_some() {
            return Err(ClientError::Validation(
                "Finish the current order before claiming another".to_string(),
            ));
        }

        self.claim_in_flight = true;
        let result = self.claim_inner(order_id).await;
        self.claim_in_flight = false;

        if let Err(e) = &result
            && e.is_claim_conflict()
        {
            // The order is gone; drop it locally rather than waiting
            // for the next refresh
            self.feed.retain(|o| o.order_id != order_id);
        }
        result
    }

    async fn claim_inner(&mut self, order_id: &str) -> ClientResult<()> {
        let cmd = self.driver_command(OrderCommandPayload::ClaimOrder {
            order_id: order_id.to_string(),
            driver_id: self.driver_id.clone(),
            driver_name: self.driver_name.clone(),
        });
        let response = self.service.submit(cmd).await?;
        expect_success(response)?;

        self.feed.retain(|o| o.order_id != order_id);
        self.active_order = self.service.order(order_id).await?;
        Ok(())
    }

    // ========== Active order workflow ==========

    fn active_order_id(&self) -> ClientResult<String> {
        self.active_order
            .as_ref()
            .map(|o| o.order_id.clone())
            .ok_or_else(|| ClientError::Validation("No active order".to_string()))
    }

    /// Re-fetch the active order; terminal orders leave the slot
    pub async fn sync_active_order(&mut self) -> ClientResult<()> {
        self.active_order = self.service.active_order(&self.driver_id).await?;
        Ok(())
    }

    pub async fn start_shopping(&mut self) -> ClientResult<()> {
        let order_id = self.active_order_id()?;
        let cmd = self.driver_command(OrderCommandPayload::StartShopping {
            order_id: order_id.clone(),
        });
        expect_success(self.service.submit(cmd).await?)?;
        self.active_order = self.service.order(&order_id).await?;
        Ok(())
    }

    pub async fn update_item(
        &mut self,
        item_id: &str,
        status: ItemStatus,
        found_quantity: Option<i32>,
        note: Option<String>,
    ) -> ClientResult<()> {
        let order_id = self.active_order_id()?;
        let cmd = self.driver_command(OrderCommandPayload::UpdateItemStatus {
            order_id: order_id.clone(),
            item_id: item_id.to_string(),
            status,
            found_quantity,
            note,
        });
        expect_success(self.service.submit(cmd).await?)?;
        self.active_order = self.service.order(&order_id).await?;
        Ok(())
    }

    pub async fn start_delivery(&mut self) -> ClientResult<()> {
        let order_id = self.active_order_id()?;
        let cmd = self.driver_command(OrderCommandPayload::StartDelivery {
            order_id: order_id.clone(),
        });
        expect_success(self.service.submit(cmd).await?)?;
        self.active_order = self.service.order(&order_id).await?;
        Ok(())
    }

    pub async fn complete_delivery(
        &mut self,
        actual_delivery_fee: Option<f64>,
    ) -> ClientResult<OrderSnapshot> {
        let order_id = self.active_order_id()?;
        let cmd = self.driver_command(OrderCommandPayload::CompleteDelivery {
            order_id: order_id.clone(),
            actual_delivery_fee,
        });
        expect_success(self.service.submit(cmd).await?)?;

        let delivered = self
            .service
            .order(&order_id)
            .await?
            .ok_or_else(|| ClientError::NotFound(order_id.clone()))?;
        self.active_order = None;
        Ok(delivered)
    }

    /// Abandon the active order
    pub async fn abandon_order(&mut self, reason: Option<String>) -> ClientResult<()> {
        let order_id = self.active_order_id()?;
        let cmd = self.driver_command(OrderCommandPayload::CancelOrder {
            order_id: order_id.clone(),
            reason,
        });
        expect_success(self.service.submit(cmd).await?)?;
        self.active_order = None;
        Ok(())
    }

    /// Drop a terminal active order locally (e.g. the customer
    /// cancelled while the driver was shopping)
    pub fn clear_terminal_order(&mut self) {
        if let Some(order) = &self.active_order
            && matches!(
                order.status,
                OrderStatus::Delivered | OrderStatus::Cancelled
            )
        {
            self.active_order = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared::order::{CommandResponse, OrderEvent};

    /// Canned service: returns a fixed claimable list, accepts all
    /// commands
    struct StubService {
        orders: Mutex<Vec<OrderSnapshot>>,
    }

    impl StubService {
        fn with_orders(orders: Vec<OrderSnapshot>) -> Arc<Self> {
            Arc::new(Self {
                orders: Mutex::new(orders),
            })
        }
    }

    #[async_trait]
    impl OrderService for StubService {
        async fn submit(&self, cmd: OrderCommand) -> ClientResult<CommandResponse> {
            Ok(CommandResponse::success(cmd.command_id, None))
        }

        async fn claimable_orders(&self) -> ClientResult<Vec<OrderSnapshot>> {
            Ok(self.orders.lock().clone())
        }

        async fn order(&self, order_id: &str) -> ClientResult<Option<OrderSnapshot>> {
            Ok(self
                .orders
                .lock()
                .iter()
                .find(|o| o.order_id == order_id)
                .cloned())
        }

        async fn active_order(&self, _driver_id: &str) -> ClientResult<Option<OrderSnapshot>> {
            Ok(None)
        }

        async fn order_events(&self, _order_id: &str) -> ClientResult<Vec<OrderEvent>> {
            Ok(vec![])
        }

        async fn epoch(&self) -> ClientResult<String> {
            Ok("test-epoch".to_string())
        }
    }

    fn snapshot(order_id: &str) -> OrderSnapshot {
        let mut s = OrderSnapshot::new(order_id.to_string());
        s.created_at = now_millis();
        s
    }

    #[tokio::test]
    async fn test_offline_session_has_empty_feed() {
        let service = StubService::with_orders(vec![snapshot("o1")]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");

        let count = session.refresh_feed().await.unwrap();
        assert_eq!(count, 0);
        assert!(session.feed().is_empty());

        session.set_online(true);
        let count = session.refresh_feed().await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_going_offline_clears_feed() {
        let service = StubService::with_orders(vec![snapshot("o1")]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");
        session.set_online(true);
        session.refresh_feed().await.unwrap();
        assert_eq!(session.feed().len(), 1);

        session.set_online(false);
        assert!(session.feed().is_empty());
    }

    #[tokio::test]
    async fn test_stale_refresh_is_dropped() {
        let service = StubService::with_orders(vec![snapshot("o1")]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");
        session.set_online(true);

        let slow = session.begin_refresh();
        let fast = session.begin_refresh();

        // The newer refresh lands first
        assert!(session.complete_refresh(fast, vec![snapshot("o1"), snapshot("o2")]));
        assert_eq!(session.feed().len(), 2);

        // The slow response arrives afterwards and must not clobber it
        assert!(!session.complete_refresh(slow, vec![snapshot("stale")]));
        assert_eq!(session.feed().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_completing_after_offline_is_dropped() {
        let service = StubService::with_orders(vec![snapshot("o1")]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");
        session.set_online(true);

        let generation = session.begin_refresh();
        session.set_online(false);

        assert!(!session.complete_refresh(generation, vec![snapshot("o1")]));
        assert!(session.feed().is_empty());
    }

    #[tokio::test]
    async fn test_active_summary_reports_progress_and_elapsed() {
        use shared::order::OrderItemSnapshot;

        let item = |id: &str, status: ItemStatus| OrderItemSnapshot {
            item_id: id.to_string(),
            product_id: format!("prod-{id}"),
            name: format!("Item {id}"),
            weight_based: false,
            quantity: 1,
            selected_weight: None,
            unit_price: 3.0,
            price: 3.0,
            status,
            found_quantity: None,
            note: None,
        };

        let mut order = snapshot("o1");
        order.accepted_at = Some(order.created_at);
        order.items = vec![item("i1", ItemStatus::Found), item("i2", ItemStatus::Pending)];
        let accepted_at = order.accepted_at.unwrap();

        let service = StubService::with_orders(vec![order]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");
        session.set_online(true);
        session.refresh_feed().await.unwrap();

        assert!(session.active_summary(accepted_at).is_none());
        session.claim("o1").await.unwrap();

        let summary = session.active_summary(accepted_at + 90_000).unwrap();
        assert_eq!(summary.order_id, "o1");
        assert_eq!(summary.items_total, 2);
        assert_eq!(summary.items_resolved, 1);
        assert_eq!(summary.elapsed_millis, 90_000);
    }

    #[tokio::test]
    async fn test_claim_with_active_order_rejected_locally() {
        let service = StubService::with_orders(vec![snapshot("o1"), snapshot("o2")]);
        let mut session = DriverSession::new(service, "driver-1", "Dana");
        session.set_online(true);
        session.refresh_feed().await.unwrap();

        session.claim("o1").await.unwrap();
        assert!(session.active_order().is_some());

        let result = session.claim("o2").await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }
}

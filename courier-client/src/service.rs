//! Order service abstraction
//!
//! `DriverSession` talks to the dispatch engine through the
//! `OrderService` trait. `InProcessOrderService` runs the engine
//! embedded in the same process; a remote transport would implement the
//! same trait.

use async_trait::async_trait;
use dispatch_server::DispatchManager;
use shared::order::{CommandResponse, OrderCommand, OrderEvent, OrderSnapshot};
use std::sync::Arc;

use crate::error::{ClientError, ClientResult};

/// Dispatch operations the session needs
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Submit a command; the response carries success or a typed error
    async fn submit(&self, cmd: OrderCommand) -> ClientResult<CommandResponse>;

    /// All orders currently open for claiming
    async fn claimable_orders(&self) -> ClientResult<Vec<OrderSnapshot>>;

    /// One order snapshot
    async fn order(&self, order_id: &str) -> ClientResult<Option<OrderSnapshot>>;

    /// The order a driver is currently working, if any
    async fn active_order(&self, driver_id: &str) -> ClientResult<Option<OrderSnapshot>>;

    /// Full event history for one order
    async fn order_events(&self, order_id: &str) -> ClientResult<Vec<OrderEvent>>;

    /// Server instance epoch, for restart detection
    async fn epoch(&self) -> ClientResult<String>;
}

/// In-process service backed by an embedded DispatchManager
#[derive(Clone)]
pub struct InProcessOrderService {
    manager: Arc<DispatchManager>,
}

impl InProcessOrderService {
    pub fn new(manager: Arc<DispatchManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<DispatchManager> {
        &self.manager
    }
}

fn internal(e: impl std::fmt::Display) -> ClientError {
    ClientError::Internal(e.to_string())
}

#[async_trait]
impl OrderService for InProcessOrderService {
    async fn submit(&self, cmd: OrderCommand) -> ClientResult<CommandResponse> {
        Ok(self.manager.execute_command(cmd))
    }

    async fn claimable_orders(&self) -> ClientResult<Vec<OrderSnapshot>> {
        self.manager.list_claimable_orders().map_err(internal)
    }

    async fn order(&self, order_id: &str) -> ClientResult<Option<OrderSnapshot>> {
        self.manager.get_order(order_id).map_err(internal)
    }

    async fn active_order(&self, driver_id: &str) -> ClientResult<Option<OrderSnapshot>> {
        self.manager
            .get_active_order_for_driver(driver_id)
            .map_err(internal)
    }

    async fn order_events(&self, order_id: &str) -> ClientResult<Vec<OrderEvent>> {
        self.manager.get_order_events(order_id).map_err(internal)
    }

    async fn epoch(&self) -> ClientResult<String> {
        Ok(self.manager.epoch().to_string())
    }
}

/// Unwrap a command response into the new order id (if any), turning a
/// typed failure into a ClientError
pub fn expect_success(response: CommandResponse) -> ClientResult<Option<String>> {
    if response.success {
        Ok(response.order_id)
    } else {
        let error = response.error.unwrap_or_else(|| {
            shared::order::CommandError::new(
                shared::order::CommandErrorCode::InternalError,
                "Command failed without error detail",
            )
        });
        Err(ClientError::Command(error))
    }
}

//! Courier Client - driver and customer workflows for the dispatch engine
//!
//! Holds the driver session (feed, claim, shopping, delivery), the
//! customer cart, and the rendered order timeline.

pub mod cart;
pub mod error;
pub mod service;
pub mod session;
pub mod timeline;

pub use cart::{Cart, CartLine};
pub use error::{ClientError, ClientResult};
pub use service::{expect_success, InProcessOrderService, OrderService};
pub use session::{ActiveOrderSummary, DriverSession};
pub use timeline::{fetch_timeline, relative_label, render_timeline, OrderTimeline, TimelineEntry};

// Re-export shared types for convenience
pub use shared::order::{CommandResponse, OrderEvent, OrderSnapshot, OrderStatus};

//! Dispatch server core
//!
//! Event-sourced order lifecycle and driver dispatch:
//!
//! - **orders**: command processing, event generation, redb persistence
//! - **catalog**: in-memory product catalog for checkout pricing
//! - **feed**: claimable-order projections (filter/sort/urgency)
//! - **timeline**: per-order performance metrics derived from phase timestamps

pub mod catalog;
pub mod feed;
pub mod orders;
pub mod timeline;

pub use catalog::CatalogService;
pub use feed::{project_feed, FeedFilter, FeedSort, Urgency};
pub use orders::manager::{DispatchManager, ManagerError, ManagerResult};
pub use orders::storage::OrderStorage;
pub use timeline::PerformanceMetrics;

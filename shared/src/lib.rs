//! Shared types for the grocery-delivery dispatch platform
//!
//! Common types used by both the dispatch server and the courier
//! client: catalog models, order commands/events/snapshots, the
//! pricing valuator, and utility helpers.

pub mod models;
pub mod order;
pub mod pricing;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

//! Order Event Sourcing Module
//!
//! This module implements order lifecycle management using event sourcing:
//!
//! - **manager**: Core DispatchManager for command processing and event generation
//! - **storage**: redb-based persistence layer for events, snapshots, and indices
//! - **actions**: One handler per command, validation and event generation
//! - **appliers**: Pure event-to-snapshot state transitions
//! - **reducer**: Cart line conversion and snapshot replay
//!
//! # Command Flow
//!
//! ```text
//! Command → DispatchManager → Event → Storage (redb)
//!                 ↓                      ↓
//!              Broadcast          Snapshot Update
//!                 ↓
//!           All Subscribers
//! ```
//!
//! 1. Client sends OrderCommand
//! 2. DispatchManager validates and processes command
//! 3. OrderEvent is generated with global sequence
//! 4. Event is persisted to redb (transactional)
//! 5. Snapshot and dispatch indices are updated
//! 6. Event is broadcast to all subscribers
//! 7. CommandResponse is returned to client

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod reducer;
pub mod storage;
pub mod traits;

// Re-exports
pub use manager::DispatchManager;
pub use reducer::{generate_item_id, line_to_snapshot, replay_events};
pub use storage::OrderStorage;

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandErrorCode, CommandResponse, EventPayload, OrderCommand,
    OrderCommandPayload, OrderEvent, OrderEventType, OrderSnapshot, OrderStatus,
};

use super::super::storage::StorageError;
use super::super::traits::OrderError;
use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order already claimed: {0}")]
    OrderAlreadyClaimed(String),

    #[error("Driver already has an active order: {0}")]
    DriverHasActiveOrder(String),

    #[error("Order already delivered: {0}")]
    OrderAlreadyDelivered(String),

    #[error("Order already cancelled: {0}")]
    OrderAlreadyCancelled(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage error to a client-facing error code
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) => return CommandErrorCode::InternalError,
        StorageError::OrderNotFound(_) => return CommandErrorCode::OrderNotFound,
        _ => {}
    }

    // redb errors are classified by message content
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Default for Database/Transaction/Table/Storage/Commit errors
    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                let message = e.to_string();
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, message)
            }
            ManagerError::OrderNotFound(id) => (
                CommandErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            ),
            ManagerError::OrderAlreadyClaimed(id) => (
                CommandErrorCode::OrderAlreadyClaimed,
                format!("Order already claimed: {}", id),
            ),
            ManagerError::DriverHasActiveOrder(id) => (
                CommandErrorCode::DriverHasActiveOrder,
                format!("Driver already has an active order: {}", id),
            ),
            ManagerError::OrderAlreadyDelivered(id) => (
                CommandErrorCode::OrderAlreadyDelivered,
                format!("Order already delivered: {}", id),
            ),
            ManagerError::OrderAlreadyCancelled(id) => (
                CommandErrorCode::OrderAlreadyCancelled,
                format!("Order already cancelled: {}", id),
            ),
            ManagerError::ItemNotFound(id) => (
                CommandErrorCode::ItemNotFound,
                format!("Item not found: {}", id),
            ),
            ManagerError::InvalidWeight(msg) => (CommandErrorCode::InvalidWeight, msg),
            ManagerError::InvalidQuantity(msg) => (CommandErrorCode::InvalidQuantity, msg),
            ManagerError::InvalidOperation(msg) => (CommandErrorCode::InvalidOperation, msg),
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg),
        };
        CommandError::new(code, message)
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::OrderAlreadyClaimed(id) => ManagerError::OrderAlreadyClaimed(id),
            OrderError::DriverHasActiveOrder(id) => ManagerError::DriverHasActiveOrder(id),
            OrderError::OrderAlreadyDelivered(id) => ManagerError::OrderAlreadyDelivered(id),
            OrderError::OrderAlreadyCancelled(id) => ManagerError::OrderAlreadyCancelled(id),
            OrderError::ItemNotFound(id) => ManagerError::ItemNotFound(id),
            OrderError::InvalidWeight(msg) => ManagerError::InvalidWeight(msg),
            OrderError::InvalidQuantity(msg) => ManagerError::InvalidQuantity(msg),
            OrderError::InvalidOperation(msg) => ManagerError::InvalidOperation(msg),
            OrderError::Storage(msg) => ManagerError::Internal(msg),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

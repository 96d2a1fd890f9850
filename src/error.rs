/*
 * Defines the crate-wide error type and result alias. Every fallible
 * operation in the action/menu subsystem reports through `Error`; there is
 * no fatal path inside this crate. Callers decide whether a failure is
 * recoverable (e.g. ID exhaustion) or a usage bug (e.g. mutating an
 * attribute that is driven by a condition).
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The ID allocator has no free IDs left and cannot grow further.
    #[error("no more IDs available")]
    IdsExhausted,

    /// A direct mutation was attempted on an attribute that is driven by an
    /// attached condition. The condition is the sole source of truth.
    #[error("{0} is driven by a condition and cannot be set directly")]
    ConditionBound(&'static str),

    /// The attached condition does not implement `MutableCondition`, so the
    /// requested mutation cannot be routed through it.
    #[error("the attached condition does not support external mutation")]
    ConditionNotMutable,

    /// An action was expected to be a member of a list but was not found.
    #[error("action not found")]
    ActionNotFound,

    /// A native handle was missing or already destroyed.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// A native or theme operation failed.
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Domain error model.

use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant describes a rejected operation. The ledger never partially
/// applies an operation that returns one of these, so callers may resubmit
/// after correcting the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (empty name, zero price, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The listing fee supplied with `list_item` did not match the configured fee.
    #[error("listing fee mismatch: required {required}, supplied {supplied}")]
    InsufficientFee { required: u64, supplied: u64 },

    /// No item exists under the requested identifier.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// The item is not in the state the operation requires.
    #[error("item {item} is {state}, operation not allowed")]
    InvalidState { item: ItemId, state: String },

    /// The caller is not the participant allowed to perform the transition.
    #[error("unauthorized")]
    Unauthorized,

    /// The seller attempted to buy their own listing.
    #[error("seller cannot purchase their own item")]
    SelfPurchase,

    /// The payment offered is below the listed price.
    #[error("insufficient payment: price {price}, payment {payment}")]
    InsufficientPayment { price: u64, payment: u64 },

    /// The value transfer coupled with the transition was rejected.
    #[error("value transfer failed: {0}")]
    TransferFailed(String),

    /// Internal bookkeeping failure (e.g. a poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_state(item: ItemId, state: impl core::fmt::Display) -> Self {
        Self::InvalidState {
            item,
            state: state.to_string(),
        }
    }

    pub fn transfer_failed(msg: impl Into<String>) -> Self {
        Self::TransferFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable, machine-friendly name of the error kind (used in logs).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InsufficientFee { .. } => "insufficient_fee",
            Self::NotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::Unauthorized => "unauthorized",
            Self::SelfPurchase => "self_purchase",
            Self::InsufficientPayment { .. } => "insufficient_payment",
            Self::TransferFailed(_) => "transfer_failed",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = DomainError::InsufficientFee {
            required: 10,
            supplied: 3,
        };
        assert_eq!(
            err.to_string(),
            "listing fee mismatch: required 10, supplied 3"
        );

        let err = DomainError::invalid_state(ItemId::new(7), "sold");
        assert_eq!(err.to_string(), "item 7 is sold, operation not allowed");
    }

    #[test]
    fn kind_is_stable() {
        assert_eq!(DomainError::SelfPurchase.kind(), "self_purchase");
        assert_eq!(DomainError::NotFound(ItemId::new(1)).kind(), "not_found");
        assert_eq!(DomainError::transfer_failed("x").kind(), "transfer_failed");
    }
}

//! Error types for the marketplace
//!
//! Every failure a caller can trigger is a typed variant. Nothing here is
//! fatal to the process: each error is scoped to the single operation that
//! produced it and leaves state untouched.

use crate::types::{AccountId, CampusId, Money, OrderId, ProductId, ProductStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marketplace errors
#[derive(Error, Debug)]
pub enum Error {
    /// Wallet cannot cover the requested debit
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// Account being debited
        account: AccountId,
        /// Amount the operation needs
        required: Money,
        /// Current wallet balance
        available: Money,
    },

    /// Checkout attempted with no cart lines
    #[error("Cart is empty")]
    EmptyCart,

    /// Every cart line was skipped (missing or inactive products)
    #[error("No purchasable items in cart")]
    NoValidItems,

    /// Rating outside 1..=5
    #[error("Invalid rating {0}: must be between 1 and 5")]
    InvalidRating(u8),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product exists but is not on sale
    #[error("Product {product} is not available ({status})")]
    ProductNotActive {
        /// Listing the caller asked for
        product: ProductId,
        /// Its current lifecycle status
        status: ProductStatus,
    },

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Campus not found
    #[error("Campus not found: {0}")]
    CampusNotFound(CampusId),

    /// Product is not in the customer's cart
    #[error("Product {0} is not in the cart")]
    CartLineNotFound(ProductId),

    /// Wrong role or ownership for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quantity must be at least 1
    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidQuantity(u32),

    /// Product draft or patch failed validation
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Malformed operation input (boost days, delivery details, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lifecycle transition not allowed
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        /// Entity kind ("product", "order", "vendor")
        entity: &'static str,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Settlement-time total differs from the total the caller agreed to
    #[error("Price changed: expected {expected}, actual {actual}")]
    PriceChanged {
        /// Total the caller quoted
        expected: Money,
        /// Total at current catalog prices
        actual: Money,
    },

    /// Reviews require a prior purchase of the product
    #[error("Account {buyer} has not purchased product {product}")]
    PurchaseRequired {
        /// Reviewer
        buyer: AccountId,
        /// Product being reviewed
        product: ProductId,
    },

    /// Account id already registered
    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    /// Money arithmetic overflowed u64
    #[error("Amount overflow")]
    AmountOverflow,

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}

/// Stable, machine-readable failure code surfaced to UI layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Wallet too small
    InsufficientFunds,
    /// Cart had no lines
    EmptyCart,
    /// Cart had no purchasable lines
    NoValidItems,
    /// Rating out of bounds
    InvalidRating,
    /// Product id unresolved
    ProductNotFound,
    /// Product pending approval or suspended
    ProductNotActive,
    /// Wrong role, ownership or missing purchase
    PermissionDenied,
    /// Account, order, campus or cart line unresolved
    NotFound,
    /// Validation failure on caller input
    InvalidInput,
    /// Lifecycle transition rejected
    InvalidTransition,
    /// Quoted total is stale
    PriceChanged,
    /// Infrastructure failure (storage, actor, config)
    Internal,
}

impl Error {
    /// Map the error to its reason code
    pub fn reason(&self) -> ReasonCode {
        match self {
            Error::InsufficientFunds { .. } => ReasonCode::InsufficientFunds,
            Error::EmptyCart => ReasonCode::EmptyCart,
            Error::NoValidItems => ReasonCode::NoValidItems,
            Error::InvalidRating(_) => ReasonCode::InvalidRating,
            Error::ProductNotFound(_) => ReasonCode::ProductNotFound,
            Error::ProductNotActive { .. } => ReasonCode::ProductNotActive,
            Error::PermissionDenied(_) | Error::PurchaseRequired { .. } => {
                ReasonCode::PermissionDenied
            }
            Error::AccountNotFound(_)
            | Error::OrderNotFound(_)
            | Error::CampusNotFound(_)
            | Error::CartLineNotFound(_) => ReasonCode::NotFound,
            Error::InvalidQuantity(_)
            | Error::InvalidProduct(_)
            | Error::InvalidInput(_)
            | Error::DuplicateAccount(_)
            | Error::AmountOverflow => ReasonCode::InvalidInput,
            Error::InvalidTransition { .. } => ReasonCode::InvalidTransition,
            Error::PriceChanged { .. } => ReasonCode::PriceChanged,
            Error::Storage(_)
            | Error::Serialization(_)
            | Error::Concurrency(_)
            | Error::Config(_)
            | Error::Metrics(_)
            | Error::Io(_) => ReasonCode::Internal,
        }
    }

    /// True for failures caused by caller input rather than infrastructure
    pub fn is_user_facing(&self) -> bool {
        self.reason() != ReasonCode::Internal
    }
}

/// Uniform `{ok, message, reason}` result handed to UI layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the operation succeeded
    pub ok: bool,

    /// Human-readable message
    pub message: String,

    /// Failure code (None on success)
    pub reason: Option<ReasonCode>,
}

impl Outcome {
    /// Successful outcome
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            reason: None,
        }
    }

    /// Failed outcome from an error
    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
            reason: Some(err.reason()),
        }
    }

    /// Fold a result into an outcome, rendering the success message from the value
    pub fn from_result<T>(result: &Result<T>, on_success: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self::success(on_success(value)),
            Err(err) => Self::failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(Error::EmptyCart.reason(), ReasonCode::EmptyCart);
        assert_eq!(Error::InvalidRating(6).reason(), ReasonCode::InvalidRating);
        assert_eq!(
            Error::OrderNotFound(OrderId::generate()).reason(),
            ReasonCode::NotFound
        );
        assert_eq!(
            Error::Concurrency("closed".to_string()).reason(),
            ReasonCode::Internal
        );
        assert!(!Error::Concurrency("closed".to_string()).is_user_facing());

        let inactive = Error::ProductNotActive {
            product: ProductId::new("p9"),
            status: ProductStatus::Suspended,
        };
        assert_eq!(inactive.reason(), ReasonCode::ProductNotActive);
        assert_eq!(inactive.to_string(), "Product p9 is not available (suspended)");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<u32> = Ok(3);
        let outcome = Outcome::from_result(&ok, |n| format!("{} orders", n));
        assert!(outcome.ok);
        assert_eq!(outcome.message, "3 orders");
        assert_eq!(outcome.reason, None);

        let err: Result<u32> = Err(Error::NoValidItems);
        let outcome = Outcome::from_result(&err, |_| unreachable!());
        assert!(!outcome.ok);
        assert_eq!(outcome.reason, Some(ReasonCode::NoValidItems));
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let outcome = Outcome::failure(&Error::EmptyCart);
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"reason\":\"empty_cart\""));
        assert!(json.contains("\"ok\":false"));
    }
}

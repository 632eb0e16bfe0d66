//! Campus Marketplace Core
//!
//! Order ledger and wallet settlement for a campus marketplace: customers buy
//! from campus vendors with wallet balances, vendors manage listings and
//! orders, admins approve vendors and listings.
//!
//! # Architecture
//!
//! - **Stores**: catalog, accounts, carts, order ledger, review log
//! - **Service**: [`Marketplace`] enforces roles and ownership over the stores
//! - **Single Writer**: one actor task owns the service; [`MarketplaceHandle`]
//!   is the cloneable async front door
//! - **Batching**: change sets are merged and committed in one RocksDB write batch
//!
//! # Invariants
//!
//! - Wallets never go negative
//! - Checkout is all-or-nothing: Σ(vendor credits) == buyer debit, or no change
//! - Order amounts are snapshots fixed at checkout
//! - Vendor rating average == arithmetic mean of all ratings received

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod accounts;
pub mod actor;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod marketplace;
pub mod metrics;
pub mod reviews;
mod seed;
pub mod storage;
pub mod types;

// Re-exports
pub use actor::MarketplaceHandle;
pub use config::Config;
pub use error::{Error, Outcome, ReasonCode, Result};
pub use events::MarketEvent;
pub use ledger::{CartQuote, CheckoutReceipt, OrderLedger, SkipReason, SkippedLine};
pub use marketplace::{AdminOverview, BoostReceipt, Marketplace, VendorRating, VendorSales};
pub use storage::Storage;
pub use types::{
    Account, AccountId, Campus, CampusId, CartLine, Currency, DeliveryDetails, Money, NewAccount,
    Order, OrderId, OrderStatus, Plan, Product, ProductDraft, ProductId, ProductPatch,
    ProductStatus, Rating, Review, Role, VendorStatus,
};

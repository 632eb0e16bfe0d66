//! Vendor Analytics
//!
//! Read-only sales reporting for marketplace vendors.
//!
//! # Report
//!
//! For one vendor over a [`TimeRange`] (last 7 days, last 30 days, all time):
//!
//! 1. **Sales**: total of non-cancelled order amounts
//! 2. **Orders**: count, per-status counts and completion rate
//! 3. **Recent**: non-cancelled sales of the last 7 days
//! 4. **Growth**: last 30 days against the 30 before (all-time range only)
//! 5. **Top products**: best sellers by revenue
//!
//! # Example
//!
//! ```no_run
//! use marketplace_core::{AccountId, Config as MarketConfig, MarketplaceHandle};
//! use vendor_analytics::{AnalyticsEngine, Config, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> vendor_analytics::Result<()> {
//!     let handle = MarketplaceHandle::open(MarketConfig::default()).await?;
//!     let engine = AnalyticsEngine::new(Config::default(), handle);
//!
//!     let report = engine
//!         .vendor_report(AccountId::new("vend1"), TimeRange::Last30Days)
//!         .await?;
//!     println!("{} orders, {} sold", report.order_count, report.total_sales.minor());
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::{compute_report, AnalyticsEngine};
pub use error::{Error, Result};
pub use types::*;

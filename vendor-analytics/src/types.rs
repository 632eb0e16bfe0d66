//! Report types for vendor analytics

use chrono::{DateTime, Duration, Utc};
use marketplace_core::{AccountId, Money, OrderStatus, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reporting period, counted back from the report time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    /// Last 7 days
    Last7Days,
    /// Last 30 days
    Last30Days,
    /// Every order
    AllTime,
}

impl TimeRange {
    /// Short label ("7d", "30d", "all")
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::AllTime => "all",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "Last 7 Days",
            TimeRange::Last30Days => "Last 30 Days",
            TimeRange::AllTime => "All Time",
        }
    }

    /// Earliest included instant; `None` for all time
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::Last7Days => Some(now - Duration::days(7)),
            TimeRange::Last30Days => Some(now - Duration::days(30)),
            TimeRange::AllTime => None,
        }
    }

    /// Whether a timestamp falls inside the range
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.since(now).map_or(true, |since| at >= since)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Last30Days
    }
}

impl FromStr for TimeRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            "all" => Ok(TimeRange::AllTime),
            other => Err(crate::Error::InvalidRange(other.to_string())),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders per lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Awaiting payment
    pub pending: usize,
    /// Paid, awaiting delivery
    pub paid: usize,
    /// Delivered
    pub fulfilled: usize,
    /// Cancelled
    pub cancelled: usize,
}

impl StatusCounts {
    /// Count one order
    pub fn record(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Paid => self.paid += 1,
            OrderStatus::Fulfilled => self.fulfilled += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Orders counted
    pub fn total(&self) -> usize {
        self.pending + self.paid + self.fulfilled + self.cancelled
    }
}

/// Best-selling product row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    /// Product
    pub product_id: ProductId,
    /// Current listing name, or a placeholder once deleted
    pub name: String,
    /// Units sold
    pub quantity: u64,
    /// Revenue from non-cancelled orders
    pub revenue: Money,
}

/// Sales report for one vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorReport {
    /// Vendor
    pub vendor_id: AccountId,

    /// Reporting period
    pub range: TimeRange,

    /// Report time; all windows count back from here
    pub generated_at: DateTime<Utc>,

    /// Non-cancelled sales in range
    pub total_sales: Money,

    /// Orders in range, cancelled included
    pub order_count: usize,

    /// Orders per status
    pub status_counts: StatusCounts,

    /// Fulfilled share of orders in percent (0 without orders)
    pub completion_rate: Decimal,

    /// Non-cancelled sales in the recent window
    pub recent_sales: Money,

    /// Percent change of the last growth window against the one before.
    /// Only reported for [`TimeRange::AllTime`] when the earlier window sold anything.
    pub monthly_growth: Option<Decimal>,

    /// Best sellers by revenue
    pub top_products: Vec<TopProduct>,
}

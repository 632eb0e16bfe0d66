//! Vendor analytics engine
//!
//! Fetches a vendor's order history through the marketplace handle and folds it
//! into a [`VendorReport`]. The fold itself is [`compute_report`], a pure function
//! of the orders and the report time.

use crate::{config::Config, types::*, Result};
use chrono::{DateTime, Duration, Utc};
use marketplace_core::{
    AccountId, MarketplaceHandle, Money, Order, OrderStatus, ProductId, VendorSales,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const UNKNOWN_PRODUCT: &str = "Unknown product";

/// Analytics engine
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    /// Configuration
    config: Config,

    /// Marketplace to read from
    handle: MarketplaceHandle,
}

impl AnalyticsEngine {
    /// Create new analytics engine
    pub fn new(config: Config, handle: MarketplaceHandle) -> Self {
        Self { config, handle }
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the sales report of a vendor
    pub async fn vendor_report(&self, vendor_id: AccountId, range: TimeRange) -> Result<VendorReport> {
        let sales = self.handle.vendor_sales(vendor_id).await?;
        let report = compute_report(&self.config, &sales, range, Utc::now())?;

        tracing::info!(
            vendor = %report.vendor_id,
            range = %range,
            orders = report.order_count,
            total_sales = report.total_sales.minor(),
            "Vendor report generated"
        );

        Ok(report)
    }
}

/// Fold a vendor's orders into a report as of `now`
pub fn compute_report(
    config: &Config,
    sales: &VendorSales,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<VendorReport> {
    let orders: Vec<&Order> = sales
        .orders
        .iter()
        .filter(|o| range.contains(o.created_at, now))
        .collect();
    let live = || {
        orders
            .iter()
            .copied()
            .filter(|o| o.status != OrderStatus::Cancelled)
    };

    let mut status_counts = StatusCounts::default();
    for order in &orders {
        status_counts.record(order.status);
    }

    let total_sales = Money::sum(live().map(|o| o.amount))?;

    let recent_since = now - Duration::days(config.recent_window_days);
    let recent_sales = Money::sum(
        live()
            .filter(|o| o.created_at >= recent_since)
            .map(|o| o.amount),
    )?;

    let monthly_growth = match range {
        TimeRange::AllTime => growth(live(), Duration::days(config.growth_window_days), now)?,
        TimeRange::Last7Days | TimeRange::Last30Days => None,
    };

    let top_products = top_products(live(), &sales.product_names, config.top_products_limit)?;

    tracing::debug!(
        vendor = %sales.vendor_id,
        orders = orders.len(),
        "Vendor orders folded"
    );

    Ok(VendorReport {
        vendor_id: sales.vendor_id.clone(),
        range,
        generated_at: now,
        total_sales,
        order_count: orders.len(),
        completion_rate: percent(status_counts.fulfilled, orders.len()),
        status_counts,
        recent_sales,
        monthly_growth,
        top_products,
    })
}

/// Percent change of the latest window against the one before it;
/// `None` when the earlier window sold nothing
fn growth<'a>(
    orders: impl Iterator<Item = &'a Order>,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Option<Decimal>> {
    let current_since = now - window;
    let previous_since = current_since - window;

    let mut current = Money::ZERO;
    let mut previous = Money::ZERO;
    for order in orders {
        if order.created_at >= current_since {
            current = current.checked_add(order.amount)?;
        } else if order.created_at >= previous_since {
            previous = previous.checked_add(order.amount)?;
        }
    }

    if previous.is_zero() {
        return Ok(None);
    }

    let current = Decimal::from(current.minor());
    let previous = Decimal::from(previous.minor());
    Ok(Some(
        ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2),
    ))
}

fn top_products<'a>(
    orders: impl Iterator<Item = &'a Order>,
    names: &BTreeMap<ProductId, String>,
    limit: usize,
) -> Result<Vec<TopProduct>> {
    let mut by_product: BTreeMap<&ProductId, TopProduct> = BTreeMap::new();
    for order in orders {
        let row = by_product
            .entry(&order.product_id)
            .or_insert_with(|| TopProduct {
                product_id: order.product_id.clone(),
                name: names
                    .get(&order.product_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                quantity: 0,
                revenue: Money::ZERO,
            });
        row.quantity += u64::from(order.quantity);
        row.revenue = row.revenue.checked_add(order.amount)?;
    }

    // Highest revenue first; ties by product id
    let mut rows: Vec<TopProduct> = by_product.into_values().collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.product_id.cmp(&b.product_id)));
    rows.truncate(limit);
    Ok(rows)
}

fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part as u64) * Decimal::ONE_HUNDRED / Decimal::from(whole as u64)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_core::types::SettlementId;
    use marketplace_core::{CampusId, Config as MarketConfig, OrderId};
    use proptest::prelude::*;

    fn order(product: &str, amount: u64, quantity: u32, status: OrderStatus, age_days: i64, now: DateTime<Utc>) -> Order {
        let at = now - Duration::days(age_days);
        Order {
            id: OrderId::generate(),
            product_id: ProductId::new(product),
            vendor_id: AccountId::new("vend1"),
            buyer_id: AccountId::new("cust1"),
            campus_id: CampusId::new("unilag"),
            quantity,
            unit_price: Money::from_minor(amount / u64::from(quantity)),
            amount: Money::from_minor(amount),
            status,
            delivery: None,
            settlement_id: SettlementId::generate(),
            created_at: at,
            updated_at: at,
        }
    }

    fn sales(orders: Vec<Order>) -> VendorSales {
        VendorSales {
            vendor_id: AccountId::new("vend1"),
            orders,
            product_names: [
                (ProductId::new("p1"), "Vintage Hoodie".to_string()),
                (ProductId::new("p3"), "Tote Bag".to_string()),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_totals_exclude_cancelled() {
        let now = Utc::now();
        let sales = sales(vec![
            order("p1", 1500, 2, OrderStatus::Paid, 1, now),
            order("p1", 750, 1, OrderStatus::Fulfilled, 3, now),
            order("p3", 400, 1, OrderStatus::Cancelled, 2, now),
        ]);

        let report = compute_report(&Config::default(), &sales, TimeRange::Last7Days, now).unwrap();

        assert_eq!(report.order_count, 3);
        assert_eq!(report.total_sales, Money::from_minor(2250));
        assert_eq!(report.recent_sales, Money::from_minor(2250));
        assert_eq!(report.status_counts.cancelled, 1);
        assert_eq!(report.status_counts.fulfilled, 1);
        assert_eq!(report.completion_rate, Decimal::new(3333, 2));
        assert_eq!(report.monthly_growth, None);
    }

    #[test]
    fn test_range_filters_orders() {
        let now = Utc::now();
        let sales = sales(vec![
            order("p1", 1000, 1, OrderStatus::Paid, 2, now),
            order("p1", 2000, 1, OrderStatus::Paid, 20, now),
            order("p1", 4000, 1, OrderStatus::Paid, 90, now),
        ]);

        let week = compute_report(&Config::default(), &sales, TimeRange::Last7Days, now).unwrap();
        let month = compute_report(&Config::default(), &sales, TimeRange::Last30Days, now).unwrap();
        let all = compute_report(&Config::default(), &sales, TimeRange::AllTime, now).unwrap();

        assert_eq!(week.total_sales, Money::from_minor(1000));
        assert_eq!(month.total_sales, Money::from_minor(3000));
        assert_eq!(all.total_sales, Money::from_minor(7000));
        // Recent window is fixed regardless of range
        assert_eq!(all.recent_sales, Money::from_minor(1000));
    }

    #[test]
    fn test_monthly_growth() {
        let now = Utc::now();
        let sales = sales(vec![
            order("p1", 3000, 1, OrderStatus::Paid, 10, now),
            order("p1", 2000, 1, OrderStatus::Fulfilled, 40, now),
            order("p1", 9999, 1, OrderStatus::Cancelled, 40, now),
            order("p1", 5000, 1, OrderStatus::Paid, 65, now),
        ]);

        let all = compute_report(&Config::default(), &sales, TimeRange::AllTime, now).unwrap();
        assert_eq!(all.monthly_growth, Some(Decimal::from(50)));

        let month = compute_report(&Config::default(), &sales, TimeRange::Last30Days, now).unwrap();
        assert_eq!(month.monthly_growth, None);
    }

    #[test]
    fn test_no_growth_without_previous_sales() {
        let now = Utc::now();
        let sales = sales(vec![order("p1", 3000, 1, OrderStatus::Paid, 10, now)]);

        let all = compute_report(&Config::default(), &sales, TimeRange::AllTime, now).unwrap();
        assert_eq!(all.monthly_growth, None);
    }

    #[test]
    fn test_top_products() {
        let now = Utc::now();
        let mut orders = vec![
            order("p1", 750, 1, OrderStatus::Paid, 1, now),
            order("p1", 750, 1, OrderStatus::Paid, 1, now),
            order("p3", 1200, 3, OrderStatus::Paid, 1, now),
            order("gone", 100, 1, OrderStatus::Paid, 1, now),
        ];
        for i in 0..5 {
            orders.push(order(&format!("x{}", i), 10, 1, OrderStatus::Paid, 1, now));
        }

        let report = compute_report(&Config::default(), &sales(orders), TimeRange::AllTime, now).unwrap();

        assert_eq!(report.top_products.len(), 5);
        assert_eq!(report.top_products[0].name, "Vintage Hoodie");
        assert_eq!(report.top_products[0].quantity, 2);
        assert_eq!(report.top_products[0].revenue, Money::from_minor(1500));
        assert_eq!(report.top_products[1].name, "Tote Bag");
        assert_eq!(report.top_products[2].name, UNKNOWN_PRODUCT);
    }

    #[test]
    fn test_empty_history() {
        let report =
            compute_report(&Config::default(), &sales(vec![]), TimeRange::AllTime, Utc::now()).unwrap();

        assert_eq!(report.order_count, 0);
        assert_eq!(report.total_sales, Money::ZERO);
        assert_eq!(report.completion_rate, Decimal::ZERO);
        assert!(report.top_products.is_empty());
    }

    #[tokio::test]
    async fn test_vendor_report_through_handle() {
        let mut config = MarketConfig::in_memory();
        config.seed_demo_data = true;
        let handle = MarketplaceHandle::open(config).await.unwrap();

        handle
            .add_to_cart(AccountId::new("cust1"), ProductId::new("p1"), 2)
            .await
            .unwrap();
        handle
            .checkout(AccountId::new("cust1"), None, None)
            .await
            .unwrap();

        let engine = AnalyticsEngine::new(Config::default(), handle.clone());
        let report = engine
            .vendor_report(AccountId::new("vend1"), TimeRange::Last7Days)
            .await
            .unwrap();

        assert_eq!(report.order_count, 1);
        assert_eq!(report.status_counts.paid, 1);
        assert_eq!(report.total_sales, Money::from_minor(1_500_000));
        assert_eq!(report.top_products[0].name, "Vintage Hoodie");

        // Customers have no sales report
        assert!(matches!(
            engine
                .vendor_report(AccountId::new("cust1"), TimeRange::AllTime)
                .await,
            Err(crate::Error::Core(_))
        ));

        handle.shutdown().await.unwrap();
    }

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Paid),
            Just(OrderStatus::Fulfilled),
            Just(OrderStatus::Cancelled),
        ]
    }

    proptest! {
        #[test]
        fn prop_report_is_consistent(
            rows in prop::collection::vec(
                (0usize..8, 1u64..100_000, status_strategy(), 0i64..120),
                0..40,
            ),
        ) {
            let now = Utc::now();
            let orders: Vec<Order> = rows
                .iter()
                .map(|(p, amount, status, age)| order(&format!("p{}", p), *amount, 1, *status, *age, now))
                .collect();
            let expected = Money::from_minor(
                rows.iter()
                    .filter(|(_, _, status, _)| *status != OrderStatus::Cancelled)
                    .map(|(_, amount, _, _)| amount)
                    .sum(),
            );

            let report = compute_report(&Config::default(), &sales(orders), TimeRange::AllTime, now).unwrap();

            prop_assert_eq!(report.status_counts.total(), report.order_count);
            prop_assert_eq!(report.total_sales, expected);
            prop_assert!(report.recent_sales <= report.total_sales);
            prop_assert!(report.top_products.len() <= 5);
            prop_assert!(report
                .top_products
                .windows(2)
                .all(|w| w[0].revenue >= w[1].revenue));
            prop_assert!(report.completion_rate <= Decimal::ONE_HUNDRED);
        }
    }
}

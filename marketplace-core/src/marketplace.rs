//! Marketplace service: the single entry point for every operation
//!
//! Wraps the stores behind role and ownership checks, records each mutation
//! in a [`ChangeSet`] for persistence and publishes a [`MarketEvent`] for
//! subscribers. Methods take `&mut self`; concurrent callers go through
//! [`MarketplaceHandle`](crate::actor::MarketplaceHandle), which serializes
//! them on one task.

use crate::{
    accounts::AccountStore,
    cart::Cart,
    catalog::Catalog,
    events::{EventBus, MarketEvent},
    ledger::{Cancellation, CartQuote, CheckoutReceipt, CheckoutRequest, OrderLedger},
    metrics::Metrics,
    reviews::{ReviewLog, ReviewRequest},
    seed,
    storage::{ChangeSet, MarketState},
    types::{
        Account, AccountId, Campus, CampusId, CartLine, DeliveryDetails, Money, NewAccount, Order,
        OrderId, OrderStatus, Plan, Product, ProductDraft, ProductId, ProductPatch, ProductStatus,
        Review, Role, VendorStatus,
    },
    Config, Error, Result,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tokio::sync::broadcast;

/// Result of a purchased boost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostReceipt {
    /// Boosted listing
    pub product: Product,
    /// Amount charged
    pub cost: Money,
    /// Vendor balance after the charge
    pub vendor_balance: Money,
}

/// Vendor rating summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRating {
    /// Vendor
    pub vendor_id: AccountId,
    /// Shop name
    pub shop_name: String,
    /// Arithmetic mean of all ratings
    pub average: Decimal,
    /// Number of ratings
    pub count: u64,
}

/// Admin dashboard counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOverview {
    /// Vendor accounts
    pub vendors: usize,
    /// Vendors awaiting approval
    pub pending_vendors: usize,
    /// Listings awaiting approval
    pub pending_listings: usize,
    /// Listings on sale
    pub active_listings: usize,
    /// Orders ever created
    pub orders: usize,
    /// Σ of non-cancelled order amounts
    pub gross_volume: Money,
    /// Boost revenue collected
    pub platform_revenue: Money,
}

/// Order history of one vendor, with listing names for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSales {
    /// Vendor
    pub vendor_id: AccountId,
    /// Every order owed by the vendor
    pub orders: Vec<Order>,
    /// Current names of the vendor's listings
    pub product_names: BTreeMap<ProductId, String>,
}

/// Marketplace service
pub struct Marketplace {
    config: Config,
    campuses: BTreeMap<CampusId, Campus>,
    accounts: AccountStore,
    catalog: Catalog,
    carts: HashMap<AccountId, Cart>,
    ledger: OrderLedger,
    reviews: ReviewLog,
    platform_revenue: Money,
    events: EventBus,
    metrics: Metrics,
    changes: ChangeSet,
}

impl Marketplace {
    /// Empty marketplace
    pub fn new(config: Config) -> Result<Self> {
        Self::restore(config, MarketState::default())
    }

    /// Rebuild from persisted state; carts start empty
    pub fn restore(config: Config, state: MarketState) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.events.channel_capacity);
        Ok(Self {
            campuses: state
                .campuses
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            accounts: AccountStore::from_accounts(state.accounts),
            catalog: Catalog::from_products(state.products),
            carts: HashMap::new(),
            ledger: OrderLedger::from_records(state.orders, state.settlements),
            reviews: ReviewLog::from_reviews(state.reviews),
            platform_revenue: state.platform_revenue,
            events,
            metrics: Metrics::new()?,
            changes: ChangeSet::default(),
            config,
        })
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    /// Shared handle to the event bus
    pub fn event_bus(&self) -> EventBus {
        self.events.clone()
    }

    /// Drain the records changed since the last call
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// True when nothing has been created yet
    pub fn is_empty(&self) -> bool {
        self.campuses.is_empty() && self.accounts.is_empty() && self.catalog.is_empty()
    }

    // Campuses and accounts

    /// Register a campus
    pub fn add_campus(&mut self, campus: Campus) -> Result<Campus> {
        if campus.name.trim().is_empty() {
            return Err(Error::InvalidInput("campus name must not be blank".to_string()));
        }
        self.changes.campus(&campus);
        self.campuses.insert(campus.id.clone(), campus.clone());
        Ok(campus)
    }

    /// All campuses, by id
    pub fn campuses(&self) -> Vec<Campus> {
        self.campuses.values().cloned().collect()
    }

    /// Sign up a customer, vendor or admin
    pub fn register_account(&mut self, new: NewAccount) -> Result<Account> {
        if !self.campuses.contains_key(&new.campus_id) {
            return Err(Error::CampusNotFound(new.campus_id));
        }
        let account = self.accounts.register(new)?;
        self.changes.account(&account);
        self.events.publish(MarketEvent::AccountRegistered {
            account_id: account.id.clone(),
        });
        tracing::info!(account = %account.id, role = %account.role, "Account registered");
        Ok(account)
    }

    /// Approve a pending vendor (admin)
    pub fn approve_vendor(&mut self, admin_id: &AccountId, vendor_id: &AccountId) -> Result<Account> {
        self.accounts.require(admin_id, Role::Admin)?;
        let account = self.accounts.approve_vendor(vendor_id)?;
        self.changes.account(&account);
        self.events.publish(MarketEvent::VendorApproved {
            vendor_id: vendor_id.clone(),
        });
        tracing::info!(vendor = %vendor_id, admin = %admin_id, "Vendor approved");
        Ok(account)
    }

    /// Change a vendor's subscription plan (admin)
    pub fn change_vendor_plan(
        &mut self,
        admin_id: &AccountId,
        vendor_id: &AccountId,
        plan: Plan,
    ) -> Result<Account> {
        self.accounts.require(admin_id, Role::Admin)?;
        let account = self.accounts.change_plan(vendor_id, plan)?;
        self.changes.account(&account);
        self.events.publish(MarketEvent::VendorPlanChanged {
            vendor_id: vendor_id.clone(),
            plan,
        });
        Ok(account)
    }

    /// Vendor directory (admin), optionally filtered by approval status and
    /// a case-insensitive search over shop name, owner name and id
    pub fn vendors(
        &self,
        admin_id: &AccountId,
        status: Option<VendorStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Account>> {
        self.accounts.require(admin_id, Role::Admin)?;
        Ok(self.accounts.vendors(status, search))
    }

    /// Account by ID
    pub fn account(&self, id: &AccountId) -> Result<Account> {
        self.accounts.get(id).cloned()
    }

    /// Wallet balance
    pub fn balance(&self, id: &AccountId) -> Result<Money> {
        self.accounts.balance(id)
    }

    // Listings

    /// List a new product (approved vendor); it awaits admin approval
    pub fn add_product(&mut self, vendor_id: &AccountId, draft: ProductDraft) -> Result<Product> {
        let vendor = self.accounts.require(vendor_id, Role::Vendor)?;
        if vendor.vendor_profile()?.status != VendorStatus::Approved {
            return Err(Error::PermissionDenied(format!(
                "vendor {} is not approved yet",
                vendor_id
            )));
        }
        if !self.campuses.contains_key(&draft.campus_id) {
            return Err(Error::CampusNotFound(draft.campus_id));
        }

        let product = self.catalog.create(vendor_id.clone(), draft)?;
        self.changes.product(&product);
        self.events.publish(MarketEvent::ListingCreated {
            product_id: product.id.clone(),
            vendor_id: vendor_id.clone(),
        });
        tracing::info!(product = %product.id, vendor = %vendor_id, price = %product.price, "Listing created");
        Ok(product)
    }

    /// Edit listing content (owner)
    pub fn update_product(
        &mut self,
        vendor_id: &AccountId,
        product_id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product> {
        self.require_product_owner(vendor_id, product_id)?;
        let product = self.catalog.update(product_id, patch)?;
        self.changes.product(&product);
        self.events.publish(MarketEvent::ListingUpdated {
            product_id: product_id.clone(),
        });
        Ok(product)
    }

    /// Remove a listing (owner or admin); existing orders keep their snapshot
    pub fn delete_product(&mut self, actor_id: &AccountId, product_id: &ProductId) -> Result<Product> {
        let owner = self.catalog.get(product_id)?.vendor_id.clone();
        self.require_owner_or_admin(actor_id, &owner)?;
        let product = self.catalog.delete(product_id)?;
        self.changes.remove_product(product_id);
        self.events.publish(MarketEvent::ListingDeleted {
            product_id: product_id.clone(),
        });
        tracing::info!(product = %product_id, actor = %actor_id, "Listing deleted");
        Ok(product)
    }

    /// Approve a pending listing (admin)
    pub fn approve_product(&mut self, admin_id: &AccountId, product_id: &ProductId) -> Result<Product> {
        self.set_product_status(admin_id, product_id, ProductStatus::Active)
    }

    /// Suspend an active listing (admin)
    pub fn suspend_product(&mut self, admin_id: &AccountId, product_id: &ProductId) -> Result<Product> {
        self.set_product_status(admin_id, product_id, ProductStatus::Suspended)
    }

    fn set_product_status(
        &mut self,
        admin_id: &AccountId,
        product_id: &ProductId,
        status: ProductStatus,
    ) -> Result<Product> {
        self.accounts.require(admin_id, Role::Admin)?;
        let product = self.catalog.set_status(product_id, status)?;
        self.changes.product(&product);
        self.events.publish(MarketEvent::ListingStatusChanged {
            product_id: product_id.clone(),
            status,
        });
        tracing::info!(product = %product_id, status = %status, "Listing status changed");
        Ok(product)
    }

    /// Buy `days` of featured placement for an active listing (owner)
    ///
    /// A running boost is extended; an expired one restarts from now.
    pub fn boost_product(
        &mut self,
        vendor_id: &AccountId,
        product_id: &ProductId,
        days: u32,
    ) -> Result<BoostReceipt> {
        let max_days = self.config.boost.max_days;
        if days == 0 || days > max_days {
            return Err(Error::InvalidInput(format!(
                "boost days must be between 1 and {}, got {}",
                max_days, days
            )));
        }

        self.require_product_owner(vendor_id, product_id)?;
        let product = self.catalog.get(product_id)?;
        if product.status != ProductStatus::Active {
            return Err(Error::InvalidInput(format!(
                "only active listings can be boosted, {} is {}",
                product_id, product.status
            )));
        }

        let cost = self.config.boost.price_per_day.times(days)?;
        self.accounts.ensure_funds(vendor_id, cost)?;
        let revenue = self.platform_revenue.checked_add(cost)?;

        let now = Utc::now();
        let start = product
            .featured_until
            .filter(|until| *until > now)
            .unwrap_or(now);
        let featured_until = start
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| Error::InvalidInput("boost expiry out of range".to_string()))?;

        let vendor_balance = self.accounts.debit(vendor_id, cost)?;
        self.platform_revenue = revenue;
        let product = self.catalog.set_featured_until(product_id, featured_until)?;

        self.touch_account(vendor_id)?;
        self.changes.product(&product);
        self.changes.platform_revenue(revenue);
        self.metrics.record_boost();
        self.events.publish(MarketEvent::ProductBoosted {
            product_id: product_id.clone(),
            cost,
            featured_until,
        });
        tracing::info!(
            product = %product_id,
            vendor = %vendor_id,
            days,
            cost = %cost,
            until = %featured_until,
            "Listing boosted"
        );

        Ok(BoostReceipt {
            product,
            cost,
            vendor_balance,
        })
    }

    /// Product by ID
    pub fn product(&self, id: &ProductId) -> Result<Product> {
        self.catalog.get(id).cloned()
    }

    /// Active listings, boosted first, then newest
    pub fn browse(&self, campus: Option<&CampusId>) -> Vec<Product> {
        self.catalog.browse(campus, Utc::now())
    }

    /// Active listings as of `now`
    pub fn browse_at(&self, campus: Option<&CampusId>, now: DateTime<Utc>) -> Vec<Product> {
        self.catalog.browse(campus, now)
    }

    /// Every listing of a vendor
    pub fn vendor_listings(&self, vendor_id: &AccountId) -> Vec<Product> {
        self.catalog.vendor_listings(vendor_id)
    }

    /// Approval queue (admin)
    pub fn pending_listings(&self, admin_id: &AccountId) -> Result<Vec<Product>> {
        self.accounts.require(admin_id, Role::Admin)?;
        Ok(self.catalog.pending())
    }

    // Cart

    /// Add a listing to the customer's cart
    pub fn add_to_cart(
        &mut self,
        customer_id: &AccountId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        self.accounts.require(customer_id, Role::Customer)?;
        self.catalog.ensure_active(product_id)?;
        let line = self
            .carts
            .entry(customer_id.clone())
            .or_default()
            .add(product_id.clone(), quantity)?
            .clone();
        self.cart_changed(customer_id);
        Ok(line)
    }

    /// Drop a product from the cart; returns whether it was there
    pub fn remove_from_cart(&mut self, customer_id: &AccountId, product_id: &ProductId) -> Result<bool> {
        self.accounts.require(customer_id, Role::Customer)?;
        let removed = self
            .carts
            .get_mut(customer_id)
            .map_or(false, |cart| cart.remove(product_id));
        if removed {
            self.cart_changed(customer_id);
        }
        Ok(removed)
    }

    /// Overwrite a cart line's quantity
    pub fn set_cart_quantity(
        &mut self,
        customer_id: &AccountId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        self.accounts.require(customer_id, Role::Customer)?;
        let line = self
            .carts
            .entry(customer_id.clone())
            .or_default()
            .set_quantity(product_id, quantity)?
            .clone();
        self.cart_changed(customer_id);
        Ok(line)
    }

    /// Empty the cart
    pub fn clear_cart(&mut self, customer_id: &AccountId) -> Result<()> {
        self.accounts.require(customer_id, Role::Customer)?;
        if let Some(cart) = self.carts.get_mut(customer_id) {
            cart.clear();
            self.cart_changed(customer_id);
        }
        Ok(())
    }

    /// Current cart contents
    pub fn cart(&self, customer_id: &AccountId) -> Result<Cart> {
        self.accounts.require(customer_id, Role::Customer)?;
        Ok(self.carts.get(customer_id).cloned().unwrap_or_default())
    }

    /// Preview checkout at current prices
    pub fn quote_cart(&self, customer_id: &AccountId) -> Result<CartQuote> {
        let cart = self.cart(customer_id)?;
        OrderLedger::quote(cart.lines(), &self.catalog, &self.accounts)
    }

    // Checkout and orders

    /// Settle the customer's cart and clear it
    pub fn checkout(
        &mut self,
        customer_id: &AccountId,
        delivery: Option<DeliveryDetails>,
        expected_total: Option<Money>,
    ) -> Result<CheckoutReceipt> {
        let started = Instant::now();
        let result = self.settle_cart(customer_id, delivery, expected_total);

        match &result {
            Ok(receipt) => self.metrics.record_checkout(
                receipt.orders.len(),
                receipt.total().minor(),
                started.elapsed().as_secs_f64(),
            ),
            Err(err) => {
                self.metrics.record_checkout_failure();
                tracing::warn!(
                    buyer = %customer_id,
                    reason = ?err.reason(),
                    error = %err,
                    "Checkout rejected"
                );
            }
        }

        result
    }

    fn settle_cart(
        &mut self,
        customer_id: &AccountId,
        delivery: Option<DeliveryDetails>,
        expected_total: Option<Money>,
    ) -> Result<CheckoutReceipt> {
        self.accounts.require(customer_id, Role::Customer)?;
        let lines: Vec<CartLine> = self
            .carts
            .get(customer_id)
            .map(|cart| cart.lines().to_vec())
            .unwrap_or_default();

        let receipt = self.ledger.checkout(
            CheckoutRequest {
                buyer_id: customer_id,
                lines: &lines,
                delivery,
                expected_total,
            },
            &self.catalog,
            &mut self.accounts,
        )?;

        if let Some(cart) = self.carts.get_mut(customer_id) {
            cart.clear();
        }

        self.touch_account(customer_id)?;
        for (vendor_id, _) in &receipt.settlement.credits {
            self.touch_account(vendor_id)?;
        }
        for order in &receipt.orders {
            self.changes.order(order);
        }
        self.changes.settlement(&receipt.settlement);

        self.events.publish(MarketEvent::CheckoutCompleted {
            settlement_id: receipt.settlement.id,
            buyer_id: customer_id.clone(),
            total: receipt.total(),
            order_ids: receipt.settlement.order_ids.clone(),
        });
        self.cart_changed(customer_id);

        Ok(receipt)
    }

    /// Human-readable checkout summary in the configured currency
    pub fn checkout_message(&self, receipt: &CheckoutReceipt) -> String {
        let currency = self.config.currency;
        let mut message = format!(
            "Order placed: {} paid for {} item(s)",
            currency.format(receipt.total()),
            receipt.orders.len()
        );
        if !receipt.skipped.is_empty() {
            message.push_str(&format!(
                ", {} unavailable item(s) left out",
                receipt.skipped.len()
            ));
        }
        message
    }

    /// Mark a paid order delivered (owning vendor or admin)
    pub fn fulfill_order(&mut self, actor_id: &AccountId, order_id: &OrderId) -> Result<Order> {
        let owner = self.ledger.get(order_id)?.vendor_id.clone();
        self.require_owner_or_admin(actor_id, &owner)?;
        let order = self.ledger.fulfill(order_id)?;
        self.order_changed(&order);
        tracing::info!(order = %order_id, actor = %actor_id, "Order fulfilled");
        Ok(order)
    }

    /// Cancel a pending or paid order (owning vendor or admin)
    pub fn cancel_order(&mut self, actor_id: &AccountId, order_id: &OrderId) -> Result<Cancellation> {
        let owner = self.ledger.get(order_id)?.vendor_id.clone();
        self.require_owner_or_admin(actor_id, &owner)?;
        let cancellation = self.ledger.cancel(order_id, &mut self.accounts)?;
        if !cancellation.refunded.is_zero() {
            self.touch_account(&cancellation.order.vendor_id)?;
            self.touch_account(&cancellation.order.buyer_id)?;
        }
        self.order_changed(&cancellation.order);
        Ok(cancellation)
    }

    /// Order by ID
    pub fn order(&self, id: &OrderId) -> Result<Order> {
        self.ledger.get(id).cloned()
    }

    /// Orders placed by a buyer
    pub fn orders_for_buyer(&self, buyer_id: &AccountId) -> Vec<Order> {
        self.ledger.orders_for_buyer(buyer_id)
    }

    /// Orders owed by a vendor
    pub fn orders_for_vendor(&self, vendor_id: &AccountId) -> Vec<Order> {
        self.ledger.orders_for_vendor(vendor_id)
    }

    /// Paid orders awaiting delivery
    pub fn pending_fulfilment(&self, vendor_id: &AccountId) -> Vec<Order> {
        self.ledger.pending_fulfilment(vendor_id)
    }

    /// Sales history for reporting
    pub fn vendor_sales(&self, vendor_id: &AccountId) -> Result<VendorSales> {
        self.accounts.require(vendor_id, Role::Vendor)?;
        Ok(VendorSales {
            vendor_id: vendor_id.clone(),
            orders: self.ledger.orders_for_vendor(vendor_id),
            product_names: self
                .catalog
                .vendor_listings(vendor_id)
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect(),
        })
    }

    // Reviews

    /// Review a purchased product and fold the rating into the vendor average
    pub fn submit_review(
        &mut self,
        customer_id: &AccountId,
        product_id: &ProductId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review> {
        self.accounts.require(customer_id, Role::Customer)?;
        let review = self.reviews.submit(
            ReviewRequest {
                buyer_id: customer_id,
                product_id,
                rating,
                comment,
                require_purchase: self.config.reviews.require_purchase,
            },
            &self.catalog,
            &mut self.accounts,
            &self.ledger,
        )?;

        self.touch_account(&review.vendor_id)?;
        self.changes.review(&review);
        self.metrics.record_review();
        self.events.publish(MarketEvent::ReviewSubmitted {
            review_id: review.id,
            product_id: product_id.clone(),
            vendor_id: review.vendor_id.clone(),
        });
        tracing::info!(
            product = %product_id,
            vendor = %review.vendor_id,
            rating = review.rating.value(),
            "Review submitted"
        );
        Ok(review)
    }

    /// Reviews of a product
    pub fn reviews_for_product(&self, product_id: &ProductId) -> Vec<Review> {
        self.reviews.for_product(product_id)
    }

    /// Vendor rating aggregate
    pub fn vendor_rating(&self, vendor_id: &AccountId) -> Result<VendorRating> {
        let profile = self.accounts.get(vendor_id)?.vendor_profile()?;
        Ok(VendorRating {
            vendor_id: vendor_id.clone(),
            shop_name: profile.shop_name.clone(),
            average: profile.rating_average(),
            count: profile.ratings_count,
        })
    }

    // Platform

    /// Boost revenue collected
    pub fn platform_revenue(&self) -> Money {
        self.platform_revenue
    }

    /// Σ of every wallet plus platform revenue; only checkouts and boosts move it
    /// between holders, never in or out
    pub fn total_money(&self) -> Result<Money> {
        self.accounts.total_balance()?.checked_add(self.platform_revenue)
    }

    /// Every settlement balances and matches its orders
    pub fn check_money_conservation(&self) -> bool {
        self.ledger.check_money_conservation()
    }

    /// Admin dashboard counters
    pub fn admin_overview(&self) -> Result<AdminOverview> {
        let vendors: Vec<&Account> = self
            .accounts
            .accounts()
            .filter(|a| a.role == Role::Vendor)
            .collect();
        let pending_vendors = vendors
            .iter()
            .filter_map(|a| a.vendor.as_ref())
            .filter(|p| p.status == VendorStatus::Pending)
            .count();

        Ok(AdminOverview {
            vendors: vendors.len(),
            pending_vendors,
            pending_listings: self.catalog.pending().len(),
            active_listings: self
                .catalog
                .products()
                .filter(|p| p.status == ProductStatus::Active)
                .count(),
            orders: self.ledger.orders().count(),
            gross_volume: Money::sum(
                self.ledger
                    .orders()
                    .filter(|o| o.status != OrderStatus::Cancelled)
                    .map(|o| o.amount),
            )?,
            platform_revenue: self.platform_revenue,
        })
    }

    /// Load the demo campuses, accounts and listings
    pub fn seed_demo_data(&mut self) -> Result<()> {
        let now = Utc::now();
        let accounts = seed::accounts(now);
        if let Some(existing) = accounts.iter().find(|a| self.accounts.find(&a.id).is_some()) {
            return Err(Error::DuplicateAccount(existing.id.clone()));
        }
        for campus in seed::campuses() {
            self.add_campus(campus)?;
        }
        for account in accounts {
            self.changes.account(&account);
            self.accounts.insert(account);
        }
        for product in seed::products(now) {
            self.changes.product(&product);
            self.catalog.insert(product);
        }
        tracing::info!(
            campuses = self.campuses.len(),
            accounts = self.accounts.len(),
            products = self.catalog.len(),
            "Demo data seeded"
        );
        Ok(())
    }

    // Helpers

    fn require_owner_or_admin(&self, actor_id: &AccountId, owner_id: &AccountId) -> Result<()> {
        let actor = self.accounts.get(actor_id)?;
        if actor.role == Role::Admin || actor_id == owner_id {
            return Ok(());
        }
        Err(Error::PermissionDenied(format!(
            "{} does not own this resource",
            actor_id
        )))
    }

    fn require_product_owner(&self, vendor_id: &AccountId, product_id: &ProductId) -> Result<()> {
        self.accounts.require(vendor_id, Role::Vendor)?;
        let product = self.catalog.get(product_id)?;
        if &product.vendor_id != vendor_id {
            return Err(Error::PermissionDenied(format!(
                "{} does not own product {}",
                vendor_id, product_id
            )));
        }
        Ok(())
    }

    fn touch_account(&mut self, id: &AccountId) -> Result<()> {
        let account = self.accounts.get(id)?;
        self.changes.account(account);
        Ok(())
    }

    fn order_changed(&mut self, order: &Order) {
        self.changes.order(order);
        self.events.publish(MarketEvent::OrderStatusChanged {
            order_id: order.id,
            status: order.status,
        });
    }

    fn cart_changed(&self, customer_id: &AccountId) {
        let item_count = self
            .carts
            .get(customer_id)
            .map_or(0, |cart| cart.item_count());
        self.events.publish(MarketEvent::CartChanged {
            customer_id: customer_id.clone(),
            item_count,
        });
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("campuses", &self.campuses.len())
            .field("accounts", &self.accounts.len())
            .field("products", &self.catalog.len())
            .field("platform_revenue", &self.platform_revenue)
            .finish_non_exhaustive()
    }
}

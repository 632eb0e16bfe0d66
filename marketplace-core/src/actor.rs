//! Actor-based concurrency for the marketplace
//!
//! Single-writer pattern using Tokio actors:
//! - One task owns the [`Marketplace`], so every wallet check sees the latest
//!   balance and two checkouts of the same buyer can never interleave
//! - Change sets are batched into one RocksDB write batch
//! - Bounded mailbox gives backpressure to callers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            UI / API layer (many tasks)               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │            MarketplaceHandle (Clone)                 │
//! │       Sends operations to the actor mailbox          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │           MarketplaceActor (single task)             │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ Marketplace: run operation, take ChangeSet     │  │
//! │  │ Pending: merged ChangeSets                     │  │
//! │  │ Timer: batch_timeout or max_batch_size → flush │  │
//! │  └────────────────────────────────────────────────┘  │
//! │                       │                              │
//! │                       ▼                              │
//! │           Storage::write_changes()                   │
//! │          (atomic write to RocksDB)                   │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    cart::Cart,
    events::{EventBus, MarketEvent},
    ledger::{Cancellation, CartQuote, CheckoutReceipt},
    marketplace::{AdminOverview, BoostReceipt, Marketplace, VendorRating, VendorSales},
    metrics::Metrics,
    storage::{ChangeSet, Storage},
    types::{
        Account, AccountId, Campus, CampusId, CartLine, DeliveryDetails, Money, NewAccount, Order,
        OrderId, Plan, Product, ProductDraft, ProductId, ProductPatch, Review, VendorStatus,
    },
    Config, Error, Result,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Duration};

type Responder = Box<dyn FnOnce() + Send>;
type Operation = Box<dyn FnOnce(&mut Marketplace) -> Responder + Send>;

/// Message sent to the marketplace actor
pub enum MarketMessage {
    /// Run an operation; the responder fires after its change set has been
    /// queued, and written when batching is off
    Execute(Operation),

    /// Flush pending change sets immediately
    FlushBatch {
        /// Flush result
        response: oneshot::Sender<Result<()>>,
    },

    /// Flush and stop the actor
    Shutdown {
        /// Final flush result
        response: oneshot::Sender<Result<()>>,
    },
}

impl std::fmt::Debug for MarketMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketMessage::Execute(_) => f.write_str("Execute"),
            MarketMessage::FlushBatch { .. } => f.write_str("FlushBatch"),
            MarketMessage::Shutdown { .. } => f.write_str("Shutdown"),
        }
    }
}

/// Actor that owns the marketplace state
pub struct MarketplaceActor {
    /// In-memory marketplace
    market: Marketplace,

    /// Storage backend (None in in-memory mode)
    storage: Option<Arc<Storage>>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<MarketMessage>,

    /// Change sets not yet written
    pending: ChangeSet,

    /// Number of change sets merged into `pending`
    pending_count: usize,

    /// Maximum change sets per batch
    max_batch_size: usize,

    /// Batch timeout
    batch_timeout: Duration,

    /// Batching enabled
    batching_enabled: bool,
}

impl MarketplaceActor {
    /// Create new actor
    pub fn new(
        market: Marketplace,
        storage: Option<Arc<Storage>>,
        mailbox: mpsc::Receiver<MarketMessage>,
    ) -> Self {
        let batching = market.config().batching.clone();
        Self {
            market,
            storage,
            mailbox,
            pending: ChangeSet::default(),
            pending_count: 0,
            max_batch_size: batching.max_batch_size,
            // interval() rejects a zero period
            batch_timeout: Duration::from_millis(batching.batch_timeout_ms.max(1)),
            batching_enabled: batching.enabled,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut batch_timer = interval(self.batch_timeout);
        batch_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(msg) = self.mailbox.recv() => {
                    match msg {
                        MarketMessage::Execute(operation) => self.execute(operation),
                        MarketMessage::FlushBatch { response } => {
                            let _ = response.send(self.flush_batch());
                        }
                        MarketMessage::Shutdown { response } => {
                            let result = self.flush_batch().and_then(|()| self.close_storage());
                            tracing::info!("Marketplace actor stopped");
                            let _ = response.send(result);
                            break;
                        }
                    }

                    if self.batching_enabled && self.pending_count >= self.max_batch_size {
                        if let Err(e) = self.flush_batch() {
                            tracing::error!(error = %e, "Error flushing batch");
                        }
                    }
                }

                _ = batch_timer.tick(), if self.batching_enabled && self.pending_count > 0 => {
                    if let Err(e) = self.flush_batch() {
                        tracing::error!(error = %e, "Error flushing batch on timeout");
                    }
                }

                // Every handle dropped
                else => {
                    if let Err(e) = self.flush_batch() {
                        tracing::error!(error = %e, "Error flushing batch on close");
                    }
                    break;
                }
            }
        }
    }

    fn execute(&mut self, operation: Operation) {
        let respond = operation(&mut self.market);
        let changes = self.market.take_changes();

        if self.storage.is_some() && !changes.is_empty() {
            // The operation already applied in memory; its change set stays
            // pending until a write succeeds
            self.pending.merge(changes);
            self.pending_count += 1;

            if !self.batching_enabled {
                if let Err(e) = self.flush_batch() {
                    tracing::error!(
                        error = %e,
                        pending = self.pending_count,
                        "Failed to persist change set, retrying on next write"
                    );
                }
            }
        }

        respond();
    }

    /// Release the database so the data dir can be reopened once shutdown returns
    fn close_storage(&mut self) -> Result<()> {
        match self.storage.take().map(Arc::try_unwrap) {
            Some(Ok(storage)) => storage.close(),
            // Shared elsewhere; the last owner closes it on drop
            Some(Err(_)) | None => Ok(()),
        }
    }

    /// Write pending change sets in one batch
    fn flush_batch(&mut self) -> Result<()> {
        if self.pending_count == 0 {
            return Ok(());
        }
        let Some(storage) = &self.storage else {
            self.pending = ChangeSet::default();
            self.pending_count = 0;
            return Ok(());
        };

        let changes = std::mem::take(&mut self.pending);
        match storage.write_changes(&changes) {
            Ok(()) => {
                self.market.metrics().record_batch_flush(self.pending_count);
                tracing::debug!(
                    change_sets = self.pending_count,
                    records = changes.len(),
                    "Batch flushed"
                );
                self.pending_count = 0;
                Ok(())
            }
            Err(e) => {
                // Keep the batch for the next attempt
                self.pending = changes;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for MarketplaceActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceActor")
            .field("pending_count", &self.pending_count)
            .field("batching_enabled", &self.batching_enabled)
            .finish_non_exhaustive()
    }
}

/// Handle for sending operations to the actor
#[derive(Clone)]
pub struct MarketplaceHandle {
    sender: mpsc::Sender<MarketMessage>,
    events: EventBus,
    metrics: Metrics,
}

impl MarketplaceHandle {
    /// Open the marketplace: restore persisted state, seed demo data into an
    /// empty store when configured, and spawn the actor
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let (mut market, storage) = if config.persistence_enabled {
            let storage = Arc::new(Storage::open(&config)?);
            let stats = storage.get_stats()?;
            tracing::info!(
                accounts = stats.total_accounts,
                products = stats.total_products,
                orders = stats.total_orders,
                "Restoring marketplace state"
            );
            let state = storage.load_state()?;
            (Marketplace::restore(config, state)?, Some(storage))
        } else {
            (Marketplace::new(config)?, None)
        };

        if market.config().seed_demo_data && market.is_empty() {
            market.seed_demo_data()?;
        }
        let changes = market.take_changes();
        if let Some(storage) = &storage {
            storage.write_changes(&changes)?;
        }

        Ok(spawn_marketplace_actor(market, storage))
    }

    async fn call<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Marketplace) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let operation: Operation = Box::new(move |market: &mut Marketplace| -> Responder {
            let result = f(market);
            Box::new(move || {
                let _ = tx.send(result);
            })
        });

        self.sender
            .send(MarketMessage::Execute(operation))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Register a campus
    pub async fn add_campus(&self, campus: Campus) -> Result<Campus> {
        self.call(move |m| m.add_campus(campus)).await
    }

    /// All campuses
    pub async fn campuses(&self) -> Result<Vec<Campus>> {
        self.call(|m| Ok(m.campuses())).await
    }

    /// Sign up an account
    pub async fn register_account(&self, new: NewAccount) -> Result<Account> {
        self.call(move |m| m.register_account(new)).await
    }

    /// Approve a pending vendor (admin)
    pub async fn approve_vendor(&self, admin_id: AccountId, vendor_id: AccountId) -> Result<Account> {
        self.call(move |m| m.approve_vendor(&admin_id, &vendor_id)).await
    }

    /// Change a vendor's plan (admin)
    pub async fn change_vendor_plan(
        &self,
        admin_id: AccountId,
        vendor_id: AccountId,
        plan: Plan,
    ) -> Result<Account> {
        self.call(move |m| m.change_vendor_plan(&admin_id, &vendor_id, plan))
            .await
    }

    /// Account by ID
    pub async fn account(&self, id: AccountId) -> Result<Account> {
        self.call(move |m| m.account(&id)).await
    }

    /// Wallet balance
    pub async fn balance(&self, id: AccountId) -> Result<Money> {
        self.call(move |m| m.balance(&id)).await
    }

    /// List a product (approved vendor)
    pub async fn add_product(&self, vendor_id: AccountId, draft: ProductDraft) -> Result<Product> {
        self.call(move |m| m.add_product(&vendor_id, draft)).await
    }

    /// Edit listing content (owner)
    pub async fn update_product(
        &self,
        vendor_id: AccountId,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product> {
        self.call(move |m| m.update_product(&vendor_id, &product_id, patch))
            .await
    }

    /// Remove a listing (owner or admin)
    pub async fn delete_product(&self, actor_id: AccountId, product_id: ProductId) -> Result<Product> {
        self.call(move |m| m.delete_product(&actor_id, &product_id)).await
    }

    /// Approve a pending listing (admin)
    pub async fn approve_product(&self, admin_id: AccountId, product_id: ProductId) -> Result<Product> {
        self.call(move |m| m.approve_product(&admin_id, &product_id)).await
    }

    /// Suspend an active listing (admin)
    pub async fn suspend_product(&self, admin_id: AccountId, product_id: ProductId) -> Result<Product> {
        self.call(move |m| m.suspend_product(&admin_id, &product_id)).await
    }

    /// Buy featured placement (owner)
    pub async fn boost_product(
        &self,
        vendor_id: AccountId,
        product_id: ProductId,
        days: u32,
    ) -> Result<BoostReceipt> {
        self.call(move |m| m.boost_product(&vendor_id, &product_id, days))
            .await
    }

    /// Product by ID
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.call(move |m| m.product(&id)).await
    }

    /// Active listings, boosted first
    pub async fn browse(&self, campus: Option<CampusId>) -> Result<Vec<Product>> {
        self.call(move |m| Ok(m.browse(campus.as_ref()))).await
    }

    /// Every listing of a vendor
    pub async fn vendor_listings(&self, vendor_id: AccountId) -> Result<Vec<Product>> {
        self.call(move |m| Ok(m.vendor_listings(&vendor_id))).await
    }

    /// Approval queue (admin)
    pub async fn pending_listings(&self, admin_id: AccountId) -> Result<Vec<Product>> {
        self.call(move |m| m.pending_listings(&admin_id)).await
    }

    /// Vendor directory (admin)
    pub async fn vendors(
        &self,
        admin_id: AccountId,
        status: Option<VendorStatus>,
        search: Option<String>,
    ) -> Result<Vec<Account>> {
        self.call(move |m| m.vendors(&admin_id, status, search.as_deref()))
            .await
    }

    /// Add to cart
    pub async fn add_to_cart(
        &self,
        customer_id: AccountId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        self.call(move |m| m.add_to_cart(&customer_id, &product_id, quantity))
            .await
    }

    /// Remove from cart
    pub async fn remove_from_cart(&self, customer_id: AccountId, product_id: ProductId) -> Result<bool> {
        self.call(move |m| m.remove_from_cart(&customer_id, &product_id))
            .await
    }

    /// Overwrite a cart line's quantity
    pub async fn set_cart_quantity(
        &self,
        customer_id: AccountId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        self.call(move |m| m.set_cart_quantity(&customer_id, &product_id, quantity))
            .await
    }

    /// Empty the cart
    pub async fn clear_cart(&self, customer_id: AccountId) -> Result<()> {
        self.call(move |m| m.clear_cart(&customer_id)).await
    }

    /// Current cart
    pub async fn cart(&self, customer_id: AccountId) -> Result<Cart> {
        self.call(move |m| m.cart(&customer_id)).await
    }

    /// Checkout preview
    pub async fn quote_cart(&self, customer_id: AccountId) -> Result<CartQuote> {
        self.call(move |m| m.quote_cart(&customer_id)).await
    }

    /// Settle the cart
    pub async fn checkout(
        &self,
        customer_id: AccountId,
        delivery: Option<DeliveryDetails>,
        expected_total: Option<Money>,
    ) -> Result<CheckoutReceipt> {
        self.call(move |m| m.checkout(&customer_id, delivery, expected_total))
            .await
    }

    /// Mark an order delivered (vendor owner or admin)
    pub async fn fulfill_order(&self, actor_id: AccountId, order_id: OrderId) -> Result<Order> {
        self.call(move |m| m.fulfill_order(&actor_id, &order_id)).await
    }

    /// Cancel an order (vendor owner or admin)
    pub async fn cancel_order(&self, actor_id: AccountId, order_id: OrderId) -> Result<Cancellation> {
        self.call(move |m| m.cancel_order(&actor_id, &order_id)).await
    }

    /// Order by ID
    pub async fn order(&self, id: OrderId) -> Result<Order> {
        self.call(move |m| m.order(&id)).await
    }

    /// Orders placed by a buyer
    pub async fn orders_for_buyer(&self, buyer_id: AccountId) -> Result<Vec<Order>> {
        self.call(move |m| Ok(m.orders_for_buyer(&buyer_id))).await
    }

    /// Orders owed by a vendor
    pub async fn orders_for_vendor(&self, vendor_id: AccountId) -> Result<Vec<Order>> {
        self.call(move |m| Ok(m.orders_for_vendor(&vendor_id))).await
    }

    /// Paid orders awaiting delivery
    pub async fn pending_fulfilment(&self, vendor_id: AccountId) -> Result<Vec<Order>> {
        self.call(move |m| Ok(m.pending_fulfilment(&vendor_id))).await
    }

    /// Sales history for reporting
    pub async fn vendor_sales(&self, vendor_id: AccountId) -> Result<VendorSales> {
        self.call(move |m| m.vendor_sales(&vendor_id)).await
    }

    /// Review a purchased product
    pub async fn submit_review(
        &self,
        customer_id: AccountId,
        product_id: ProductId,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review> {
        self.call(move |m| m.submit_review(&customer_id, &product_id, rating, comment))
            .await
    }

    /// Reviews of a product
    pub async fn reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        self.call(move |m| Ok(m.reviews_for_product(&product_id))).await
    }

    /// Vendor rating aggregate
    pub async fn vendor_rating(&self, vendor_id: AccountId) -> Result<VendorRating> {
        self.call(move |m| m.vendor_rating(&vendor_id)).await
    }

    /// Admin dashboard counters
    pub async fn admin_overview(&self) -> Result<AdminOverview> {
        self.call(|m| m.admin_overview()).await
    }

    /// Σ of every wallet plus platform revenue
    pub async fn total_money(&self) -> Result<Money> {
        self.call(|m| m.total_money()).await
    }

    /// Flush batch immediately
    pub async fn flush_batch(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MarketMessage::FlushBatch { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Flush and stop the actor
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MarketMessage::Shutdown { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }
}

impl std::fmt::Debug for MarketplaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceHandle")
            .field("closed", &self.sender.is_closed())
            .finish_non_exhaustive()
    }
}

/// Spawn the marketplace actor
pub fn spawn_marketplace_actor(market: Marketplace, storage: Option<Arc<Storage>>) -> MarketplaceHandle {
    let (tx, rx) = mpsc::channel(market.config().events.mailbox_capacity);
    let events = market.event_bus();
    let metrics = market.metrics().clone();
    let actor = MarketplaceActor::new(market, storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    MarketplaceHandle {
        sender: tx,
        events,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = MarketplaceHandle::open(Config::in_memory()).await.unwrap();
        handle.shutdown().await.unwrap();
        assert!(matches!(
            handle.campuses().await,
            Err(Error::Concurrency(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_seeded_checkout() {
        let mut config = Config::in_memory();
        config.seed_demo_data = true;
        let handle = MarketplaceHandle::open(config).await.unwrap();
        let cust = AccountId::new("cust1");

        handle
            .add_to_cart(cust.clone(), ProductId::new("p2"), 2)
            .await
            .unwrap();
        let receipt = handle.checkout(cust.clone(), None, None).await.unwrap();
        assert_eq!(receipt.total(), Money::from_minor(100_000));
        assert_eq!(
            handle.balance(cust).await.unwrap(),
            Money::from_minor(9_900_000)
        );
        assert_eq!(handle.metrics().checkouts_total.get(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_stays_pending_until_retried() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().join("db");
        config.batching.enabled = false;
        let cust = AccountId::new("cust1");

        let storage = Arc::new(Storage::open(&config).unwrap());
        let mut market = Marketplace::new(config.clone()).unwrap();
        market.seed_demo_data().unwrap();
        storage.write_changes(&market.take_changes()).unwrap();
        let handle = spawn_marketplace_actor(market, Some(storage.clone()));

        // Every write touching orders now fails
        storage.drop_column_family("orders").unwrap();
        handle
            .add_to_cart(cust.clone(), ProductId::new("p1"), 1)
            .await
            .unwrap();
        let receipt = handle.checkout(cust.clone(), None, None).await.unwrap();

        // Applied in memory and reported as such
        assert_eq!(
            handle.balance(cust.clone()).await.unwrap(),
            Money::from_minor(9_250_000)
        );
        assert!(matches!(
            handle.flush_batch().await,
            Err(Error::Storage(_))
        ));

        // A later write must not persist the debit without its orders
        handle
            .submit_review(cust.clone(), ProductId::new("p1"), 4, None)
            .await
            .unwrap();
        assert!(handle.flush_batch().await.is_err());

        storage.create_column_family("orders").unwrap();
        handle.flush_batch().await.unwrap();
        handle.shutdown().await.unwrap();
        drop(storage);

        let storage = Storage::open(&config).unwrap();
        let restored = Marketplace::restore(config, storage.load_state().unwrap()).unwrap();
        assert_eq!(restored.balance(&cust).unwrap(), Money::from_minor(9_250_000));
        assert_eq!(
            restored.order(&receipt.orders[0].id).unwrap().status,
            OrderStatus::Paid
        );
        assert_eq!(restored.reviews_for_product(&ProductId::new("p1")).len(), 1);
        assert!(restored.check_money_conservation());
        assert_eq!(restored.total_money().unwrap(), Money::from_minor(13_200_000));
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_overdraw() {
        let mut config = Config::in_memory();
        config.seed_demo_data = true;
        let handle = MarketplaceHandle::open(config).await.unwrap();
        let cust = AccountId::new("cust1");
        let before = handle.total_money().await.unwrap();

        // Each checkout is ₦7,500; the wallet covers thirteen of them
        let mut tasks = Vec::new();
        for _ in 0..20 {
            let handle = handle.clone();
            let cust = cust.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .add_to_cart(cust.clone(), ProductId::new("p1"), 1)
                    .await?;
                handle.checkout(cust, None, None).await
            }));
        }

        let mut settled = 0u64;
        for task in tasks {
            if let Ok(receipt) = task.await.unwrap() {
                settled += receipt.total().minor();
            }
        }

        let balance = handle.balance(cust).await.unwrap();
        assert_eq!(balance.minor(), 10_000_000 - settled);
        assert_eq!(handle.total_money().await.unwrap(), before);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_subscriber_sees_events() {
        let mut config = Config::in_memory();
        config.seed_demo_data = true;
        let handle = MarketplaceHandle::open(config).await.unwrap();
        let mut events = handle.subscribe();

        handle
            .add_to_cart(AccountId::new("cust1"), ProductId::new("p1"), 1)
            .await
            .unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            MarketEvent::CartChanged { item_count: 1, .. }
        ));

        handle.shutdown().await.unwrap();
    }
}

//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Accounts with wallet balances (key: account_id)
//! - `products` - Listings (key: product_id)
//! - `orders` - Orders (key: order_id, UUIDv7 so iteration is chronological)
//! - `settlements` - Checkout journal entries (key: settlement_id)
//! - `reviews` - Review log (key: review_id)
//! - `meta` - Campuses (key: `campus/<id>`) and platform revenue
//!
//! Mutations reach storage as [`ChangeSet`]s. A batch of change sets is merged
//! and committed in one `WriteBatch`, so a checkout's debit, credits, orders and
//! journal entry are either all on disk or none are.

use crate::{
    error::{Error, Result},
    types::{
        Account, AccountId, Campus, CampusId, Money, Order, OrderId, Product, ProductId, Review,
        ReviewId, Settlement, SettlementId,
    },
    Config,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompressionType, IteratorMode, Options,
    WriteBatch, DB,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_PRODUCTS: &str = "products";
const CF_ORDERS: &str = "orders";
const CF_SETTLEMENTS: &str = "settlements";
const CF_REVIEWS: &str = "reviews";
const CF_META: &str = "meta";

const META_CAMPUS_PREFIX: &[u8] = b"campus/";
const META_PLATFORM_REVENUE: &[u8] = b"platform_revenue";

/// Records touched by one or more mutations, pending persistence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Created campuses
    pub campuses: BTreeMap<CampusId, Campus>,
    /// Latest version of each touched account
    pub accounts: BTreeMap<AccountId, Account>,
    /// Latest version of each touched product
    pub products: BTreeMap<ProductId, Product>,
    /// Deleted products
    pub removed_products: BTreeSet<ProductId>,
    /// Latest version of each touched order
    pub orders: BTreeMap<OrderId, Order>,
    /// New settlements
    pub settlements: BTreeMap<SettlementId, Settlement>,
    /// New reviews
    pub reviews: BTreeMap<ReviewId, Review>,
    /// Platform revenue balance, when it changed
    pub platform_revenue: Option<Money>,
}

impl ChangeSet {
    /// Record a campus
    pub fn campus(&mut self, campus: &Campus) {
        self.campuses.insert(campus.id.clone(), campus.clone());
    }

    /// Record an account's current state
    pub fn account(&mut self, account: &Account) {
        self.accounts.insert(account.id.clone(), account.clone());
    }

    /// Record a product's current state
    pub fn product(&mut self, product: &Product) {
        self.removed_products.remove(&product.id);
        self.products.insert(product.id.clone(), product.clone());
    }

    /// Record a product deletion
    pub fn remove_product(&mut self, product_id: &ProductId) {
        self.products.remove(product_id);
        self.removed_products.insert(product_id.clone());
    }

    /// Record an order's current state
    pub fn order(&mut self, order: &Order) {
        self.orders.insert(order.id, order.clone());
    }

    /// Record a settlement
    pub fn settlement(&mut self, settlement: &Settlement) {
        self.settlements.insert(settlement.id, settlement.clone());
    }

    /// Record a review
    pub fn review(&mut self, review: &Review) {
        self.reviews.insert(review.id, review.clone());
    }

    /// Record the platform revenue balance
    pub fn platform_revenue(&mut self, balance: Money) {
        self.platform_revenue = Some(balance);
    }

    /// Fold a later change set into this one; later versions win
    pub fn merge(&mut self, later: ChangeSet) {
        self.campuses.extend(later.campuses);
        self.accounts.extend(later.accounts);
        for (id, product) in later.products {
            self.removed_products.remove(&id);
            self.products.insert(id, product);
        }
        for id in later.removed_products {
            self.products.remove(&id);
            self.removed_products.insert(id);
        }
        self.orders.extend(later.orders);
        self.settlements.extend(later.settlements);
        self.reviews.extend(later.reviews);
        if later.platform_revenue.is_some() {
            self.platform_revenue = later.platform_revenue;
        }
    }

    /// Number of records touched
    pub fn len(&self) -> usize {
        self.campuses.len()
            + self.accounts.len()
            + self.products.len()
            + self.removed_products.len()
            + self.orders.len()
            + self.settlements.len()
            + self.reviews.len()
            + usize::from(self.platform_revenue.is_some())
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Full persisted state, loaded at startup
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    /// Campuses
    pub campuses: Vec<Campus>,
    /// Accounts
    pub accounts: Vec<Account>,
    /// Products
    pub products: Vec<Product>,
    /// Orders, oldest first
    pub orders: Vec<Order>,
    /// Settlements, oldest first
    pub settlements: Vec<Settlement>,
    /// Reviews, oldest first
    pub reviews: Vec<Review>,
    /// Platform revenue balance
    pub platform_revenue: Money,
}

impl MarketState {
    /// True when nothing was ever persisted
    pub fn is_empty(&self) -> bool {
        self.campuses.is_empty() && self.accounts.is_empty() && self.products.is_empty()
    }
}

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_PRODUCTS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_ORDERS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_SETTLEMENTS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_REVIEWS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        tracing::info!(path = ?path, "Opened RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    // Frequently rewritten records
    fn cf_options_hot() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(DBCompressionType::Lz4);
        opts
    }

    // Append-mostly records
    fn cf_options_log() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(DBCompressionType::Zstd);
        opts
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Commit a change set in one atomic write batch
    pub fn write_changes(&self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::default();

        let cf_meta = self.cf(CF_META)?;
        for campus in changes.campuses.values() {
            batch.put_cf(&cf_meta, campus_key(&campus.id), encode(campus)?);
        }
        if let Some(revenue) = changes.platform_revenue {
            batch.put_cf(&cf_meta, META_PLATFORM_REVENUE, encode(&revenue)?);
        }

        let cf_accounts = self.cf(CF_ACCOUNTS)?;
        for account in changes.accounts.values() {
            batch.put_cf(&cf_accounts, account.id.as_str().as_bytes(), encode(account)?);
        }

        let cf_products = self.cf(CF_PRODUCTS)?;
        for product in changes.products.values() {
            batch.put_cf(&cf_products, product.id.as_str().as_bytes(), encode(product)?);
        }
        for product_id in &changes.removed_products {
            batch.delete_cf(&cf_products, product_id.as_str().as_bytes());
        }

        let cf_orders = self.cf(CF_ORDERS)?;
        for order in changes.orders.values() {
            batch.put_cf(&cf_orders, order.id.as_uuid().as_bytes(), encode(order)?);
        }

        let cf_settlements = self.cf(CF_SETTLEMENTS)?;
        for settlement in changes.settlements.values() {
            batch.put_cf(
                &cf_settlements,
                settlement.id.as_uuid().as_bytes(),
                encode(settlement)?,
            );
        }

        let cf_reviews = self.cf(CF_REVIEWS)?;
        for review in changes.reviews.values() {
            batch.put_cf(&cf_reviews, review.id.as_uuid().as_bytes(), encode(review)?);
        }

        self.db.write(batch)?;

        tracing::debug!(
            records = changes.len(),
            accounts = changes.accounts.len(),
            orders = changes.orders.len(),
            "Change set committed"
        );

        Ok(())
    }

    /// Load the full state
    pub fn load_state(&self) -> Result<MarketState> {
        let mut campuses = Vec::new();
        let mut platform_revenue = Money::ZERO;

        let cf_meta = self.cf(CF_META)?;
        for item in self.db.iterator_cf(&cf_meta, IteratorMode::Start) {
            let (key, value) = item?;
            if key.starts_with(META_CAMPUS_PREFIX) {
                campuses.push(bincode::deserialize(&value)?);
            } else if key.as_ref() == META_PLATFORM_REVENUE {
                platform_revenue = bincode::deserialize(&value)?;
            }
        }

        let state = MarketState {
            campuses,
            accounts: self.load_all(CF_ACCOUNTS)?,
            products: self.load_all(CF_PRODUCTS)?,
            orders: self.load_all(CF_ORDERS)?,
            settlements: self.load_all(CF_SETTLEMENTS)?,
            reviews: self.load_all(CF_REVIEWS)?,
            platform_revenue,
        };

        tracing::info!(
            accounts = state.accounts.len(),
            products = state.products.len(),
            orders = state.orders.len(),
            "State loaded"
        );

        Ok(state)
    }

    fn load_all<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }
        Ok(records)
    }

    /// Get order by ID
    pub fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        let cf = self.cf(CF_ORDERS)?;
        let value = self
            .db
            .get_cf(&cf, order_id.as_uuid().as_bytes())?
            .ok_or(Error::OrderNotFound(*order_id))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            total_accounts: self.approximate_count(CF_ACCOUNTS)?,
            total_products: self.approximate_count(CF_PRODUCTS)?,
            total_orders: self.approximate_count(CF_ORDERS)?,
        })
    }

    fn approximate_count(&self, name: &str) -> Result<u64> {
        let cf = self.cf(name)?;
        let count = self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(count)
    }

    /// Drop a column family so the next write touching it fails
    #[cfg(test)]
    pub(crate) fn drop_column_family(&self, name: &str) -> Result<()> {
        self.db.drop_cf(name)?;
        Ok(())
    }

    /// Recreate a dropped column family
    #[cfg(test)]
    pub(crate) fn create_column_family(&self, name: &str) -> Result<()> {
        self.db.create_cf(name, &Options::default())?;
        Ok(())
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        self.db.flush()?;
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .finish()
    }
}

/// Storage statistics (RocksDB estimates)
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Accounts
    pub total_accounts: u64,
    /// Products
    pub total_products: u64,
    /// Orders
    pub total_orders: u64,
}

fn campus_key(id: &CampusId) -> Vec<u8> {
    let mut key = META_CAMPUS_PREFIX.to_vec();
    key.extend_from_slice(id.as_str().as_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

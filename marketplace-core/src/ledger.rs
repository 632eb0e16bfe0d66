//! Order ledger: checkout settlement and the order state machine
//!
//! `checkout` turns cart lines into orders with an all-or-nothing wallet
//! transfer. Every precondition (cart contents, funds, credit headroom, quoted
//! total) is checked against current state before the first mutation, so a
//! failed checkout creates no orders and moves no money.
//!
//! # Invariants
//!
//! - Money conservation: for every settlement, Σ(vendor credits) == buyer debit
//! - Order amounts are snapshots: later price edits never change them
//! - Status moves forward only: paid -> fulfilled, pending|paid -> cancelled
//!
//! # Example
//!
//! ```text
//! cart: 2 × p1 (vendor A, 500) + 1 × p2 (vendor B, 300), buyer wallet 2000
//!
//! debit  buyer     1300  -> 700
//! credit vendor A  1000
//! credit vendor B   300
//! orders: [p1 × 2 = 1000 paid, p2 × 1 = 300 paid]
//! ```

use crate::{
    accounts::AccountStore,
    catalog::Catalog,
    types::{
        AccountId, CampusId, CartLine, DeliveryDetails, Money, Order, OrderId, OrderStatus,
        ProductId, ProductStatus, Settlement, SettlementId,
    },
    Error, Result,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a cart line was left out of a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Product no longer exists
    ProductMissing,
    /// Product exists but is not active
    NotActive(ProductStatus),
    /// Owning vendor account no longer exists
    VendorMissing,
}

/// Cart line excluded from a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// Product of the skipped line
    pub product_id: ProductId,
    /// Quantity that was not purchased
    pub quantity: u32,
    /// Reason
    pub reason: SkipReason,
}

/// Priced cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    /// Product
    pub product_id: ProductId,
    /// Product name at quote time
    pub name: String,
    /// Vendor to credit
    pub vendor_id: AccountId,
    /// Campus of the product
    pub campus_id: CampusId,
    /// Current unit price
    pub unit_price: Money,
    /// Quantity
    pub quantity: u32,
    /// unit_price × quantity
    pub amount: Money,
}

/// Checkout preview at current catalog prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartQuote {
    /// Purchasable lines
    pub lines: Vec<QuoteLine>,
    /// Lines that would be skipped
    pub skipped: Vec<SkippedLine>,
    /// Σ of line amounts
    pub total: Money,
}

impl CartQuote {
    /// Amount owed to each vendor
    pub fn vendor_credits(&self) -> Result<BTreeMap<AccountId, Money>> {
        let mut credits: BTreeMap<AccountId, Money> = BTreeMap::new();
        for line in &self.lines {
            let entry = credits.entry(line.vendor_id.clone()).or_insert(Money::ZERO);
            *entry = entry.checked_add(line.amount)?;
        }
        Ok(credits)
    }
}

/// Result of a successful checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    /// Journal entry
    pub settlement: Settlement,
    /// Orders created, in cart order
    pub orders: Vec<Order>,
    /// Lines left out
    pub skipped: Vec<SkippedLine>,
    /// Buyer balance after the debit
    pub buyer_balance: Money,
}

impl CheckoutReceipt {
    /// Amount debited
    pub fn total(&self) -> Money {
        self.settlement.total
    }
}

/// Checkout input
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    /// Buyer to debit
    pub buyer_id: &'a AccountId,
    /// Cart contents
    pub lines: &'a [CartLine],
    /// Delivery contact copied onto every order
    pub delivery: Option<DeliveryDetails>,
    /// Total the buyer agreed to; a different settlement total is rejected
    pub expected_total: Option<Money>,
}

/// Refund moved by a cancellation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    /// Cancelled order
    pub order: Order,
    /// Amount returned to the buyer (zero for unpaid orders)
    pub refunded: Money,
}

/// System of record for orders and settlements
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: BTreeMap<OrderId, Order>,
    settlements: BTreeMap<SettlementId, Settlement>,
}

impl OrderLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records
    pub fn from_records(
        orders: impl IntoIterator<Item = Order>,
        settlements: impl IntoIterator<Item = Settlement>,
    ) -> Self {
        Self {
            orders: orders.into_iter().map(|o| (o.id, o)).collect(),
            settlements: settlements.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    /// Price cart lines at current catalog prices, skipping unpurchasable lines
    pub fn quote(lines: &[CartLine], catalog: &Catalog, accounts: &AccountStore) -> Result<CartQuote> {
        let mut priced = Vec::with_capacity(lines.len());
        let mut skipped = Vec::new();

        for line in lines {
            let reason = match catalog.find(&line.product_id) {
                None => Some(SkipReason::ProductMissing),
                Some(p) if p.status != ProductStatus::Active => Some(SkipReason::NotActive(p.status)),
                Some(p) if accounts.find(&p.vendor_id).is_none() => Some(SkipReason::VendorMissing),
                Some(_) => None,
            };

            if let Some(reason) = reason {
                skipped.push(SkippedLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    reason,
                });
                continue;
            }

            let product = catalog.get(&line.product_id)?;
            priced.push(QuoteLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                vendor_id: product.vendor_id.clone(),
                campus_id: product.campus_id.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                amount: product.price.times(line.quantity)?,
            });
        }

        let total = Money::sum(priced.iter().map(|l| l.amount))?;
        Ok(CartQuote {
            lines: priced,
            skipped,
            total,
        })
    }

    /// Settle a cart: debit the buyer, credit each vendor, append paid orders
    pub fn checkout(
        &mut self,
        request: CheckoutRequest<'_>,
        catalog: &Catalog,
        accounts: &mut AccountStore,
    ) -> Result<CheckoutReceipt> {
        if request.lines.is_empty() {
            return Err(Error::EmptyCart);
        }
        if let Some(delivery) = &request.delivery {
            delivery.validate()?;
        }

        let quote = Self::quote(request.lines, catalog, accounts)?;
        if quote.lines.is_empty() {
            return Err(Error::NoValidItems);
        }
        if let Some(expected) = request.expected_total {
            if expected != quote.total {
                return Err(Error::PriceChanged {
                    expected,
                    actual: quote.total,
                });
            }
        }

        let credits = quote.vendor_credits()?;

        // Every check happens before the first mutation
        accounts.ensure_funds(request.buyer_id, quote.total)?;
        for (vendor_id, amount) in &credits {
            accounts.ensure_credit_fits(vendor_id, *amount)?;
        }

        let buyer_balance = accounts.debit(request.buyer_id, quote.total)?;
        for (vendor_id, amount) in &credits {
            accounts.credit(vendor_id, *amount)?;
        }

        let now = Utc::now();
        let settlement_id = SettlementId::generate();
        let orders: Vec<Order> = quote
            .lines
            .iter()
            .map(|line| Order {
                id: OrderId::generate(),
                product_id: line.product_id.clone(),
                vendor_id: line.vendor_id.clone(),
                buyer_id: request.buyer_id.clone(),
                campus_id: line.campus_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                amount: line.amount,
                status: OrderStatus::Paid,
                delivery: request.delivery.clone(),
                settlement_id,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let settlement = Settlement {
            id: settlement_id,
            buyer_id: request.buyer_id.clone(),
            total: quote.total,
            credits: credits.into_iter().collect(),
            order_ids: orders.iter().map(|o| o.id).collect(),
            created_at: now,
        };

        for order in &orders {
            self.orders.insert(order.id, order.clone());
        }
        self.settlements.insert(settlement.id, settlement.clone());

        tracing::info!(
            settlement_id = %settlement.id,
            buyer = %settlement.buyer_id,
            total = %settlement.total,
            orders = orders.len(),
            skipped = quote.skipped.len(),
            "Checkout settled"
        );

        Ok(CheckoutReceipt {
            settlement,
            orders,
            skipped: quote.skipped,
            buyer_balance,
        })
    }

    /// Mark a paid order as delivered
    pub fn fulfill(&mut self, order_id: &OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Fulfilled)
    }

    /// Cancel a pending or paid order; paid orders are refunded from the vendor
    pub fn cancel(&mut self, order_id: &OrderId, accounts: &mut AccountStore) -> Result<Cancellation> {
        let order = self.get(order_id)?;
        Self::check_transition(order, OrderStatus::Cancelled)?;

        let refunded = if order.status == OrderStatus::Paid {
            accounts.ensure_funds(&order.vendor_id, order.amount)?;
            accounts.ensure_credit_fits(&order.buyer_id, order.amount)?;
            let (vendor_id, buyer_id, amount) =
                (order.vendor_id.clone(), order.buyer_id.clone(), order.amount);
            accounts.debit(&vendor_id, amount)?;
            accounts.credit(&buyer_id, amount)?;
            amount
        } else {
            Money::ZERO
        };

        let order = self.transition(order_id, OrderStatus::Cancelled)?;
        tracing::info!(
            order_id = %order.id,
            refunded = %refunded,
            "Order cancelled"
        );
        Ok(Cancellation { order, refunded })
    }

    /// Get order by ID
    pub fn get(&self, order_id: &OrderId) -> Result<&Order> {
        self.orders
            .get(order_id)
            .ok_or(Error::OrderNotFound(*order_id))
    }

    /// Orders placed by a buyer, oldest first
    pub fn orders_for_buyer(&self, buyer_id: &AccountId) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| &o.buyer_id == buyer_id)
            .cloned()
            .collect()
    }

    /// Orders owed by a vendor, oldest first
    pub fn orders_for_vendor(&self, vendor_id: &AccountId) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| &o.vendor_id == vendor_id)
            .cloned()
            .collect()
    }

    /// Paid orders the vendor still has to deliver, newest first
    pub fn pending_fulfilment(&self, vendor_id: &AccountId) -> Vec<Order> {
        self.orders
            .values()
            .rev()
            .filter(|o| &o.vendor_id == vendor_id && o.status == OrderStatus::Paid)
            .cloned()
            .collect()
    }

    /// Buyer holds a paid or fulfilled order for the product
    pub fn has_purchased(&self, buyer_id: &AccountId, product_id: &ProductId) -> bool {
        self.orders.values().any(|o| {
            &o.buyer_id == buyer_id
                && &o.product_id == product_id
                && matches!(o.status, OrderStatus::Paid | OrderStatus::Fulfilled)
        })
    }

    /// Settlement by ID
    pub fn settlement(&self, id: &SettlementId) -> Option<&Settlement> {
        self.settlements.get(id)
    }

    /// All orders, oldest first
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// All settlements, oldest first
    pub fn settlements(&self) -> impl Iterator<Item = &Settlement> {
        self.settlements.values()
    }

    /// Check money conservation invariant
    ///
    /// Every settlement credits exactly what it debits, and its orders add up
    /// to the settled total.
    pub fn check_money_conservation(&self) -> bool {
        self.settlements.values().all(|settlement| {
            let order_total = Money::sum(
                settlement
                    .order_ids
                    .iter()
                    .filter_map(|id| self.orders.get(id))
                    .map(|o| o.amount),
            );
            settlement.is_balanced()
                && settlement.order_ids.len()
                    == settlement
                        .order_ids
                        .iter()
                        .filter(|id| self.orders.contains_key(id))
                        .count()
                && order_total.map_or(false, |total| total == settlement.total)
        })
    }

    fn check_transition(order: &Order, next: OrderStatus) -> Result<()> {
        if !order.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                entity: "order",
                from: order.status.to_string(),
                to: next.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, order_id: &OrderId, next: OrderStatus) -> Result<Order> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or(Error::OrderNotFound(*order_id))?;
        Self::check_transition(order, next)?;
        order.status = next;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewAccount, ProductDraft, ProductPatch, Role};

    struct Fixture {
        catalog: Catalog,
        accounts: AccountStore,
        ledger: OrderLedger,
    }

    fn register(accounts: &mut AccountStore, id: &str, role: Role, wallet: u64) {
        accounts
            .register(NewAccount {
                id: AccountId::new(id),
                name: id.to_string(),
                role,
                campus_id: CampusId::new("unilag"),
                wallet: Money::from_minor(wallet),
                referral_code: None,
                referred_by: None,
                shop_name: (role == Role::Vendor).then(|| format!("{} shop", id)),
                bio: None,
            })
            .unwrap();
    }

    fn list(catalog: &mut Catalog, vendor: &str, price: u64) -> ProductId {
        let product = catalog
            .create(
                AccountId::new(vendor),
                ProductDraft {
                    campus_id: CampusId::new("unilag"),
                    name: format!("{} item", vendor),
                    description: None,
                    category: "General".to_string(),
                    images: vec![],
                    price: Money::from_minor(price),
                },
            )
            .unwrap();
        catalog.set_status(&product.id, ProductStatus::Active).unwrap();
        product.id
    }

    fn fixture(buyer_wallet: u64) -> Fixture {
        let mut accounts = AccountStore::new();
        register(&mut accounts, "buyer", Role::Customer, buyer_wallet);
        register(&mut accounts, "vendA", Role::Vendor, 0);
        register(&mut accounts, "vendB", Role::Vendor, 0);
        Fixture {
            catalog: Catalog::new(),
            accounts,
            ledger: OrderLedger::new(),
        }
    }

    fn line(product_id: &ProductId, quantity: u32) -> CartLine {
        CartLine {
            product_id: product_id.clone(),
            quantity,
        }
    }

    fn request<'a>(buyer: &'a AccountId, lines: &'a [CartLine]) -> CheckoutRequest<'a> {
        CheckoutRequest {
            buyer_id: buyer,
            lines,
            delivery: None,
            expected_total: None,
        }
    }

    fn balance(f: &Fixture, id: &str) -> u64 {
        f.accounts.balance(&AccountId::new(id)).unwrap().minor()
    }

    #[test]
    fn test_two_vendor_checkout() {
        let mut f = fixture(2000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let p2 = list(&mut f.catalog, "vendB", 300);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 2), line(&p2, 1)];

        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();

        assert_eq!(receipt.total(), Money::from_minor(1300));
        assert_eq!(receipt.buyer_balance, Money::from_minor(700));
        assert_eq!(balance(&f, "buyer"), 700);
        assert_eq!(balance(&f, "vendA"), 1000);
        assert_eq!(balance(&f, "vendB"), 300);
        assert_eq!(receipt.orders.len(), 2);
        assert!(receipt.orders.iter().all(|o| o.status == OrderStatus::Paid));
        assert_eq!(receipt.orders[0].amount, Money::from_minor(1000));
        assert!(receipt.settlement.is_balanced());
        assert!(f.ledger.check_money_conservation());
    }

    #[test]
    fn test_empty_cart() {
        let mut f = fixture(1000);
        let buyer = AccountId::new("buyer");
        let err = f
            .ledger
            .checkout(request(&buyer, &[]), &f.catalog, &mut f.accounts)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyCart));
        assert_eq!(balance(&f, "buyer"), 1000);
        assert_eq!(f.ledger.orders().count(), 0);
    }

    #[test]
    fn test_insufficient_funds_is_atomic() {
        let mut f = fixture(1000);
        let p1 = list(&mut f.catalog, "vendA", 1500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 1)];

        let err = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(balance(&f, "buyer"), 1000);
        assert_eq!(balance(&f, "vendA"), 0);
        assert_eq!(f.ledger.orders().count(), 0);
        assert_eq!(f.ledger.settlements().count(), 0);
    }

    #[test]
    fn test_inactive_and_missing_lines_skipped() {
        let mut f = fixture(5000);
        let active = list(&mut f.catalog, "vendA", 400);
        let suspended = list(&mut f.catalog, "vendB", 100);
        f.catalog.set_status(&suspended, ProductStatus::Suspended).unwrap();
        let buyer = AccountId::new("buyer");
        let lines = vec![
            line(&active, 1),
            line(&suspended, 1),
            line(&ProductId::new("gone"), 3),
        ];

        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();

        assert_eq!(receipt.orders.len(), 1);
        assert_eq!(receipt.total(), Money::from_minor(400));
        assert_eq!(receipt.skipped.len(), 2);
        assert_eq!(
            receipt.skipped[0].reason,
            SkipReason::NotActive(ProductStatus::Suspended)
        );
        assert_eq!(receipt.skipped[1].reason, SkipReason::ProductMissing);
    }

    #[test]
    fn test_all_lines_skipped() {
        let mut f = fixture(5000);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&ProductId::new("gone"), 1)];

        let err = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap_err();
        assert!(matches!(err, Error::NoValidItems));
        assert_eq!(balance(&f, "buyer"), 5000);
    }

    #[test]
    fn test_expected_total_mismatch() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 2)];

        let quote = OrderLedger::quote(&lines, &f.catalog, &f.accounts).unwrap();
        assert_eq!(quote.total, Money::from_minor(1000));

        f.catalog
            .update(
                &p1,
                ProductPatch {
                    price: Some(Money::from_minor(600)),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut req = request(&buyer, &lines);
        req.expected_total = Some(quote.total);
        let err = f.ledger.checkout(req, &f.catalog, &mut f.accounts).unwrap_err();
        assert!(matches!(err, Error::PriceChanged { .. }));
        assert_eq!(balance(&f, "buyer"), 5000);
    }

    #[test]
    fn test_order_amount_is_snapshot() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 2)];

        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();
        let order_id = receipt.orders[0].id;

        f.catalog
            .update(
                &p1,
                ProductPatch {
                    price: Some(Money::from_minor(9999)),
                    ..Default::default()
                },
            )
            .unwrap();

        let order = f.ledger.get(&order_id).unwrap();
        assert_eq!(order.amount, Money::from_minor(1000));
        assert_eq!(order.unit_price, Money::from_minor(500));
    }

    #[test]
    fn test_invalid_delivery_rejected_before_mutation() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 1)];

        let mut req = request(&buyer, &lines);
        req.delivery = Some(DeliveryDetails {
            name: "Jeffrey".to_string(),
            phone: String::new(),
            address: "Jaja Hall".to_string(),
        });

        assert!(matches!(
            f.ledger.checkout(req, &f.catalog, &mut f.accounts),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(balance(&f, "buyer"), 5000);
    }

    #[test]
    fn test_fulfil_and_terminal_states() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 1)];
        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();
        let order_id = receipt.orders[0].id;

        assert_eq!(f.ledger.pending_fulfilment(&AccountId::new("vendA")).len(), 1);
        let order = f.ledger.fulfill(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Fulfilled);
        assert!(f.ledger.pending_fulfilment(&AccountId::new("vendA")).is_empty());

        assert!(matches!(
            f.ledger.fulfill(&order_id),
            Err(Error::InvalidTransition { entity: "order", .. })
        ));
        assert!(f.ledger.cancel(&order_id, &mut f.accounts).is_err());
        assert!(matches!(
            f.ledger.fulfill(&OrderId::generate()),
            Err(Error::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_cancel_paid_order_refunds_buyer() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 2)];
        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();

        let cancellation = f.ledger.cancel(&receipt.orders[0].id, &mut f.accounts).unwrap();
        assert_eq!(cancellation.refunded, Money::from_minor(1000));
        assert_eq!(cancellation.order.status, OrderStatus::Cancelled);
        assert_eq!(balance(&f, "buyer"), 5000);
        assert_eq!(balance(&f, "vendA"), 0);
        assert!(!f.ledger.has_purchased(&buyer, &p1));
    }

    #[test]
    fn test_cancel_fails_when_vendor_spent_funds() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 1)];
        let receipt = f
            .ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();

        f.accounts
            .debit(&AccountId::new("vendA"), Money::from_minor(400))
            .unwrap();

        let err = f
            .ledger
            .cancel(&receipt.orders[0].id, &mut f.accounts)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(
            f.ledger.get(&receipt.orders[0].id).unwrap().status,
            OrderStatus::Paid
        );
        assert_eq!(balance(&f, "buyer"), 4500);
    }

    #[test]
    fn test_has_purchased() {
        let mut f = fixture(5000);
        let p1 = list(&mut f.catalog, "vendA", 500);
        let p2 = list(&mut f.catalog, "vendB", 500);
        let buyer = AccountId::new("buyer");
        let lines = vec![line(&p1, 1)];
        f.ledger
            .checkout(request(&buyer, &lines), &f.catalog, &mut f.accounts)
            .unwrap();

        assert!(f.ledger.has_purchased(&buyer, &p1));
        assert!(!f.ledger.has_purchased(&buyer, &p2));
        assert_eq!(f.ledger.orders_for_buyer(&buyer).len(), 1);
        assert_eq!(f.ledger.orders_for_vendor(&AccountId::new("vendB")).len(), 0);
    }
}

//! Core types for the marketplace
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (integer minor units for money, Decimal for ratings)
//! - One canonical schema shared by the store, storage and analytics

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get as string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new time-ordered id (UUIDv7)
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Account identifier (opaque id issued by the auth service)
    AccountId
);
string_id!(
    /// Product identifier
    ProductId
);
string_id!(
    /// Campus identifier ("unilag", "ui", ...)
    CampusId
);
uuid_id!(
    /// Order identifier
    OrderId
);
uuid_id!(
    /// Review identifier
    ReviewId
);
uuid_id!(
    /// Checkout settlement identifier
    SettlementId
);

impl ProductId {
    /// Generate a fresh product id
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }
}

/// Non-negative amount in minor currency units (kobo, cents)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero
    pub const ZERO: Money = Money(0);

    /// From minor units
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Minor units
    pub const fn minor(&self) -> u64 {
        self.0
    }

    /// True when zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Money) -> Result<Money> {
        self.0.checked_add(other.0).map(Money).ok_or(Error::AmountOverflow)
    }

    /// Checked subtraction; `None` when the result would be negative
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Checked multiplication by a quantity
    pub fn times(self, quantity: u32) -> Result<Money> {
        self.0
            .checked_mul(u64::from(quantity))
            .map(Money)
            .ok_or(Error::AmountOverflow)
    }

    /// Checked sum of many amounts
    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Nigerian Naira
    #[default]
    NGN,
    /// US Dollar
    USD,
    /// Ghanaian Cedi
    GHS,
    /// Kenyan Shilling
    KES,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::NGN => "NGN",
            Currency::USD => "USD",
            Currency::GHS => "GHS",
            Currency::KES => "KES",
        }
    }

    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::NGN => "₦",
            Currency::USD => "$",
            Currency::GHS => "GH₵",
            Currency::KES => "KSh",
        }
    }

    /// Parse from ISO code
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "NGN" => Some(Currency::NGN),
            "USD" => Some(Currency::USD),
            "GHS" => Some(Currency::GHS),
            "KES" => Some(Currency::KES),
            _ => None,
        }
    }

    /// Format minor units, e.g. `₦7,500.00`
    pub fn format(&self, amount: Money) -> String {
        let major = amount.minor() / 100;
        let minor = amount.minor() % 100;

        let digits = major.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{}{}.{:02}", self.symbol(), grouped, minor)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Campus a listing or account belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    /// Campus ID
    pub id: CampusId,
    /// Display name
    pub name: String,
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Student buying products
    Customer,
    /// Campus vendor selling products
    Vendor,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor subscription plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    /// Default plan
    #[default]
    Free,
    /// Paid plan
    Premium,
}

/// Vendor onboarding status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorStatus {
    /// Awaiting admin approval
    Pending,
    /// May list products
    Approved,
}

impl VendorStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
        }
    }
}

/// Vendor-specific account data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    /// Shop display name
    pub shop_name: String,
    /// Shop description
    pub bio: Option<String>,
    /// Subscription plan
    pub plan: Plan,
    /// Onboarding status
    pub status: VendorStatus,
    /// Sum of all ratings received
    pub rating_total: Decimal,
    /// Number of ratings received
    pub ratings_count: u64,
}

impl VendorProfile {
    /// New unapproved vendor with no ratings
    pub fn new(shop_name: impl Into<String>) -> Self {
        Self {
            shop_name: shop_name.into(),
            bio: None,
            plan: Plan::Free,
            status: VendorStatus::Pending,
            rating_total: Decimal::ZERO,
            ratings_count: 0,
        }
    }

    /// Seed an existing aggregate (average over `count` ratings)
    pub fn with_rating(mut self, average: Decimal, count: u64) -> Self {
        self.rating_total = average * Decimal::from(count);
        self.ratings_count = count;
        self
    }

    /// Running average (zero before the first rating)
    pub fn rating_average(&self) -> Decimal {
        if self.ratings_count == 0 {
            Decimal::ZERO
        } else {
            self.rating_total / Decimal::from(self.ratings_count)
        }
    }

    /// Fold one more rating into the aggregate
    pub fn record_rating(&mut self, rating: Rating) {
        self.rating_total += Decimal::from(rating.value());
        self.ratings_count += 1;
    }
}

/// Customer, vendor or admin account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: AccountId,
    /// Display name
    pub name: String,
    /// Role
    pub role: Role,
    /// Campus affiliation
    pub campus_id: CampusId,
    /// Wallet balance (never negative)
    pub wallet: Money,
    /// Own referral code
    pub referral_code: Option<String>,
    /// Referral code used at signup
    pub referred_by: Option<String>,
    /// Vendor data, present exactly when role is vendor
    pub vendor: Option<VendorProfile>,
    /// Signup timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Check the account has the given role
    pub fn require_role(&self, role: Role) -> Result<()> {
        if self.role != role {
            return Err(Error::PermissionDenied(format!(
                "{} is a {}, {} required",
                self.id, self.role, role
            )));
        }
        Ok(())
    }

    /// Vendor profile or permission error
    pub fn vendor_profile(&self) -> Result<&VendorProfile> {
        self.vendor
            .as_ref()
            .ok_or_else(|| Error::PermissionDenied(format!("{} is not a vendor", self.id)))
    }
}

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account ID issued by the auth service
    pub id: AccountId,
    /// Display name
    pub name: String,
    /// Role
    pub role: Role,
    /// Campus affiliation
    pub campus_id: CampusId,
    /// Opening wallet balance
    pub wallet: Money,
    /// Own referral code
    pub referral_code: Option<String>,
    /// Referral code used at signup
    pub referred_by: Option<String>,
    /// Shop name, required for vendors
    pub shop_name: Option<String>,
    /// Shop description
    pub bio: Option<String>,
}

/// Product lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    /// Awaiting admin approval
    Pending,
    /// Visible and purchasable
    Active,
    /// Removed from sale by an admin
    Suspended,
}

impl ProductStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Active => "active",
            ProductStatus::Suspended => "suspended",
        }
    }

    /// Allowed transitions: pending -> active -> suspended
    pub fn can_transition_to(&self, next: ProductStatus) -> bool {
        matches!(
            (self, next),
            (ProductStatus::Pending, ProductStatus::Active)
                | (ProductStatus::Active, ProductStatus::Suspended)
        )
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID
    pub id: ProductId,
    /// Owning vendor
    pub vendor_id: AccountId,
    /// Campus the product is sold on
    pub campus_id: CampusId,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Category ("Fashion", "Food & Snacks", ...)
    pub category: String,
    /// Public image URLs
    pub images: Vec<String>,
    /// Unit price (positive)
    pub price: Money,
    /// Lifecycle status
    pub status: ProductStatus,
    /// Boost expiry
    pub featured_until: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Boost still running at `now`
    pub fn is_featured(&self, now: DateTime<Utc>) -> bool {
        self.featured_until.map_or(false, |until| until > now)
    }
}

/// Vendor input for a new listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Campus to list on
    pub campus_id: CampusId,
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Category
    pub category: String,
    /// Image URLs
    pub images: Vec<String>,
    /// Unit price
    pub price: Money,
}

/// Partial product update; status is not patchable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New image URLs
    pub images: Option<Vec<String>>,
    /// New unit price
    pub price: Option<Money>,
}

/// One cart selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Selected product
    pub product_id: ProductId,
    /// Quantity (at least 1)
    pub quantity: u32,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, not yet paid
    Pending,
    /// Paid at checkout
    Paid,
    /// Delivered by the vendor (terminal)
    Fulfilled,
    /// Cancelled (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed transitions: pending -> paid -> fulfilled, pending|paid -> cancelled
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Paid, OrderStatus::Fulfilled)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
        )
    }

    /// Check if order is in terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the vendor should deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    /// Recipient name
    pub name: String,
    /// Contact phone
    pub phone: String,
    /// Delivery address (hostel, faculty, ...)
    pub address: String,
}

impl DeliveryDetails {
    /// All fields must be non-blank
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "delivery {} must not be blank",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Purchase record, created at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Purchased product
    pub product_id: ProductId,
    /// Vendor credited for this order
    pub vendor_id: AccountId,
    /// Buyer debited for this order
    pub buyer_id: AccountId,
    /// Campus of the product
    pub campus_id: CampusId,
    /// Quantity purchased
    pub quantity: u32,
    /// Unit price at checkout
    pub unit_price: Money,
    /// unit_price × quantity, fixed at creation
    pub amount: Money,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Delivery contact
    pub delivery: Option<DeliveryDetails>,
    /// Checkout this order was settled in
    pub settlement_id: SettlementId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// Journal entry for one checkout: one debit, one credit per vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement ID
    pub id: SettlementId,
    /// Debited buyer
    pub buyer_id: AccountId,
    /// Amount debited
    pub total: Money,
    /// Amount credited per vendor
    pub credits: Vec<(AccountId, Money)>,
    /// Orders created
    pub order_ids: Vec<OrderId>,
    /// Settlement timestamp
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    /// Σ(credits) == debit
    pub fn is_balanced(&self) -> bool {
        Money::sum(self.credits.iter().map(|(_, amount)| *amount))
            .map_or(false, |credited| credited == self.total)
    }
}

/// Star rating in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rating(u8);

impl Rating {
    /// Validate a raw rating
    pub fn new(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidRating(value))
        }
    }

    /// Raw value
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Customer review (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed product
    pub product_id: ProductId,
    /// Vendor whose aggregate the rating folded into
    pub vendor_id: AccountId,
    /// Reviewer
    pub buyer_id: AccountId,
    /// Rating
    pub rating: Rating,
    /// Free text
    pub comment: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_checked_arithmetic() {
        let a = Money::from_minor(500);
        assert_eq!(a.times(2).unwrap(), Money::from_minor(1000));
        assert_eq!(a.checked_sub(Money::from_minor(600)), None);
        assert!(Money::from_minor(u64::MAX).checked_add(a).is_err());
        assert!(Money::from_minor(u64::MAX).times(2).is_err());
        assert_eq!(
            Money::sum([a, a, Money::from_minor(300)]).unwrap(),
            Money::from_minor(1300)
        );
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::NGN.format(Money::from_minor(750_000)), "₦7,500.00");
        assert_eq!(Currency::NGN.format(Money::from_minor(5)), "₦0.05");
        assert_eq!(
            Currency::USD.format(Money::from_minor(123_456_789)),
            "$1,234,567.89"
        );
        assert_eq!(Currency::parse("GHS"), Some(Currency::GHS));
        assert_eq!(Currency::parse("XYZ"), None);
    }

    #[test]
    fn test_product_status_transitions() {
        assert!(ProductStatus::Pending.can_transition_to(ProductStatus::Active));
        assert!(ProductStatus::Active.can_transition_to(ProductStatus::Suspended));
        assert!(!ProductStatus::Pending.can_transition_to(ProductStatus::Suspended));
        assert!(!ProductStatus::Suspended.can_transition_to(ProductStatus::Active));
    }

    #[test]
    fn test_order_status_moves_forward_only() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Fulfilled));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Fulfilled.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Fulfilled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert!(matches!(Rating::new(0), Err(Error::InvalidRating(0))));
        assert!(matches!(Rating::new(6), Err(Error::InvalidRating(6))));
    }

    #[test]
    fn test_vendor_rating_average() {
        let mut profile = VendorProfile::new("Campus Threads");
        assert_eq!(profile.rating_average(), Decimal::ZERO);

        profile.record_rating(Rating::new(5).unwrap());
        profile.record_rating(Rating::new(2).unwrap());
        assert_eq!(profile.ratings_count, 2);
        assert_eq!(profile.rating_average(), Decimal::new(35, 1));

        let seeded = VendorProfile::new("Tasty Bites").with_rating(Decimal::new(42, 1), 14);
        assert_eq!(seeded.rating_average(), Decimal::new(42, 1));
    }

    #[test]
    fn test_delivery_details_validation() {
        let mut details = DeliveryDetails {
            name: "Jeffrey".to_string(),
            phone: "08030000000".to_string(),
            address: "Jaja Hall".to_string(),
        };
        assert!(details.validate().is_ok());

        details.address = "   ".to_string();
        assert!(matches!(details.validate(), Err(Error::InvalidInput(_))));
    }
}

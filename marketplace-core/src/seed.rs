//! Demo data for offline mode: three campuses, an admin, a customer and two
//! approved vendors with one active listing each.

use crate::types::{
    Account, AccountId, Campus, CampusId, Money, Plan, Product, ProductId, ProductStatus, Role,
    VendorProfile, VendorStatus,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

pub(crate) fn campuses() -> Vec<Campus> {
    [("unilag", "UNILAG"), ("uniben", "UNIBEN"), ("ui", "UI Ibadan")]
        .into_iter()
        .map(|(id, name)| Campus {
            id: CampusId::new(id),
            name: name.to_string(),
        })
        .collect()
}

pub(crate) fn accounts(now: DateTime<Utc>) -> Vec<Account> {
    let account = |id: &str, name: &str, role: Role, wallet: u64| Account {
        id: AccountId::new(id),
        name: name.to_string(),
        role,
        campus_id: CampusId::new("unilag"),
        wallet: Money::from_minor(wallet),
        referral_code: None,
        referred_by: None,
        vendor: None,
        created_at: now,
    };

    let mut customer = account("cust1", "Jeffrey", Role::Customer, 10_000_000);
    customer.referral_code = Some("JEFF10".to_string());

    let mut threads = account("vend1", "Ada", Role::Vendor, 2_000_000);
    threads.vendor = Some(vendor_profile(
        "Campus Threads",
        "Trendy wearables for students",
        Plan::Premium,
        Decimal::new(46, 1),
        23,
    ));

    let mut bites = account("vend2", "Femi", Role::Vendor, 1_200_000);
    bites.vendor = Some(vendor_profile(
        "Tasty Bites",
        "Snacks & quick bites",
        Plan::Free,
        Decimal::new(42, 1),
        14,
    ));

    vec![
        account("admin1", "Admin", Role::Admin, 0),
        customer,
        threads,
        bites,
    ]
}

fn vendor_profile(shop: &str, bio: &str, plan: Plan, average: Decimal, count: u64) -> VendorProfile {
    let mut profile = VendorProfile::new(shop).with_rating(average, count);
    profile.bio = Some(bio.to_string());
    profile.plan = plan;
    profile.status = VendorStatus::Approved;
    profile
}

pub(crate) fn products(now: DateTime<Utc>) -> Vec<Product> {
    let hoodie = Product {
        id: ProductId::new("p1"),
        vendor_id: AccountId::new("vend1"),
        campus_id: CampusId::new("unilag"),
        name: "Vintage Hoodie".to_string(),
        description: Some("Comfy oversized hoodie, perfect for lectures.".to_string()),
        category: "Fashion".to_string(),
        images: vec![],
        price: Money::from_minor(750_000),
        status: ProductStatus::Active,
        featured_until: Some(now + Duration::days(2)),
        created_at: now,
        updated_at: now,
    };

    let pie = Product {
        id: ProductId::new("p2"),
        vendor_id: AccountId::new("vend2"),
        name: "Chicken Pie".to_string(),
        description: Some("Freshly baked every morning.".to_string()),
        category: "Food & Snacks".to_string(),
        price: Money::from_minor(50_000),
        featured_until: None,
        ..hoodie.clone()
    };

    vec![hoodie, pie]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_vendors_are_approved() {
        let accounts = accounts(Utc::now());
        let vendors: Vec<_> = accounts.iter().filter(|a| a.role == Role::Vendor).collect();
        assert_eq!(vendors.len(), 2);
        assert!(vendors
            .iter()
            .all(|v| v.vendor_profile().unwrap().status == VendorStatus::Approved));
    }

    #[test]
    fn test_demo_products_belong_to_demo_vendors() {
        let now = Utc::now();
        let accounts = accounts(now);
        for product in products(now) {
            assert!(accounts.iter().any(|a| a.id == product.vendor_id));
            assert_eq!(product.status, ProductStatus::Active);
        }
    }
}

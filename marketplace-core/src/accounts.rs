//! Account store: identity and wallet balances
//!
//! `debit` and `credit` are the only wallet mutators. Both check before they
//! mutate, so a failed call leaves the balance untouched.

use crate::{
    types::{
        Account, AccountId, Money, NewAccount, Plan, Rating, Role, VendorProfile, VendorStatus,
    },
    Error, Result,
};
use chrono::Utc;
use std::collections::HashMap;

/// In-memory account store
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<AccountId, Account>,
}

impl AccountStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted accounts
    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Create an account at signup
    pub fn register(&mut self, new: NewAccount) -> Result<Account> {
        if self.accounts.contains_key(&new.id) {
            return Err(Error::DuplicateAccount(new.id));
        }
        if new.name.trim().is_empty() {
            return Err(Error::InvalidInput("account name must not be blank".to_string()));
        }

        let vendor = match new.role {
            Role::Vendor => {
                let shop_name = new
                    .shop_name
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| Error::InvalidInput("vendors need a shop name".to_string()))?;
                let mut profile = VendorProfile::new(shop_name);
                profile.bio = new.bio;
                Some(profile)
            }
            Role::Customer | Role::Admin => None,
        };

        let account = Account {
            id: new.id,
            name: new.name,
            role: new.role,
            campus_id: new.campus_id,
            wallet: new.wallet,
            referral_code: new.referral_code,
            referred_by: new.referred_by,
            vendor,
            created_at: Utc::now(),
        };

        self.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    /// Insert a fully-formed account (seeding and restore)
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    /// Find by ID
    pub fn find(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Find by ID or fail
    pub fn get(&self, id: &AccountId) -> Result<&Account> {
        self.find(id).ok_or_else(|| Error::AccountNotFound(id.clone()))
    }

    /// Find by ID and check the role
    pub fn require(&self, id: &AccountId, role: Role) -> Result<&Account> {
        let account = self.get(id)?;
        account.require_role(role)?;
        Ok(account)
    }

    /// Current wallet balance
    pub fn balance(&self, id: &AccountId) -> Result<Money> {
        Ok(self.get(id)?.wallet)
    }

    /// Fail with `InsufficientFunds` unless the wallet covers `amount`
    pub fn ensure_funds(&self, id: &AccountId, amount: Money) -> Result<()> {
        let available = self.balance(id)?;
        if available < amount {
            return Err(Error::InsufficientFunds {
                account: id.clone(),
                required: amount,
                available,
            });
        }
        Ok(())
    }

    /// Fail with `AmountOverflow` unless crediting `amount` fits
    pub fn ensure_credit_fits(&self, id: &AccountId, amount: Money) -> Result<()> {
        self.balance(id)?.checked_add(amount).map(|_| ())
    }

    /// Remove `amount` from the wallet; the balance never goes negative
    pub fn debit(&mut self, id: &AccountId, amount: Money) -> Result<Money> {
        let account = self.get_mut(id)?;
        let remaining = account
            .wallet
            .checked_sub(amount)
            .ok_or_else(|| Error::InsufficientFunds {
                account: id.clone(),
                required: amount,
                available: account.wallet,
            })?;
        account.wallet = remaining;
        Ok(remaining)
    }

    /// Add `amount` to the wallet
    pub fn credit(&mut self, id: &AccountId, amount: Money) -> Result<Money> {
        let account = self.get_mut(id)?;
        account.wallet = account.wallet.checked_add(amount)?;
        Ok(account.wallet)
    }

    /// Approve a pending vendor
    pub fn approve_vendor(&mut self, id: &AccountId) -> Result<Account> {
        let account = self.get_mut(id)?;
        let profile = vendor_profile_mut(account)?;
        if profile.status != VendorStatus::Pending {
            return Err(Error::InvalidTransition {
                entity: "vendor",
                from: profile.status.as_str().to_string(),
                to: VendorStatus::Approved.as_str().to_string(),
            });
        }
        profile.status = VendorStatus::Approved;
        Ok(account.clone())
    }

    /// Change a vendor's plan
    pub fn change_plan(&mut self, id: &AccountId, plan: Plan) -> Result<Account> {
        let account = self.get_mut(id)?;
        vendor_profile_mut(account)?.plan = plan;
        Ok(account.clone())
    }

    /// Fold a rating into a vendor's running average
    pub fn record_rating(&mut self, id: &AccountId, rating: Rating) -> Result<Account> {
        let account = self.get_mut(id)?;
        vendor_profile_mut(account)?.record_rating(rating);
        Ok(account.clone())
    }

    /// Vendors filtered by approval status and a case-insensitive search over
    /// shop name, owner name and id, sorted by id
    pub fn vendors(&self, status: Option<VendorStatus>, search: Option<&str>) -> Vec<Account> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut vendors: Vec<Account> = self
            .accounts
            .values()
            .filter(|a| a.role == Role::Vendor)
            .filter(|a| match (status, &a.vendor) {
                (None, _) => true,
                (Some(wanted), Some(profile)) => profile.status == wanted,
                (Some(_), None) => false,
            })
            .filter(|a| match &needle {
                None => true,
                Some(needle) => {
                    let shop = a.vendor.as_ref().map(|v| v.shop_name.as_str()).unwrap_or("");
                    [shop, a.name.as_str(), a.id.as_str()]
                        .iter()
                        .any(|field| field.to_lowercase().contains(needle.as_str()))
                }
            })
            .cloned()
            .collect();
        vendors.sort_by(|a, b| a.id.cmp(&b.id));
        vendors
    }

    /// All accounts
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Σ of every wallet
    pub fn total_balance(&self) -> Result<Money> {
        Money::sum(self.accounts.values().map(|a| a.wallet))
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no accounts exist
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn get_mut(&mut self, id: &AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| Error::AccountNotFound(id.clone()))
    }
}

fn vendor_profile_mut(account: &mut Account) -> Result<&mut VendorProfile> {
    let id = account.id.clone();
    account
        .vendor
        .as_mut()
        .ok_or_else(|| Error::PermissionDenied(format!("{} is not a vendor", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CampusId;

    fn new_account(id: &str, role: Role, wallet: u64) -> NewAccount {
        NewAccount {
            id: AccountId::new(id),
            name: id.to_string(),
            role,
            campus_id: CampusId::new("unilag"),
            wallet: Money::from_minor(wallet),
            referral_code: None,
            referred_by: None,
            shop_name: (role == Role::Vendor).then(|| format!("{} shop", id)),
            bio: None,
        }
    }

    #[test]
    fn test_vendor_filters() {
        let mut store = AccountStore::new();
        store.register(new_account("cust1", Role::Customer, 0)).unwrap();
        store.register(new_account("vend1", Role::Vendor, 0)).unwrap();
        store.register(new_account("vend2", Role::Vendor, 0)).unwrap();
        store.approve_vendor(&AccountId::new("vend2")).unwrap();

        let ids = |list: Vec<Account>| list.into_iter().map(|a| a.id.to_string()).collect::<Vec<_>>();
        assert_eq!(ids(store.vendors(None, None)), vec!["vend1", "vend2"]);
        assert_eq!(ids(store.vendors(Some(VendorStatus::Pending), None)), vec!["vend1"]);
        assert_eq!(ids(store.vendors(Some(VendorStatus::Approved), None)), vec!["vend2"]);
        assert_eq!(ids(store.vendors(None, Some("VEND2 SHOP"))), vec!["vend2"]);
        assert_eq!(ids(store.vendors(None, Some("   "))).len(), 2);
        assert!(store.vendors(None, Some("cust1")).is_empty());
    }

    #[test]
    fn test_register_and_duplicate() {
        let mut store = AccountStore::new();
        let account = store.register(new_account("cust1", Role::Customer, 1000)).unwrap();
        assert_eq!(account.wallet, Money::from_minor(1000));
        assert!(account.vendor.is_none());

        assert!(matches!(
            store.register(new_account("cust1", Role::Customer, 0)),
            Err(Error::DuplicateAccount(_))
        ));
    }

    #[test]
    fn test_vendor_needs_shop_name() {
        let mut store = AccountStore::new();
        let mut vendor = new_account("vend1", Role::Vendor, 0);
        vendor.shop_name = None;
        assert!(matches!(store.register(vendor), Err(Error::InvalidInput(_))));

        let vendor = store.register(new_account("vend1", Role::Vendor, 0)).unwrap();
        let profile = vendor.vendor_profile().unwrap();
        assert_eq!(profile.status, VendorStatus::Pending);
        assert_eq!(profile.plan, Plan::Free);
    }

    #[test]
    fn test_debit_checks_before_mutating() {
        let mut store = AccountStore::new();
        store.register(new_account("cust1", Role::Customer, 1000)).unwrap();
        let id = AccountId::new("cust1");

        let err = store.debit(&id, Money::from_minor(1500)).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(store.balance(&id).unwrap(), Money::from_minor(1000));

        assert_eq!(store.debit(&id, Money::from_minor(1000)).unwrap(), Money::ZERO);
        assert_eq!(store.credit(&id, Money::from_minor(250)).unwrap(), Money::from_minor(250));
    }

    #[test]
    fn test_credit_overflow_leaves_balance() {
        let mut store = AccountStore::new();
        store.register(new_account("vend1", Role::Vendor, u64::MAX)).unwrap();
        let id = AccountId::new("vend1");

        assert!(store.ensure_credit_fits(&id, Money::from_minor(1)).is_err());
        assert!(matches!(
            store.credit(&id, Money::from_minor(1)),
            Err(Error::AmountOverflow)
        ));
        assert_eq!(store.balance(&id).unwrap(), Money::from_minor(u64::MAX));
    }

    #[test]
    fn test_unknown_account() {
        let mut store = AccountStore::new();
        let id = AccountId::new("ghost");
        assert!(matches!(store.debit(&id, Money::ZERO), Err(Error::AccountNotFound(_))));
        assert!(matches!(store.ensure_funds(&id, Money::ZERO), Err(Error::AccountNotFound(_))));
    }

    #[test]
    fn test_require_role() {
        let mut store = AccountStore::new();
        store.register(new_account("vend1", Role::Vendor, 0)).unwrap();
        assert!(store.require(&AccountId::new("vend1"), Role::Vendor).is_ok());
        assert!(matches!(
            store.require(&AccountId::new("vend1"), Role::Customer),
            Err(Error::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_vendor_lifecycle() {
        let mut store = AccountStore::new();
        store.register(new_account("vend1", Role::Vendor, 0)).unwrap();
        store.register(new_account("cust1", Role::Customer, 0)).unwrap();
        let vendor = AccountId::new("vend1");

        store.approve_vendor(&vendor).unwrap();
        assert!(matches!(
            store.approve_vendor(&vendor),
            Err(Error::InvalidTransition { entity: "vendor", .. })
        ));

        let account = store.change_plan(&vendor, Plan::Premium).unwrap();
        assert_eq!(account.vendor_profile().unwrap().plan, Plan::Premium);

        let account = store.record_rating(&vendor, Rating::new(4).unwrap()).unwrap();
        assert_eq!(account.vendor_profile().unwrap().ratings_count, 1);

        assert!(matches!(
            store.change_plan(&AccountId::new("cust1"), Plan::Premium),
            Err(Error::PermissionDenied(_))
        ));
    }
}

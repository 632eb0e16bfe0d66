//! Catalog store: product existence and lifecycle status
//!
//! Listings enter as `pending`, become `active` on admin approval and may be
//! `suspended` afterwards. Content edits never touch status.

use crate::{
    types::{AccountId, CampusId, Product, ProductDraft, ProductId, ProductPatch, ProductStatus},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// In-memory product catalog
#[derive(Debug, Default)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted products
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Create a listing from a draft; it starts as pending
    pub fn create(&mut self, vendor_id: AccountId, draft: ProductDraft) -> Result<Product> {
        validate_name(&draft.name)?;
        validate_category(&draft.category)?;
        if draft.price.is_zero() {
            return Err(Error::InvalidProduct("price must be positive".to_string()));
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            vendor_id,
            campus_id: draft.campus_id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            category: draft.category.trim().to_string(),
            images: draft.images,
            price: draft.price,
            status: ProductStatus::Pending,
            featured_until: None,
            created_at: now,
            updated_at: now,
        };

        self.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    /// Insert a fully-formed product (seeding and restore)
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Merge a patch into an existing listing
    pub fn update(&mut self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(category) = &patch.category {
            validate_category(category)?;
        }
        if patch.price.map_or(false, |price| price.is_zero()) {
            return Err(Error::InvalidProduct("price must be positive".to_string()));
        }

        let product = self.get_mut(id)?;
        if let Some(name) = patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(category) = patch.category {
            product.category = category.trim().to_string();
        }
        if let Some(images) = patch.images {
            product.images = images;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        product.updated_at = Utc::now();

        Ok(product.clone())
    }

    /// Remove a listing
    pub fn delete(&mut self, id: &ProductId) -> Result<Product> {
        self.products
            .remove(id)
            .ok_or_else(|| Error::ProductNotFound(id.clone()))
    }

    /// Move a listing along its lifecycle
    pub fn set_status(&mut self, id: &ProductId, next: ProductStatus) -> Result<Product> {
        let product = self.get_mut(id)?;
        if !product.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                entity: "product",
                from: product.status.to_string(),
                to: next.to_string(),
            });
        }
        product.status = next;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    /// Set the boost expiry
    pub fn set_featured_until(&mut self, id: &ProductId, until: DateTime<Utc>) -> Result<Product> {
        let product = self.get_mut(id)?;
        product.featured_until = Some(until);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    /// Find by ID
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    /// Find by ID or fail
    pub fn get(&self, id: &ProductId) -> Result<&Product> {
        self.find(id).ok_or_else(|| Error::ProductNotFound(id.clone()))
    }

    /// Resolve a purchasable listing; pending and suspended ones are rejected
    pub fn ensure_active(&self, id: &ProductId) -> Result<&Product> {
        let product = self.get(id)?;
        if product.status != ProductStatus::Active {
            return Err(Error::ProductNotActive {
                product: id.clone(),
                status: product.status,
            });
        }
        Ok(product)
    }

    /// Active listings, boosted first, then newest first
    pub fn browse(&self, campus: Option<&CampusId>, now: DateTime<Utc>) -> Vec<Product> {
        let mut listings: Vec<Product> = self
            .products
            .values()
            .filter(|p| p.status == ProductStatus::Active)
            .filter(|p| campus.map_or(true, |c| &p.campus_id == c))
            .cloned()
            .collect();

        listings.sort_by(|a, b| {
            b.is_featured(now)
                .cmp(&a.is_featured(now))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        listings
    }

    /// All listings of one vendor, newest first
    pub fn vendor_listings(&self, vendor_id: &AccountId) -> Vec<Product> {
        let mut listings: Vec<Product> = self
            .products
            .values()
            .filter(|p| &p.vendor_id == vendor_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        listings
    }

    /// Listings awaiting approval, oldest first
    pub fn pending(&self) -> Vec<Product> {
        let mut listings: Vec<Product> = self
            .products
            .values()
            .filter(|p| p.status == ProductStatus::Pending)
            .cloned()
            .collect();
        listings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        listings
    }

    /// All products
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// True when the catalog holds no products
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn get_mut(&mut self, id: &ProductId) -> Result<&mut Product> {
        self.products
            .get_mut(id)
            .ok_or_else(|| Error::ProductNotFound(id.clone()))
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidProduct("name must not be blank".to_string()));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<()> {
    if category.trim().is_empty() {
        return Err(Error::InvalidProduct("category must not be blank".to_string()));
    }
    Ok(())
}

//! Review log and vendor rating aggregation
//!
//! Reviews are append-only. Each accepted review folds its rating into the
//! owning vendor's `(rating_total, ratings_count)` aggregate, so the running
//! average equals the arithmetic mean of all ratings regardless of order.

use crate::{
    accounts::AccountStore,
    catalog::Catalog,
    ledger::OrderLedger,
    types::{AccountId, ProductId, Rating, Review, ReviewId},
    Error, Result,
};
use chrono::Utc;
use std::collections::BTreeMap;

/// Review submission
#[derive(Debug, Clone)]
pub struct ReviewRequest<'a> {
    /// Reviewer
    pub buyer_id: &'a AccountId,
    /// Reviewed product
    pub product_id: &'a ProductId,
    /// Raw rating (validated to 1..=5)
    pub rating: u8,
    /// Free text
    pub comment: Option<String>,
    /// Reviewer must hold a paid or fulfilled order
    pub require_purchase: bool,
}

/// Append-only review log
#[derive(Debug, Default)]
pub struct ReviewLog {
    reviews: BTreeMap<ReviewId, Review>,
}

impl ReviewLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted reviews
    pub fn from_reviews(reviews: impl IntoIterator<Item = Review>) -> Self {
        Self {
            reviews: reviews.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Validate and append a review, updating the vendor aggregate
    ///
    /// Nothing is written unless every check passes.
    pub fn submit(
        &mut self,
        request: ReviewRequest<'_>,
        catalog: &Catalog,
        accounts: &mut AccountStore,
        ledger: &OrderLedger,
    ) -> Result<Review> {
        let rating = Rating::new(request.rating)?;
        let product = catalog.get(request.product_id)?;
        let vendor_id = product.vendor_id.clone();
        accounts.get(&vendor_id)?.vendor_profile()?;

        if request.require_purchase && !ledger.has_purchased(request.buyer_id, request.product_id) {
            return Err(Error::PurchaseRequired {
                buyer: request.buyer_id.clone(),
                product: request.product_id.clone(),
            });
        }

        accounts.record_rating(&vendor_id, rating)?;

        let review = Review {
            id: ReviewId::generate(),
            product_id: request.product_id.clone(),
            vendor_id,
            buyer_id: request.buyer_id.clone(),
            rating,
            comment: request.comment.filter(|c| !c.trim().is_empty()),
            created_at: Utc::now(),
        };
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    /// Reviews of a product, oldest first
    pub fn for_product(&self, product_id: &ProductId) -> Vec<Review> {
        self.reviews
            .values()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Reviews of a vendor's products, oldest first
    pub fn for_vendor(&self, vendor_id: &AccountId) -> Vec<Review> {
        self.reviews
            .values()
            .filter(|r| &r.vendor_id == vendor_id)
            .cloned()
            .collect()
    }

    /// All reviews
    pub fn reviews(&self) -> impl Iterator<Item = &Review> {
        self.reviews.values()
    }

    /// Number of reviews
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    /// True when no reviews exist
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

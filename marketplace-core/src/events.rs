//! Change notifications
//!
//! UI layers subscribe here instead of polling the store. Publishing never
//! blocks: a subscriber that falls more than `channel_capacity` events behind
//! receives `RecvError::Lagged` and resynchronises from a query.

use crate::types::{
    AccountId, Money, OrderId, OrderStatus, Plan, ProductId, ProductStatus, ReviewId, SettlementId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// State change published after a successful mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Account signed up
    AccountRegistered {
        /// New account
        account_id: AccountId,
    },
    /// Vendor listed a product (pending approval)
    ListingCreated {
        /// Product
        product_id: ProductId,
        /// Owner
        vendor_id: AccountId,
    },
    /// Vendor edited listing content
    ListingUpdated {
        /// Product
        product_id: ProductId,
    },
    /// Listing removed
    ListingDeleted {
        /// Product
        product_id: ProductId,
    },
    /// Admin approved or suspended a listing
    ListingStatusChanged {
        /// Product
        product_id: ProductId,
        /// New status
        status: ProductStatus,
    },
    /// Listing boosted
    ProductBoosted {
        /// Product
        product_id: ProductId,
        /// Amount charged
        cost: Money,
        /// New boost expiry
        featured_until: DateTime<Utc>,
    },
    /// A customer's cart changed
    CartChanged {
        /// Cart owner
        customer_id: AccountId,
        /// Σ of quantities after the change
        item_count: u64,
    },
    /// Checkout settled
    CheckoutCompleted {
        /// Journal entry
        settlement_id: SettlementId,
        /// Buyer
        buyer_id: AccountId,
        /// Amount debited
        total: Money,
        /// Orders created
        order_ids: Vec<OrderId>,
    },
    /// Order moved along its lifecycle
    OrderStatusChanged {
        /// Order
        order_id: OrderId,
        /// New status
        status: OrderStatus,
    },
    /// Review accepted
    ReviewSubmitted {
        /// Review
        review_id: ReviewId,
        /// Reviewed product
        product_id: ProductId,
        /// Vendor whose aggregate changed
        vendor_id: AccountId,
    },
    /// Admin approved a vendor
    VendorApproved {
        /// Vendor
        vendor_id: AccountId,
    },
    /// Admin changed a vendor's plan
    VendorPlanChanged {
        /// Vendor
        vendor_id: AccountId,
        /// New plan
        plan: Plan,
    },
}

impl MarketEvent {
    /// Short event name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::AccountRegistered { .. } => "account_registered",
            MarketEvent::ListingCreated { .. } => "listing_created",
            MarketEvent::ListingUpdated { .. } => "listing_updated",
            MarketEvent::ListingDeleted { .. } => "listing_deleted",
            MarketEvent::ListingStatusChanged { .. } => "listing_status_changed",
            MarketEvent::ProductBoosted { .. } => "product_boosted",
            MarketEvent::CartChanged { .. } => "cart_changed",
            MarketEvent::CheckoutCompleted { .. } => "checkout_completed",
            MarketEvent::OrderStatusChanged { .. } => "order_status_changed",
            MarketEvent::ReviewSubmitted { .. } => "review_submitted",
            MarketEvent::VendorApproved { .. } => "vendor_approved",
            MarketEvent::VendorPlanChanged { .. } => "vendor_plan_changed",
        }
    }
}

/// Broadcast fan-out of marketplace events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MarketEvent>,
}

impl EventBus {
    /// Create a bus holding at most `capacity` undelivered events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns the number of subscribers reached
    pub fn publish(&self, event: MarketEvent) -> usize {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = kind, receivers, "Event published");
                receivers
            }
            // No subscribers is not an error
            Err(_) => 0,
        }
    }

    /// New subscription starting at the next published event
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender.subscribe()
    }

    /// Current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let event = MarketEvent::VendorApproved {
            vendor_id: AccountId::new("vend1"),
        };
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            bus.publish(MarketEvent::ListingDeleted {
                product_id: ProductId::new("p1"),
            }),
            0
        );
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..4 {
            bus.publish(MarketEvent::CartChanged {
                customer_id: AccountId::new("cust1"),
                item_count: i,
            });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
    }
}

//! Per-customer cart of pending selections
//!
//! The cart never looks at the catalog: existence and status are resolved at
//! checkout time.

use crate::{
    types::{CartLine, ProductId},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Ordered list of (product, quantity) selections, at most one line per product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, summing into an existing line
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<&CartLine> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        let index = match self.position(&product_id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    Error::InvalidInput("cart quantity overflow".to_string())
                })?;
                index
            }
            None => {
                self.lines.push(CartLine {
                    product_id,
                    quantity,
                });
                self.lines.len() - 1
            }
        };

        Ok(&self.lines[index])
    }

    /// Drop a product's line; returns whether one existed
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    /// Overwrite a line's quantity
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<&CartLine> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(quantity));
        }
        let index = self
            .position(product_id)
            .ok_or_else(|| Error::CartLineNotFound(product_id.clone()))?;
        self.lines[index].quantity = quantity;
        Ok(&self.lines[index])
    }

    /// Remove every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// True when the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Σ of quantities across lines
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| &line.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::new();
        cart.add(pid("p1"), 1).unwrap();
        cart.add(pid("p2"), 2).unwrap();
        let line = cart.add(pid("p1"), 3).unwrap();

        assert_eq!(line.quantity, 4);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].product_id, pid("p1"));
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut cart = Cart::new();
        assert!(matches!(cart.add(pid("p1"), 0), Err(Error::InvalidQuantity(0))));
        cart.add(pid("p1"), 1).unwrap();
        assert!(matches!(
            cart.set_quantity(&pid("p1"), 0),
            Err(Error::InvalidQuantity(0))
        ));
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add(pid("p1"), 1).unwrap();
        assert_eq!(cart.set_quantity(&pid("p1"), 250).unwrap().quantity, 250);
        assert!(matches!(
            cart.set_quantity(&pid("p9"), 2),
            Err(Error::CartLineNotFound(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(pid("p1"), 1).unwrap();
        cart.add(pid("p2"), 1).unwrap();

        assert!(cart.remove(&pid("p1")));
        assert!(!cart.remove(&pid("p1")));
        assert_eq!(cart.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_overflow() {
        let mut cart = Cart::new();
        cart.add(pid("p1"), u32::MAX).unwrap();
        assert!(cart.add(pid("p1"), 1).is_err());
        assert_eq!(cart.lines()[0].quantity, u32::MAX);
    }
}

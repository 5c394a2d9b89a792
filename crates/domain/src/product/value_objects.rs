//! Value objects for the allocation domain.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

/// A line of a customer order: some quantity of one sku.
///
/// Two lines with the same order id, sku and quantity are the same line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    order_id: OrderId,
    sku: Sku,
    qty: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        }
    }

    /// Returns the order this line belongs to.
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Returns the sku ordered.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the quantity ordered.
    pub fn qty(&self) -> u32 {
        self.qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lines_with_same_fields_are_interchangeable() {
        let a = OrderLine::new("order1", "RED-CHAIR", 10);
        let b = OrderLine::new("order1", "RED-CHAIR", 10);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn any_field_difference_makes_a_different_line() {
        let base = OrderLine::new("order1", "RED-CHAIR", 10);
        assert_ne!(base, OrderLine::new("order2", "RED-CHAIR", 10));
        assert_ne!(base, OrderLine::new("order1", "BLUE-CHAIR", 10));
        assert_ne!(base, OrderLine::new("order1", "RED-CHAIR", 11));
    }
}

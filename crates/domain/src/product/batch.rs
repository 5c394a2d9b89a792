//! Stock batches.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use common::{BatchReference, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// A discrete quantity of stock for one sku, optionally still in transit.
///
/// Identity is the batch reference: equality and hashing ignore every other
/// field. Allocations are a set, so allocating the same line twice only
/// consumes stock once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    reference: BatchReference,
    sku: Sku,
    eta: Option<NaiveDate>,
    purchased_quantity: u32,
    allocations: BTreeSet<OrderLine>,
}

impl Batch {
    /// Creates a batch with no allocations. `eta` is `None` for warehouse stock.
    pub fn new(
        reference: impl Into<BatchReference>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            eta,
            purchased_quantity: qty,
            allocations: BTreeSet::new(),
        }
    }

    pub fn reference(&self) -> &BatchReference {
        &self.reference
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    pub fn purchased_quantity(&self) -> u32 {
        self.purchased_quantity
    }

    /// Sum of the quantities of all allocated lines.
    pub fn allocated_quantity(&self) -> u32 {
        self.allocations.iter().map(OrderLine::qty).sum()
    }

    /// Quantity still free to allocate.
    pub fn available_quantity(&self) -> u32 {
        self.purchased_quantity
            .saturating_sub(self.allocated_quantity())
    }

    /// Returns true if the line is currently allocated to this batch.
    pub fn is_allocated(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    /// Returns true if the sku matches and the quantity fits the available stock.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == *line.sku() && line.qty() > 0 && line.qty() <= self.available_quantity()
    }

    /// Allocates the line if it fits; does nothing otherwise.
    pub(crate) fn allocate(&mut self, line: OrderLine) {
        if self.can_allocate(&line) {
            self.allocations.insert(line);
        }
    }

    /// Removes the line; returns whether it was allocated here.
    pub(crate) fn deallocate(&mut self, line: &OrderLine) -> bool {
        self.allocations.remove(line)
    }

    /// Removes and returns one allocated line, the smallest in line order.
    pub(crate) fn deallocate_one(&mut self) -> Option<OrderLine> {
        self.allocations.pop_first()
    }

    pub(crate) fn set_purchased_quantity(&mut self, qty: u32) {
        self.purchased_quantity = qty;
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl Hash for Batch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_batch_and_line(sku: &str, batch_qty: u32, line_qty: u32) -> (Batch, OrderLine) {
        (
            Batch::new("batch-001", sku, batch_qty, None),
            OrderLine::new("order-123", sku, line_qty),
        )
    }

    #[test]
    fn allocating_reduces_available_quantity() {
        let (mut batch, line) = make_batch_and_line("SMALL-TABLE", 20, 2);
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
        assert_eq!(batch.allocated_quantity(), 2);
    }

    #[test]
    fn can_allocate_if_available_greater_than_required() {
        let (batch, line) = make_batch_and_line("ELEGANT-LAMP", 20, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_if_available_smaller_than_required() {
        let (batch, line) = make_batch_and_line("ELEGANT-LAMP", 2, 20);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn can_allocate_if_available_equal_to_required() {
        let (batch, line) = make_batch_and_line("ELEGANT-LAMP", 2, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_if_skus_do_not_match() {
        let batch = Batch::new("batch-001", "UNCOMFORTABLE-CHAIR", 100, None);
        let line = OrderLine::new("order-123", "EXPENSIVE-TOASTER", 10);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_zero_quantity() {
        let (batch, line) = make_batch_and_line("ELEGANT-LAMP", 2, 0);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn allocation_is_idempotent() {
        let (mut batch, line) = make_batch_and_line("ANGULAR-DESK", 20, 2);
        batch.allocate(line.clone());
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
    }

    #[test]
    fn deallocate_restores_available_quantity() {
        let (mut batch, line) = make_batch_and_line("DECORATIVE-TRINKET", 20, 2);
        batch.allocate(line.clone());
        assert!(batch.deallocate(&line));
        assert_eq!(batch.available_quantity(), 20);
    }

    #[test]
    fn can_only_deallocate_allocated_lines() {
        let (mut batch, unallocated_line) = make_batch_and_line("DECORATIVE-TRINKET", 20, 2);
        assert!(!batch.deallocate(&unallocated_line));
        assert_eq!(batch.available_quantity(), 20);
    }

    #[test]
    fn deallocate_one_empties_the_batch_line_by_line() {
        let mut batch = Batch::new("batch-001", "LAMP", 20, None);
        batch.allocate(OrderLine::new("o1", "LAMP", 5));
        batch.allocate(OrderLine::new("o2", "LAMP", 5));

        assert!(batch.deallocate_one().is_some());
        assert_eq!(batch.allocated_quantity(), 5);
        assert!(batch.deallocate_one().is_some());
        assert!(batch.deallocate_one().is_none());
        assert_eq!(batch.available_quantity(), 20);
    }

    #[test]
    fn batches_with_same_reference_are_equal() {
        let a = Batch::new("batch-001", "LAMP", 20, None);
        let b = Batch::new("batch-001", "CHAIR", 5, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(a, b);
    }
}

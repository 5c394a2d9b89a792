//! Product aggregate implementation.

use common::{BatchReference, Sku, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{Batch, Event, OrderLine, ProductError};

/// Product aggregate root.
///
/// Owns every batch of one sku. All allocation changes go through it so that
/// each state change is paired with the event describing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    sku: Sku,

    batches: Vec<Batch>,

    /// Persisted version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Raised events not yet collected. Never persisted.
    #[serde(skip)]
    events: Vec<Event>,
}

impl Aggregate for Product {
    type Id = Sku;
    type Event = Event;

    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> &Sku {
        &self.sku
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn pending_events(&self) -> &[Event] {
        &self.events
    }

    fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

// Query methods
impl Product {
    /// Creates a product that has never been saved.
    pub fn new(sku: impl Into<Sku>, batches: Vec<Batch>) -> Self {
        Self {
            sku: sku.into(),
            batches,
            version: Version::initial(),
            events: Vec::new(),
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the batches in the order they were added.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns a batch by reference.
    pub fn batch(&self, reference: &BatchReference) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Returns true if one of the batches has the reference.
    pub fn has_batch(&self, reference: &BatchReference) -> bool {
        self.batch(reference).is_some()
    }

    /// Returns the batch the line is allocated to, if any.
    pub fn batch_holding(&self, line: &OrderLine) -> Option<&Batch> {
        self.batches.iter().find(|b| b.is_allocated(line))
    }

    /// Returns the batches in allocation preference order: warehouse stock
    /// (no eta) first, then shipments by earliest eta.
    pub fn batches_by_preference(&self) -> Vec<&Batch> {
        let mut batches: Vec<&Batch> = self.batches.iter().collect();
        batches.sort_by_key(|b| b.eta());
        batches
    }
}

// Command methods (mutate and record events)
impl Product {
    /// Adds a batch of this product's sku.
    pub fn add_batch(&mut self, batch: Batch) -> Result<(), ProductError> {
        if *batch.sku() != self.sku {
            return Err(ProductError::SkuMismatch {
                expected: self.sku.clone(),
                actual: batch.sku().clone(),
            });
        }

        if self.has_batch(batch.reference()) {
            return Err(ProductError::DuplicateBatch {
                reference: batch.reference().clone(),
            });
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Allocates the line to the preferred batch that can take it.
    ///
    /// Raises `Allocated` and returns the batch reference, or raises
    /// `OutOfStock` and returns `None` when no batch fits. A line that is
    /// already allocated keeps its batch: the reference is returned and
    /// nothing is raised.
    pub fn allocate(&mut self, line: OrderLine) -> Option<BatchReference> {
        if let Some(holder) = self.batch_holding(&line) {
            return Some(holder.reference().clone());
        }

        let chosen = self
            .batches_by_preference()
            .into_iter()
            .find(|b| b.can_allocate(&line))
            .map(|b| b.reference().clone());

        let Some(reference) = chosen else {
            self.events.push(Event::out_of_stock(line.sku().clone()));
            return None;
        };

        if let Some(batch) = self.batch_mut(&reference) {
            batch.allocate(line.clone());
        }
        self.events.push(Event::allocated(&line, reference.clone()));

        Some(reference)
    }

    /// Removes the line from every batch holding it. Raises no event.
    ///
    /// Returns false if no batch held the line.
    pub fn deallocate(&mut self, line: &OrderLine) -> bool {
        let mut removed = false;
        for batch in &mut self.batches {
            removed |= batch.deallocate(line);
        }
        removed
    }

    /// Sets a batch's purchased quantity, deallocating lines until the
    /// allocations fit again. Raises `Deallocated` for each removed line.
    pub fn change_batch_quantity(
        &mut self,
        reference: &BatchReference,
        qty: u32,
    ) -> Result<(), ProductError> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference() == reference)
            .ok_or_else(|| ProductError::BatchNotFound {
                reference: reference.clone(),
            })?;

        batch.set_purchased_quantity(qty);
        while batch.allocated_quantity() > qty {
            let Some(line) = batch.deallocate_one() else {
                break;
            };
            self.events.push(Event::deallocated(&line));
        }

        Ok(())
    }

    fn batch_mut(&mut self, reference: &BatchReference) -> Option<&mut Batch> {
        self.batches.iter_mut().find(|b| b.reference() == reference)
    }
}

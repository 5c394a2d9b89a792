//! Product domain events.

use common::{BatchReference, OrderId, Sku};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::OrderLine;

/// Events raised by the product aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// An order line was allocated to a batch.
    Allocated(Allocated),

    /// An order line lost its allocation because its batch shrank.
    Deallocated(Deallocated),

    /// No batch could take an order line.
    OutOfStock(OutOfStock),
}

impl DomainEvent for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Allocated(_) => "Allocated",
            Event::Deallocated(_) => "Deallocated",
            Event::OutOfStock(_) => "OutOfStock",
        }
    }
}

impl Event {
    /// Creates an Allocated event.
    pub fn allocated(line: &OrderLine, batch_reference: BatchReference) -> Self {
        Event::Allocated(Allocated {
            order_id: line.order_id().clone(),
            sku: line.sku().clone(),
            qty: line.qty(),
            batch_reference,
        })
    }

    /// Creates a Deallocated event.
    pub fn deallocated(line: &OrderLine) -> Self {
        Event::Deallocated(Deallocated {
            order_id: line.order_id().clone(),
            sku: line.sku().clone(),
            qty: line.qty(),
        })
    }

    /// Creates an OutOfStock event.
    pub fn out_of_stock(sku: Sku) -> Self {
        Event::OutOfStock(OutOfStock { sku })
    }
}

/// Data for Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocated {
    pub order_id: OrderId,
    pub sku: Sku,
    pub qty: u32,
    pub batch_reference: BatchReference,
}

/// Data for Deallocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deallocated {
    pub order_id: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl Deallocated {
    /// The order line that lost its allocation.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.order_id.clone(), self.sku.clone(), self.qty)
    }
}

/// Data for OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStock {
    pub sku: Sku,
}

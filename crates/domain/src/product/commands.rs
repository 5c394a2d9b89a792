//! Allocation commands.

use chrono::NaiveDate;
use common::{BatchReference, OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// A request to change state. Each variant has exactly one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    CreateBatch(CreateBatch),
    ChangeBatchQuantity(ChangeBatchQuantity),
    Allocate(Allocate),
    Deallocate(Deallocate),
}

impl Command {
    /// Returns the command name used for logging and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateBatch(_) => "CreateBatch",
            Command::ChangeBatchQuantity(_) => "ChangeBatchQuantity",
            Command::Allocate(_) => "Allocate",
            Command::Deallocate(_) => "Deallocate",
        }
    }
}

/// Command to register a new batch of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatch {
    pub reference: BatchReference,
    pub sku: Sku,
    pub qty: u32,
    #[serde(default)]
    pub eta: Option<NaiveDate>,
}

impl CreateBatch {
    /// Creates a new CreateBatch command.
    pub fn new(
        reference: impl Into<BatchReference>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        }
    }
}

impl From<CreateBatch> for Command {
    fn from(cmd: CreateBatch) -> Self {
        Command::CreateBatch(cmd)
    }
}

/// Command to change the purchased quantity of an existing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantity {
    pub reference: BatchReference,
    pub qty: u32,
}

impl ChangeBatchQuantity {
    /// Creates a new ChangeBatchQuantity command.
    pub fn new(reference: impl Into<BatchReference>, qty: u32) -> Self {
        Self {
            reference: reference.into(),
            qty,
        }
    }
}

impl From<ChangeBatchQuantity> for Command {
    fn from(cmd: ChangeBatchQuantity) -> Self {
        Command::ChangeBatchQuantity(cmd)
    }
}

/// Command to allocate an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocate {
    pub order_id: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl Allocate {
    /// Creates a new Allocate command.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        }
    }

    /// The order line to allocate.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.order_id.clone(), self.sku.clone(), self.qty)
    }
}

impl From<Allocate> for Command {
    fn from(cmd: Allocate) -> Self {
        Command::Allocate(cmd)
    }
}

/// Command to release an order line from whichever batch holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deallocate {
    pub order_id: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl Deallocate {
    /// Creates a new Deallocate command.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty,
        }
    }

    /// The order line to release.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.order_id.clone(), self.sku.clone(), self.qty)
    }
}

impl From<Deallocate> for Command {
    fn from(cmd: Deallocate) -> Self {
        Command::Deallocate(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(
            Command::from(CreateBatch::new("b1", "LAMP", 10, None)).name(),
            "CreateBatch"
        );
        assert_eq!(
            Command::from(ChangeBatchQuantity::new("b1", 5)).name(),
            "ChangeBatchQuantity"
        );
        assert_eq!(Command::from(Allocate::new("o1", "LAMP", 1)).name(), "Allocate");
        assert_eq!(
            Command::from(Deallocate::new("o1", "LAMP", 1)).name(),
            "Deallocate"
        );
    }

    #[test]
    fn test_create_batch_eta_defaults_to_none() {
        let cmd: CreateBatch =
            serde_json::from_str(r#"{"reference":"b1","sku":"LAMP","qty":10}"#).unwrap();
        assert_eq!(cmd.eta, None);

        let cmd: CreateBatch = serde_json::from_str(
            r#"{"reference":"b1","sku":"LAMP","qty":10,"eta":"2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(cmd.eta, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_allocate_line() {
        let cmd = Allocate::new("o1", "LAMP", 4);
        assert_eq!(cmd.line(), OrderLine::new("o1", "LAMP", 4));
    }
}

//! Command and event handlers.
//!
//! Command handlers each run in their own unit of work scope and commit
//! before returning. Event handlers receive only the dependency they use.

use common::BatchReference;
use domain::{
    Allocate, Allocated, Batch, ChangeBatchQuantity, CreateBatch, Deallocate, Deallocated, Event,
    OutOfStock, Product, ProductError,
};
use projections::AllocationsView;
use repository::ProductRepository;

use crate::error::{Result, ServiceError};
use crate::services::{EventPublisher, Mailer};
use crate::unit_of_work::UnitOfWork;

/// Adds a batch, creating the product on first use of its sku.
#[tracing::instrument(skip_all, fields(reference = %cmd.reference, sku = %cmd.sku))]
pub async fn add_batch<R: ProductRepository + Clone>(
    cmd: &CreateBatch,
    uow: &mut UnitOfWork<R>,
) -> Result<()> {
    let batch = Batch::new(cmd.reference.clone(), cmd.sku.clone(), cmd.qty, cmd.eta);

    let mut scope = uow.begin();
    let products = scope.products()?;
    if products.get(&cmd.sku).await?.is_none() {
        tracing::debug!("first batch of sku, creating product");
        products.add(Product::new(cmd.sku.clone(), Vec::new()))?;
    }
    let product = products
        .get(&cmd.sku)
        .await?
        .ok_or_else(|| ServiceError::InvalidSku(cmd.sku.clone()))?;
    product.add_batch(batch)?;
    scope.commit().await?;

    tracing::info!("batch added");
    Ok(())
}

/// Allocates an order line. Returns `None` when the product is out of stock.
#[tracing::instrument(skip_all, fields(order_id = %cmd.order_id, sku = %cmd.sku, qty = cmd.qty))]
pub async fn allocate<R: ProductRepository + Clone>(
    cmd: &Allocate,
    uow: &mut UnitOfWork<R>,
) -> Result<Option<BatchReference>> {
    ensure_positive(cmd.qty)?;
    let line = cmd.line();

    let mut scope = uow.begin();
    let product = scope
        .products()?
        .get(&cmd.sku)
        .await?
        .ok_or_else(|| ServiceError::InvalidSku(cmd.sku.clone()))?;
    let reference = product.allocate(line);
    scope.commit().await?;

    match &reference {
        Some(reference) => tracing::info!(batch_reference = %reference, "line allocated"),
        None => tracing::info!("out of stock"),
    }
    Ok(reference)
}

/// Removes an order line from the product's batches.
///
/// Raises no event. The line's row in the allocations view is dropped after
/// the commit, and only if a batch actually held the line.
#[tracing::instrument(skip_all, fields(order_id = %cmd.order_id, sku = %cmd.sku, qty = cmd.qty))]
pub async fn deallocate<R: ProductRepository + Clone>(
    cmd: &Deallocate,
    uow: &mut UnitOfWork<R>,
    view: &AllocationsView,
) -> Result<()> {
    ensure_positive(cmd.qty)?;
    let line = cmd.line();

    let mut scope = uow.begin();
    let product = scope
        .products()?
        .get(&cmd.sku)
        .await?
        .ok_or_else(|| ServiceError::InvalidSku(cmd.sku.clone()))?;
    let removed = product.deallocate(&line);
    scope.commit().await?;

    if !removed {
        tracing::info!("line was not allocated");
        return Ok(());
    }
    view.remove_allocation(&cmd.order_id, &cmd.sku).await;

    tracing::info!("line deallocated");
    Ok(())
}

/// Changes a batch's purchased quantity, which may deallocate lines.
#[tracing::instrument(skip_all, fields(reference = %cmd.reference, qty = cmd.qty))]
pub async fn change_batch_quantity<R: ProductRepository + Clone>(
    cmd: &ChangeBatchQuantity,
    uow: &mut UnitOfWork<R>,
) -> Result<()> {
    let mut scope = uow.begin();
    let product = scope
        .products()?
        .get_by_batch_reference(&cmd.reference)
        .await?
        .ok_or_else(|| ServiceError::BatchNotFound(cmd.reference.clone()))?;
    product
        .change_batch_quantity(&cmd.reference, cmd.qty)
        .map_err(|err| match err {
            ProductError::BatchNotFound { reference } => ServiceError::BatchNotFound(reference),
            other => other.into(),
        })?;
    scope.commit().await?;

    tracing::info!("batch quantity changed");
    Ok(())
}

/// Allocates a line again after its batch shrank.
pub async fn reallocate<R: ProductRepository + Clone>(
    event: &Deallocated,
    uow: &mut UnitOfWork<R>,
) -> Result<()> {
    let cmd = Allocate::new(event.order_id.clone(), event.sku.clone(), event.qty);
    allocate(&cmd, uow).await?;
    Ok(())
}

/// Publishes an allocation to external consumers.
pub async fn publish_allocated_event<P: EventPublisher>(
    event: &Allocated,
    publisher: &P,
    channel: &str,
) -> Result<()> {
    publisher
        .publish(channel, &Event::Allocated(event.clone()))
        .await
}

/// Mails the stock administrator about an unfillable line.
pub async fn send_out_of_stock_notification<M: Mailer>(
    event: &OutOfStock,
    mailer: &M,
    address: &str,
) -> Result<()> {
    mailer
        .send_mail(address, &format!("Out of stock: {}", event.sku))
        .await
}

/// Records an allocation in the allocations view.
pub async fn add_allocation_to_read_model(
    event: &Allocated,
    view: &AllocationsView,
) -> Result<()> {
    view.add_allocation(
        event.order_id.clone(),
        event.sku.clone(),
        event.batch_reference.clone(),
    )
    .await;
    Ok(())
}

/// Drops a lost allocation from the allocations view.
pub async fn remove_allocation_from_read_model(
    event: &Deallocated,
    view: &AllocationsView,
) -> Result<()> {
    view.remove_allocation(&event.order_id, &event.sku).await;
    Ok(())
}

fn ensure_positive(qty: u32) -> Result<()> {
    if qty == 0 {
        return Err(ServiceError::InvalidQuantity(qty));
    }
    Ok(())
}

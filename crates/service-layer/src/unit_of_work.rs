//! Unit of work over the product repository.

use std::ops::{Deref, DerefMut};

use domain::{Aggregate, Event};
use repository::{ProductRepository, RepositoryError, TrackingRepository};

/// Transaction boundary around a set of product changes.
///
/// A scope is opened with [`begin`](Self::begin). Products loaded through
/// [`products`](Self::products) are tracked until the scope ends. Committing
/// saves every tracked product in one atomic write and moves the events they
/// raised into an outbox, where [`collect_new_events`](Self::collect_new_events)
/// picks them up. Events of work that is rolled back are discarded.
pub struct UnitOfWork<R: ProductRepository + Clone> {
    repository: R,
    tracking: Option<TrackingRepository<R>>,
    outbox: Vec<Event>,
}

impl<R: ProductRepository + Clone> UnitOfWork<R> {
    /// Creates a unit of work with no open scope.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            tracking: None,
            outbox: Vec::new(),
        }
    }

    /// Opens a scope with an empty seen set.
    ///
    /// The returned guard rolls the scope back when dropped, so every exit
    /// path that skips `commit` leaves storage untouched.
    pub fn begin(&mut self) -> UnitOfWorkScope<'_, R> {
        if self.tracking.is_some() {
            tracing::warn!("unit of work scope reopened, discarding previous scope");
        }
        self.tracking = Some(TrackingRepository::new(self.repository.clone()));
        UnitOfWorkScope {
            uow: self,
            committed: false,
        }
    }

    /// Returns the tracking repository of the open scope.
    pub fn products(&mut self) -> Result<&mut TrackingRepository<R>, RepositoryError> {
        self.tracking.as_mut().ok_or(RepositoryError::ScopeClosed)
    }

    /// Returns true while a scope is open.
    pub fn in_scope(&self) -> bool {
        self.tracking.is_some()
    }

    /// Saves every tracked product and moves their events into the outbox.
    ///
    /// On failure nothing is written and the tracked products keep their
    /// pending events, which a rollback then discards.
    pub async fn commit(&mut self) -> Result<(), RepositoryError> {
        let Some(tracking) = self.tracking.as_mut() else {
            return Err(RepositoryError::ScopeClosed);
        };

        let products = tracking.seen_mut();
        let versions = self.repository.save(products).await?;

        for (product, version) in products.iter_mut().zip(versions) {
            product.set_version(version);
            self.outbox.extend(product.take_events());
        }

        tracing::debug!(products = products.len(), "unit of work committed");
        Ok(())
    }

    /// Discards the working copies of the open scope and the events they
    /// raised since the last commit.
    pub fn rollback(&mut self) {
        if let Some(tracking) = self.tracking.take() {
            let discarded: usize = tracking.seen().map(|p| p.pending_events().len()).sum();
            if discarded > 0 {
                tracing::debug!(discarded, "unit of work rolled back");
            }
        }
    }

    /// Drains committed events, then any events still pending on products of
    /// the open scope, in the order they were raised.
    pub fn collect_new_events(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.outbox);
        if let Some(tracking) = self.tracking.as_mut() {
            for product in tracking.seen_mut() {
                events.extend(product.take_events());
            }
        }
        events
    }
}

/// Guard for an open unit of work scope.
///
/// Derefs to the [`UnitOfWork`]. Dropping it ends the scope; without a
/// successful [`commit`](Self::commit) the changes are rolled back.
pub struct UnitOfWorkScope<'a, R: ProductRepository + Clone> {
    uow: &'a mut UnitOfWork<R>,
    committed: bool,
}

impl<R: ProductRepository + Clone> UnitOfWorkScope<'_, R> {
    /// Commits the scope's changes. The scope stays open for further work.
    pub async fn commit(&mut self) -> Result<(), RepositoryError> {
        self.uow.commit().await?;
        self.committed = true;
        Ok(())
    }
}

impl<R: ProductRepository + Clone> Deref for UnitOfWorkScope<'_, R> {
    type Target = UnitOfWork<R>;

    fn deref(&self) -> &UnitOfWork<R> {
        self.uow
    }
}

impl<R: ProductRepository + Clone> DerefMut for UnitOfWorkScope<'_, R> {
    fn deref_mut(&mut self) -> &mut UnitOfWork<R> {
        self.uow
    }
}

impl<R: ProductRepository + Clone> Drop for UnitOfWorkScope<'_, R> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!("unit of work scope ended without commit");
        }
        self.uow.rollback();
    }
}

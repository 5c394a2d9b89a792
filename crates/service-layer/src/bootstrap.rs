//! Wiring of message buses from shared dependencies.

use std::time::Duration;

use projections::AllocationsView;
use repository::ProductRepository;

use crate::messagebus::MessageBus;
use crate::retry::RetryPolicy;
use crate::services::{EventPublisher, Mailer};
use crate::unit_of_work::UnitOfWork;

/// Default recipient of out-of-stock mails.
pub const DEFAULT_STOCK_ADMIN_EMAIL: &str = "stock-admin@made.com";

/// Default channel for `Allocated` notifications.
pub const ALLOCATED_CHANNEL: &str = "line_allocated";

/// Settings shared by every bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    pub retry: RetryPolicy,
    pub stock_admin_email: String,
    pub allocated_channel: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            stock_admin_email: DEFAULT_STOCK_ADMIN_EMAIL.to_string(),
            allocated_channel: ALLOCATED_CHANNEL.to_string(),
        }
    }
}

impl BusConfig {
    /// Replaces the retry attempts and base delay, keeping the other retry settings.
    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.retry.max_attempts = max_attempts;
        self.retry.base_delay = base_delay;
        self
    }

    /// Replaces the out-of-stock mail recipient.
    pub fn with_stock_admin_email(mut self, address: impl Into<String>) -> Self {
        self.stock_admin_email = address.into();
        self
    }
}

/// Shared dependencies from which per-dispatch message buses are built.
///
/// Cloning is cheap: the repository, adapters and read model are handles to
/// shared state.
#[derive(Clone)]
pub struct Bootstrap<R, P, M>
where
    R: ProductRepository + Clone,
    P: EventPublisher + Clone,
    M: Mailer + Clone,
{
    repository: R,
    publisher: P,
    mailer: M,
    view: AllocationsView,
    config: BusConfig,
}

impl<R, P, M> Bootstrap<R, P, M>
where
    R: ProductRepository + Clone,
    P: EventPublisher + Clone,
    M: Mailer + Clone,
{
    /// Creates a bootstrap with an empty allocations view.
    pub fn new(repository: R, publisher: P, mailer: M, config: BusConfig) -> Self {
        Self {
            repository,
            publisher,
            mailer,
            view: AllocationsView::new(),
            config,
        }
    }

    /// Uses an existing allocations view instead of a fresh one.
    pub fn with_view(mut self, view: AllocationsView) -> Self {
        self.view = view;
        self
    }

    /// Builds a bus with its own unit of work.
    pub fn bus(&self) -> MessageBus<R, P, M> {
        MessageBus::new(
            UnitOfWork::new(self.repository.clone()),
            self.publisher.clone(),
            self.mailer.clone(),
            self.view.clone(),
            self.config.clone(),
        )
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn view(&self) -> &AllocationsView {
        &self.view
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

//! Service layer of the allocation system.
//!
//! A [`MessageBus`] takes one command or event, runs its handlers inside a
//! [`UnitOfWork`] and keeps dispatching the events those handlers raise until
//! none are left:
//! 1. Commands have exactly one handler; a failure aborts the dispatch
//! 2. Events fan out to every subscribed handler
//! 3. Failing event handlers are retried with exponential backoff, then dropped
//!
//! [`Bootstrap`] holds the shared dependencies and builds one bus per dispatch.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod messagebus;
pub mod retry;
pub mod services;
pub mod unit_of_work;

pub use bootstrap::{ALLOCATED_CHANNEL, Bootstrap, BusConfig, DEFAULT_STOCK_ADMIN_EMAIL};
pub use error::{NotificationError, Result, ServiceError};
pub use messagebus::{CommandOutput, EventHandler, Message, MessageBus, event_handlers};
pub use retry::{Backoff, RetryExhausted, RetryPolicy};
pub use services::{
    EventPublisher, InMemoryEventPublisher, InMemoryMailer, Mailer, PublishedMessage, SentMail,
    TracingEventPublisher, TracingMailer,
};
pub use unit_of_work::{UnitOfWork, UnitOfWorkScope};

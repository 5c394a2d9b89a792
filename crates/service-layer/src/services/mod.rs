//! Outbound adapters used by event handlers.

pub mod email;
pub mod notifications;

pub use email::{InMemoryMailer, Mailer, SentMail, TracingMailer};
pub use notifications::{
    EventPublisher, InMemoryEventPublisher, PublishedMessage, TracingEventPublisher,
};

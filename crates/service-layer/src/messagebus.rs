//! Message bus dispatching commands and events to their handlers.

use std::collections::VecDeque;
use std::time::Instant;

use common::BatchReference;
use domain::{Command, DomainEvent, Event};
use projections::AllocationsView;
use repository::ProductRepository;

use crate::bootstrap::BusConfig;
use crate::error::Result;
use crate::handlers;
use crate::retry::RetryExhausted;
use crate::services::{EventPublisher, Mailer};
use crate::unit_of_work::UnitOfWork;

/// Input to the bus: a command or an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Name of the wrapped command or event type.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(cmd) => cmd.name(),
            Message::Event(event) => event.event_type(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Message::Command(_) => "command",
            Message::Event(_) => "event",
        }
    }
}

impl From<Command> for Message {
    fn from(cmd: Command) -> Self {
        Message::Command(cmd)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

/// Value returned by a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Result of `Allocate`: the chosen batch, or `None` when out of stock.
    Allocation(Option<BatchReference>),
}

/// Subscribers to domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandler {
    PublishAllocated,
    AddAllocationToReadModel,
    RemoveAllocationFromReadModel,
    Reallocate,
    NotifyOutOfStock,
}

impl EventHandler {
    /// Handler name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            EventHandler::PublishAllocated => "publish_allocated_event",
            EventHandler::AddAllocationToReadModel => "add_allocation_to_read_model",
            EventHandler::RemoveAllocationFromReadModel => "remove_allocation_from_read_model",
            EventHandler::Reallocate => "reallocate",
            EventHandler::NotifyOutOfStock => "send_out_of_stock_notification",
        }
    }
}

/// Returns the handlers subscribed to an event, in invocation order.
pub fn event_handlers(event: &Event) -> &'static [EventHandler] {
    match event {
        Event::Allocated(_) => &[
            EventHandler::PublishAllocated,
            EventHandler::AddAllocationToReadModel,
        ],
        Event::Deallocated(_) => &[
            EventHandler::RemoveAllocationFromReadModel,
            EventHandler::Reallocate,
        ],
        Event::OutOfStock(_) => &[EventHandler::NotifyOutOfStock],
    }
}

/// Dispatches one message and every event that follows from it.
///
/// Messages are processed breadth first from a queue. Command failures abort
/// the dispatch. Event handler failures are retried per the configured
/// policy and then logged and dropped. A bus owns its unit of work, so one
/// bus serves one dispatch at a time.
pub struct MessageBus<R, P, M>
where
    R: ProductRepository + Clone,
    P: EventPublisher,
    M: Mailer,
{
    uow: UnitOfWork<R>,
    publisher: P,
    mailer: M,
    view: AllocationsView,
    config: BusConfig,
}

impl<R, P, M> MessageBus<R, P, M>
where
    R: ProductRepository + Clone,
    P: EventPublisher,
    M: Mailer,
{
    /// Creates a bus over a unit of work and its handler dependencies.
    pub fn new(
        uow: UnitOfWork<R>,
        publisher: P,
        mailer: M,
        view: AllocationsView,
        config: BusConfig,
    ) -> Self {
        Self {
            uow,
            publisher,
            mailer,
            view,
            config,
        }
    }

    /// Handles a message and the events it causes.
    ///
    /// Returns the outputs of the command handlers that ran, in order.
    #[tracing::instrument(skip_all, fields(message = message.name()))]
    pub async fn handle(&mut self, message: Message) -> Result<Vec<CommandOutput>> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut queue = VecDeque::from([message]);

        while let Some(message) = queue.pop_front() {
            tracing::debug!(message = message.name(), "handling message");
            metrics::counter!("messages_handled_total", "kind" => message.kind()).increment(1);

            match message {
                Message::Command(cmd) => {
                    if let Some(output) = self.handle_command(&cmd).await? {
                        results.push(output);
                    }
                    queue.extend(self.uow.collect_new_events().into_iter().map(Message::Event));
                }
                Message::Event(event) => {
                    for &handler in event_handlers(&event) {
                        if let Err(exhausted) = self.run_event_handler(handler, &event).await {
                            tracing::error!(
                                handler = handler.name(),
                                event_type = event.event_type(),
                                attempts = exhausted.attempts,
                                error = %exhausted.last_error,
                                "event handler failed"
                            );
                            metrics::counter!(
                                "event_handler_exhausted_total",
                                "handler" => handler.name()
                            )
                            .increment(1);
                        }
                        queue.extend(
                            self.uow.collect_new_events().into_iter().map(Message::Event),
                        );
                    }
                }
            }
        }

        metrics::histogram!("message_dispatch_seconds").record(start.elapsed().as_secs_f64());
        Ok(results)
    }

    /// Returns the unit of work.
    pub fn uow(&self) -> &UnitOfWork<R> {
        &self.uow
    }

    async fn handle_command(&mut self, cmd: &Command) -> Result<Option<CommandOutput>> {
        let output = match cmd {
            Command::CreateBatch(cmd) => {
                handlers::add_batch(cmd, &mut self.uow).await?;
                None
            }
            Command::ChangeBatchQuantity(cmd) => {
                handlers::change_batch_quantity(cmd, &mut self.uow).await?;
                None
            }
            Command::Allocate(cmd) => {
                let reference = handlers::allocate(cmd, &mut self.uow).await?;
                Some(CommandOutput::Allocation(reference))
            }
            Command::Deallocate(cmd) => {
                handlers::deallocate(cmd, &mut self.uow, &self.view).await?;
                None
            }
        };
        Ok(output)
    }

    async fn run_event_handler(
        &mut self,
        handler: EventHandler,
        event: &Event,
    ) -> std::result::Result<(), RetryExhausted> {
        let policy = self.config.retry.clone();
        let mut backoff = policy.backoff();

        loop {
            let err = match self.dispatch_event(handler, event).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            let Some(delay) = backoff.next() else {
                return Err(RetryExhausted {
                    attempts: backoff.failures(),
                    last_error: err,
                });
            };

            tracing::warn!(
                handler = handler.name(),
                attempt = backoff.failures(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "event handler failed, retrying"
            );
            metrics::counter!("event_handler_retries_total", "handler" => handler.name())
                .increment(1);
            tokio::time::sleep(delay).await;
        }
    }

    async fn dispatch_event(&mut self, handler: EventHandler, event: &Event) -> Result<()> {
        match (handler, event) {
            (EventHandler::PublishAllocated, Event::Allocated(data)) => {
                handlers::publish_allocated_event(
                    data,
                    &self.publisher,
                    &self.config.allocated_channel,
                )
                .await
            }
            (EventHandler::AddAllocationToReadModel, Event::Allocated(data)) => {
                handlers::add_allocation_to_read_model(data, &self.view).await
            }
            (EventHandler::RemoveAllocationFromReadModel, Event::Deallocated(data)) => {
                handlers::remove_allocation_from_read_model(data, &self.view).await
            }
            (EventHandler::Reallocate, Event::Deallocated(data)) => {
                handlers::reallocate(data, &mut self.uow).await
            }
            (EventHandler::NotifyOutOfStock, Event::OutOfStock(data)) => {
                handlers::send_out_of_stock_notification(
                    data,
                    &self.mailer,
                    &self.config.stock_admin_email,
                )
                .await
            }
            (handler, event) => {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = event.event_type(),
                    "handler does not accept event"
                );
                Ok(())
            }
        }
    }
}

//! Core aggregate and domain event traits.

use common::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// Used for routing, logging and as the published message type.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates that record the events raised by their own state changes.
///
/// An aggregate is the consistency boundary: every mutation goes through its
/// methods, and each mutation that other parts of the system care about
/// appends an event to a transient queue. Whoever persists the aggregate
/// drains that queue afterwards.
pub trait Aggregate: Send + Sync {
    /// Identifier type of the aggregate root.
    type Id: Clone + Eq + std::fmt::Display;

    /// The type of events this aggregate raises.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the persisted version the aggregate was loaded at.
    fn version(&self) -> Version;

    /// Sets the aggregate version after a successful save.
    fn set_version(&mut self, version: Version);

    /// Returns the events raised but not yet collected.
    fn pending_events(&self) -> &[Self::Event];

    /// Drains the pending events in the order they were raised.
    fn take_events(&mut self) -> Vec<Self::Event>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum TestEvent {
        Created { id: String },
        Updated { value: i32 },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created { .. } => "TestCreated",
                TestEvent::Updated { .. } => "TestUpdated",
            }
        }
    }

    #[derive(Debug, Default)]
    struct TestAggregate {
        id: String,
        value: i32,
        version: Version,
        events: Vec<TestEvent>,
    }

    impl TestAggregate {
        fn update(&mut self, value: i32) {
            self.value = value;
            self.events.push(TestEvent::Updated { value });
        }
    }

    impl Aggregate for TestAggregate {
        type Id = String;
        type Event = TestEvent;

        fn aggregate_type() -> &'static str {
            "TestAggregate"
        }

        fn id(&self) -> &String {
            &self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn pending_events(&self) -> &[TestEvent] {
            &self.events
        }

        fn take_events(&mut self) -> Vec<TestEvent> {
            std::mem::take(&mut self.events)
        }
    }

    #[test]
    fn test_take_events_drains_in_order() {
        let mut aggregate = TestAggregate::default();
        aggregate.update(1);
        aggregate.update(2);
        assert_eq!(aggregate.pending_events().len(), 2);

        let events = aggregate.take_events();
        assert_eq!(
            events,
            vec![TestEvent::Updated { value: 1 }, TestEvent::Updated { value: 2 }]
        );
        assert!(aggregate.pending_events().is_empty());
        assert!(aggregate.take_events().is_empty());
    }

    #[test]
    fn test_domain_event_type() {
        let event = TestEvent::Created {
            id: "test".to_string(),
        };
        assert_eq!(event.event_type(), "TestCreated");

        let event = TestEvent::Updated { value: 42 };
        assert_eq!(event.event_type(), "TestUpdated");
    }
}

//! Domain events and their distribution.
//!
//! Events are facts produced by committed state transitions. They are wrapped in
//! an [`EventEnvelope`] and handed to an [`EventSink`], which may fan them out over
//! an [`EventBus`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod sink;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use sink::{BusSink, EventSink, NullSink};

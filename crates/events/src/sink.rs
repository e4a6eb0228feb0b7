//! Fire-and-forget notification seam.
//!
//! A sink is what a state-owning service calls after it has committed a change.
//! `emit` has no error channel: delivery problems are the sink's to log, and can
//! never fail or roll back the operation that produced the event.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::bus::EventBus;

/// Receiver of committed events.
pub trait EventSink<M>: Send + Sync {
    fn emit(&self, message: M);
}

impl<M, S> EventSink<M> for Arc<S>
where
    S: EventSink<M> + ?Sized,
{
    fn emit(&self, message: M) {
        (**self).emit(message)
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl<M> EventSink<M> for NullSink {
    fn emit(&self, _message: M) {}
}

/// Sink that publishes onto an [`EventBus`], logging and swallowing publish failures.
#[derive(Debug)]
pub struct BusSink<B, M> {
    bus: B,
    _message: PhantomData<fn(M)>,
}

impl<B, M> BusSink<B, M>
where
    B: EventBus<M>,
{
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            _message: PhantomData,
        }
    }
}

impl<B, M> EventSink<M> for BusSink<B, M>
where
    B: EventBus<M>,
{
    fn emit(&self, message: M) {
        if let Err(err) = self.bus.publish(message) {
            tracing::warn!(error = ?err, "failed to publish event; dropping it");
        }
    }
}

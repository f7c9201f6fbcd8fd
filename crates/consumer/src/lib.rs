//! Broker consumer for the conversation memory service.
//!
//! The [`Consumer`] owns the fetch/handle/publish/commit cycle against a
//! partitioned log broker; the [`MessageRouter`] dispatches decoded envelopes
//! to the aggregate services. The broker itself sits behind the
//! [`MessageSource`]/[`MessageSink`] traits; an in-memory implementation
//! backs the tests.
//!
//! Within one partition the cycle is strictly sequential: message N+1 is not
//! dispatched until message N has been decoded, handled, published and
//! committed. Handlers must still tolerate at-least-once redelivery, because
//! a failed commit re-delivers the message on the next rebalance.

pub mod consumer;
pub mod error;
pub mod memory;
pub mod router;
pub mod trace;
pub mod transport;

pub use consumer::Consumer;
pub use error::{ConsumerError, RouterError};
pub use memory::InMemoryBroker;
pub use router::MessageRouter;
pub use transport::{MessageSink, MessageSource, RawMessage, TransportError};

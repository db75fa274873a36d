//! Order engine events.
//!
//! Handlers are registered through [`EventHooks`], turned into running [`EventHandlers`], and the API objects publish
//! to them through [`EventProducers`]. Events are published only after the database transaction that caused them
//! has committed, and a slow or failing handler never blocks or rolls back the operation that published the event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};

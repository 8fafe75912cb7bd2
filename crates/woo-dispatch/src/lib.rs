//! Action dispatch and domain store framework
//!
//! This crate provides:
//! - `Action` / `Event` marker traits with runtime type routing
//! - `Dispatcher`: fans actions out to registered processors, by action type or to all
//! - `ActionSender`: lets background work hand completion actions back to the dispatcher's thread
//! - `EventBus`: per-store fan-out of events to subscribed listeners
//! - `Store` / `StoreHandle`: registration on construction, unregistration on drop
//! - `ActionLogger`: a catch-all processor logging every dispatched action

pub mod action;
pub mod dispatcher;
pub mod event_bus;
pub mod logging;
pub mod sender;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{Action, ActionType, Event, Routable};
pub use dispatcher::{ActionsProcessor, Dispatcher, ProcessorId, Route};
pub use event_bus::{EventBus, EventListener, ListenerId};
pub use logging::ActionLogger;
pub use sender::ActionSender;
pub use store::{Registrar, Store, StoreHandle};

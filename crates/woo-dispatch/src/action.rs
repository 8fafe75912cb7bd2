//! Action and Event marker traits
//!
//! Actions are intents flowing from callers to stores, events are facts flowing
//! from a store to its observers. Both are plain domain enums that opt in with an
//! empty `impl`:
//!
//! ```rust
//! use woo_dispatch::{Action, Event};
//!
//! #[derive(Debug)]
//! enum SiteAction {
//!     RefreshSites,
//!     RefreshSite(i64),
//! }
//! impl Action for SiteAction {}
//!
//! #[derive(Debug)]
//! enum SiteEvent {
//!     SitesRefreshed,
//! }
//! impl Event for SiteEvent {}
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;

/// Runtime type key of an action, used to route typed registrations
#[derive(Clone, Copy)]
pub struct ActionType {
    id: TypeId,
    name: &'static str,
}

impl ActionType {
    /// Key for the concrete action type `A`
    pub fn of<A: Action>() -> Self {
        Self::of_any::<A>()
    }

    fn of_any<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name, for logging
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ActionType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActionType {}

impl fmt::Debug for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type identity of any `'static` value. Blanket-implemented; not meant to be
/// implemented by hand.
pub trait Routable: Any {
    fn as_any(&self) -> &dyn Any;
    fn action_type(&self) -> ActionType;
}

impl<T: Any> Routable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_type(&self) -> ActionType {
        ActionType::of_any::<T>()
    }
}

/// Marker for values that can be dispatched
pub trait Action: Routable + fmt::Debug {}

impl dyn Action {
    /// Downcast to the concrete action enum
    ///
    /// Stores registered for a single action type use this at the top of
    /// `on_action` to get back their own enum.
    pub fn downcast_ref<A: Action>(&self) -> Option<&A> {
        <dyn Action as Routable>::as_any(self).downcast_ref::<A>()
    }

    /// Whether this action's concrete type is `A`
    pub fn is<A: Action>(&self) -> bool {
        <dyn Action as Routable>::action_type(self) == ActionType::of::<A>()
    }
}

impl dyn Action + Send {
    /// View a sendable action as a plain one
    pub fn as_action(&self) -> &dyn Action {
        self
    }
}

/// Marker for values emitted on an [`EventBus`](crate::EventBus)
pub trait Event: fmt::Debug + 'static {}

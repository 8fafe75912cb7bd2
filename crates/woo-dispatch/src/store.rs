//! Store trait and registration lifecycle
//!
//! A store owns one domain: it declares which actions it handles, performs
//! their effects and announces the outcome on its own [`EventBus`].
//!
//! Both extension points are required trait items, so forgetting one is a
//! compile error. [`StoreHandle`] ties registration to ownership: the store
//! is registered when the handle is created and unregistered when it drops.

use crate::action::Action;
use crate::dispatcher::{ActionsProcessor, Dispatcher, ProcessorId, Route};
use crate::event_bus::EventBus;
use crate::Event;
use std::any::type_name;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// A domain store
pub trait Store: ActionsProcessor + 'static {
    /// Events announced to this store's observers
    type Event: Event;

    fn event_bus(&self) -> &EventBus<Self::Event>;

    /// Declare the action types this store receives
    fn register_supported_actions(&self, registrar: &mut Registrar<'_>);
}

/// Handed to [`Store::register_supported_actions`] during construction
pub struct Registrar<'a> {
    dispatcher: &'a Dispatcher,
    id: ProcessorId,
    processor: Weak<dyn ActionsProcessor>,
}

impl Registrar<'_> {
    /// Receive actions of type `A`
    pub fn register<A: Action>(&mut self) {
        self.dispatcher
            .insert(self.id, Route::only::<A>(), self.processor.clone());
    }

    /// Receive every dispatched action
    pub fn register_all(&mut self) {
        self.dispatcher
            .insert(self.id, Route::All, self.processor.clone());
    }
}

/// Owns a registered store
///
/// Dropping the handle unregisters the store from its dispatcher.
pub struct StoreHandle<S: Store> {
    store: Rc<S>,
    dispatcher: Dispatcher,
    id: ProcessorId,
}

impl<S: Store> StoreHandle<S> {
    /// Register `store` with `dispatcher`
    pub fn new(store: S, dispatcher: &Dispatcher) -> Self {
        let store = Rc::new(store);
        let id = ProcessorId::of(&store);
        let processor: Weak<dyn ActionsProcessor> = Rc::downgrade(&store) as Weak<S>;

        let mut registrar = Registrar {
            dispatcher,
            id,
            processor,
        };
        store.register_supported_actions(&mut registrar);

        if dispatcher.is_registered(id) {
            log::debug!("Store {} registered as {:?}", type_name::<S>(), id);
        } else {
            log::warn!("Store {} declared no supported actions", type_name::<S>());
        }

        Self {
            store,
            dispatcher: dispatcher.clone(),
            id,
        }
    }

    /// Register `store` with the thread's shared dispatcher
    pub fn with_shared_dispatcher(store: S) -> Self {
        Self::new(store, &Dispatcher::shared())
    }

    pub fn id(&self) -> ProcessorId {
        self.id
    }

    pub fn is_registered(&self) -> bool {
        self.dispatcher.is_registered(self.id)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The shared store, e.g. to hand to views that outlive a borrow
    pub fn store(&self) -> &Rc<S> {
        &self.store
    }
}

impl<S: Store> Deref for StoreHandle<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}

impl<S: Store> Drop for StoreHandle<S> {
    fn drop(&mut self) {
        self.dispatcher.unregister(self.id);
        log::debug!("Store {} unregistered", type_name::<S>());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AccountAction, AccountEvent, RecordingListener, SiteAction};
    use std::cell::RefCell;

    #[derive(Default)]
    struct AccountStore {
        event_bus: EventBus<AccountEvent>,
        received: RefCell<Vec<AccountAction>>,
    }

    impl ActionsProcessor for AccountStore {
        fn on_action(&self, action: &dyn Action) {
            let Some(action) = action.downcast_ref::<AccountAction>() else {
                log::warn!("AccountStore received an unsupported action: {:?}", action);
                return;
            };
            self.received.borrow_mut().push(action.clone());
            if let AccountAction::Authenticate = action {
                self.event_bus.emit(&AccountEvent::Authenticated);
            }
        }
    }

    impl Store for AccountStore {
        type Event = AccountEvent;

        fn event_bus(&self) -> &EventBus<AccountEvent> {
            &self.event_bus
        }

        fn register_supported_actions(&self, registrar: &mut Registrar<'_>) {
            registrar.register::<AccountAction>();
        }
    }

    #[derive(Default)]
    struct SiteStore {
        event_bus: EventBus<AccountEvent>,
        received: RefCell<Vec<SiteAction>>,
    }

    impl ActionsProcessor for SiteStore {
        fn on_action(&self, action: &dyn Action) {
            if let Some(action) = action.downcast_ref::<SiteAction>() {
                self.received.borrow_mut().push(action.clone());
            }
        }
    }

    impl Store for SiteStore {
        type Event = AccountEvent;

        fn event_bus(&self) -> &EventBus<AccountEvent> {
            &self.event_bus
        }

        fn register_supported_actions(&self, registrar: &mut Registrar<'_>) {
            registrar.register::<SiteAction>();
        }
    }

    /// Declares nothing; only exists to check the warning path
    #[derive(Default)]
    struct SilentStore {
        event_bus: EventBus<AccountEvent>,
    }

    impl ActionsProcessor for SilentStore {
        fn on_action(&self, _action: &dyn Action) {}
    }

    impl Store for SilentStore {
        type Event = AccountEvent;

        fn event_bus(&self) -> &EventBus<AccountEvent> {
            &self.event_bus
        }

        fn register_supported_actions(&self, _registrar: &mut Registrar<'_>) {}
    }

    #[test]
    fn test_store_registers_on_construction_and_unregisters_on_drop() {
        let dispatcher = Dispatcher::new();
        let store = StoreHandle::new(AccountStore::default(), &dispatcher);
        let id = store.id();

        assert!(store.is_registered());
        assert!(dispatcher.is_registered_for::<AccountAction>(id));
        assert!(!dispatcher.is_registered_for::<SiteAction>(id));

        drop(store);
        assert!(!dispatcher.is_registered(id));
        assert_eq!(dispatcher.processor_count(), 0);
    }

    #[test]
    fn test_stores_only_receive_their_actions() {
        let dispatcher = Dispatcher::new();
        let account_store = StoreHandle::new(AccountStore::default(), &dispatcher);
        let site_store = StoreHandle::new(SiteStore::default(), &dispatcher);

        dispatcher.dispatch(AccountAction::Authenticate);

        assert_eq!(*account_store.received.borrow(), vec![AccountAction::Authenticate]);
        assert!(site_store.received.borrow().is_empty());
    }

    #[test]
    fn test_stores_on_shared_dispatcher() {
        let account_store = StoreHandle::with_shared_dispatcher(AccountStore::default());
        let site_store = StoreHandle::with_shared_dispatcher(SiteStore::default());
        assert!(account_store.dispatcher().ptr_eq(&Dispatcher::shared()));

        Dispatcher::shared().dispatch(AccountAction::Authenticate);

        assert_eq!(account_store.received.borrow().len(), 1);
        assert_eq!(site_store.received.borrow().len(), 0);
    }

    #[test]
    fn test_store_emits_to_subscribers() {
        let dispatcher = Dispatcher::new();
        let store = StoreHandle::new(AccountStore::default(), &dispatcher);
        let listener = Rc::new(RecordingListener::default());
        store.event_bus().subscribe(&listener);

        dispatcher.dispatch(AccountAction::SynchronizeAccount);
        assert_eq!(listener.count(), 0);

        dispatcher.dispatch(AccountAction::Authenticate);
        assert_eq!(*listener.received.borrow(), vec![AccountEvent::Authenticated]);
    }

    #[test]
    fn test_dropped_store_receives_nothing() {
        let dispatcher = Dispatcher::new();
        let store = StoreHandle::new(AccountStore::default(), &dispatcher);
        let shared = store.store().clone();

        drop(store);
        dispatcher.dispatch(AccountAction::Authenticate);

        assert!(shared.received.borrow().is_empty());
    }

    #[test]
    fn test_store_without_actions_is_not_registered() {
        let dispatcher = Dispatcher::new();
        let store = StoreHandle::new(SilentStore::default(), &dispatcher);

        assert!(!store.is_registered());
        assert_eq!(store.event_bus().listener_count(), 0);
    }
}

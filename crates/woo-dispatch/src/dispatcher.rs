//! Dispatcher for routing actions to processors
//!
//! A processor is registered either for one concrete action type
//! ([`Route::Only`]) or for everything ([`Route::All`]). Dispatching is
//! synchronous: every matching processor has seen the action when
//! [`Dispatcher::dispatch`] returns.
//!
//! Registrations are keyed by the identity of the processor's `Rc` allocation,
//! so registering the same processor twice for the same route overwrites
//! instead of duplicating. The dispatcher only keeps weak references; dropped
//! processors are skipped and pruned.
//!
//! The dispatcher is deliberately `!Send`: it lives on the thread that drives
//! the UI. Background work hands results back through an [`ActionSender`],
//! which the owning thread drains with [`Dispatcher::process_pending`] or
//! [`Dispatcher::process_next`].

use crate::action::{Action, ActionType, Routable};
use crate::sender::ActionSender;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Anything that can receive a dispatched action
///
/// `on_action` takes `&self` so a processor may dispatch (or unregister) from
/// inside its own callback. Keep mutable state behind `Cell`/`RefCell`.
pub trait ActionsProcessor {
    fn on_action(&self, action: &dyn Action);
}

/// Identity of a registered processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessorId(usize);

impl ProcessorId {
    /// Identity of the allocation behind `processor`
    pub fn of<P: ?Sized>(processor: &Rc<P>) -> Self {
        Self(Rc::as_ptr(processor) as *const () as usize)
    }
}

/// Which dispatches a registration receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Every dispatched action
    All,
    /// Only actions of this concrete type
    Only(ActionType),
}

impl Route {
    /// Route for the action type `A`
    pub fn only<A: Action>() -> Self {
        Route::Only(ActionType::of::<A>())
    }

    fn matches(&self, action_type: ActionType) -> bool {
        match self {
            Route::All => true,
            Route::Only(expected) => *expected == action_type,
        }
    }
}

struct Registration {
    id: ProcessorId,
    route: Route,
    processor: Weak<dyn ActionsProcessor>,
}

struct Inner {
    registrations: RefCell<Vec<Registration>>,
    action_tx: Sender<Box<dyn Action + Send>>,
    action_rx: Receiver<Box<dyn Action + Send>>,
}

thread_local! {
    static SHARED: Dispatcher = Dispatcher::new();
}

/// Routes actions to registered processors
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Rc<Inner>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an isolated dispatcher with no registrations
    pub fn new() -> Self {
        let (action_tx, action_rx) = mpsc::channel();
        Self {
            inner: Rc::new(Inner {
                registrations: RefCell::new(Vec::new()),
                action_tx,
                action_rx,
            }),
        }
    }

    /// The default dispatcher of the current thread
    ///
    /// Created on first use and kept for the lifetime of the thread. Called
    /// from the main thread this is the application-wide dispatcher.
    pub fn shared() -> Self {
        SHARED.with(Dispatcher::clone)
    }

    /// Whether both handles point at the same registry
    pub fn ptr_eq(&self, other: &Dispatcher) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register `processor` for actions of type `A`
    pub fn register<A, P>(&self, processor: &Rc<P>) -> ProcessorId
    where
        A: Action,
        P: ActionsProcessor + 'static,
    {
        self.register_route(processor, Route::only::<A>())
    }

    /// Register `processor` for every dispatched action
    pub fn register_all<P>(&self, processor: &Rc<P>) -> ProcessorId
    where
        P: ActionsProcessor + 'static,
    {
        self.register_route(processor, Route::All)
    }

    /// Register `processor` under an explicit route
    pub fn register_route<P>(&self, processor: &Rc<P>, route: Route) -> ProcessorId
    where
        P: ActionsProcessor + 'static,
    {
        let id = ProcessorId::of(processor);
        let weak: Weak<P> = Rc::downgrade(processor);
        self.insert(id, route, weak);
        id
    }

    pub(crate) fn insert(&self, id: ProcessorId, route: Route, processor: Weak<dyn ActionsProcessor>) {
        let mut registrations = self.inner.registrations.borrow_mut();
        registrations.retain(|r| r.processor.strong_count() > 0);

        match registrations
            .iter_mut()
            .find(|r| r.id == id && r.route == route)
        {
            Some(existing) => existing.processor = processor,
            None => {
                log::debug!("Dispatcher: registered {:?} for {:?}", id, route);
                registrations.push(Registration {
                    id,
                    route,
                    processor,
                });
            }
        }
    }

    /// Remove every registration of `id`
    ///
    /// Unregistering an unknown processor is a no-op.
    pub fn unregister(&self, id: ProcessorId) {
        let mut registrations = self.inner.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        if registrations.len() != before {
            log::debug!("Dispatcher: unregistered {:?}", id);
        }
    }

    /// Whether `id` has at least one live registration
    pub fn is_registered(&self, id: ProcessorId) -> bool {
        self.inner
            .registrations
            .borrow()
            .iter()
            .any(|r| r.id == id && r.processor.strong_count() > 0)
    }

    /// Whether `id` receives actions of type `A`
    pub fn is_registered_for<A: Action>(&self, id: ProcessorId) -> bool {
        let action_type = ActionType::of::<A>();
        self.inner
            .registrations
            .borrow()
            .iter()
            .any(|r| r.id == id && r.route.matches(action_type) && r.processor.strong_count() > 0)
    }

    /// Number of distinct live processors
    pub fn processor_count(&self) -> usize {
        let registrations = self.inner.registrations.borrow();
        let mut ids: Vec<ProcessorId> = registrations
            .iter()
            .filter(|r| r.processor.strong_count() > 0)
            .map(|r| r.id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids.dedup();
        ids.len()
    }

    /// Deliver `action` to every matching processor
    pub fn dispatch<A: Action>(&self, action: A) {
        self.dispatch_dyn(&action);
    }

    /// Deliver an already type-erased action
    ///
    /// The recipient set is captured before the first callback runs. A
    /// processor that registers or unregisters during the fan-out affects the
    /// next dispatch, never the current one. A processor reachable through
    /// several matching routes is called once.
    pub fn dispatch_dyn(&self, action: &dyn Action) {
        let action_type = <dyn Action as Routable>::action_type(action);
        let recipients = self.recipients(action_type);

        if recipients.is_empty() {
            log::debug!("Dispatcher: no processor for {:?}", action_type);
            return;
        }

        for processor in recipients {
            processor.on_action(action);
        }
    }

    /// Dispatch a batch of actions in order
    pub fn dispatch_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = Box<dyn Action>>,
    {
        for action in actions {
            self.dispatch_dyn(action.as_ref());
        }
    }

    fn recipients(&self, action_type: ActionType) -> Vec<Rc<dyn ActionsProcessor>> {
        let mut registrations = self.inner.registrations.borrow_mut();
        registrations.retain(|r| r.processor.strong_count() > 0);

        let mut seen: Vec<ProcessorId> = Vec::new();
        let mut recipients = Vec::new();
        for registration in registrations.iter() {
            if !registration.route.matches(action_type) || seen.contains(&registration.id) {
                continue;
            }
            if let Some(processor) = registration.processor.upgrade() {
                seen.push(registration.id);
                recipients.push(processor);
            }
        }
        recipients
    }

    /// A sendable handle feeding actions back into this dispatcher
    pub fn sender(&self) -> ActionSender {
        ActionSender::new(self.inner.action_tx.clone())
    }

    /// Dispatch every action queued through [`ActionSender`]s so far
    ///
    /// Returns the number of actions dispatched. Never blocks.
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        while let Ok(action) = self.inner.action_rx.try_recv() {
            self.dispatch_dyn(action.as_action());
            processed += 1;
        }
        processed
    }

    /// Wait up to `timeout` for one queued action and dispatch it
    ///
    /// Returns `true` if an action was dispatched.
    pub fn process_next(&self, timeout: Duration) -> bool {
        match self.inner.action_rx.recv_timeout(timeout) {
            Ok(action) => {
                self.dispatch_dyn(action.as_action());
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            // the dispatcher holds a sender itself, so this cannot happen
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AccountAction, RecordingProcessor, SiteAction};
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_register_then_unregister() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());

        let id = dispatcher.register_all(&processor);
        assert!(dispatcher.is_registered(id));
        assert_eq!(id, ProcessorId::of(&processor));

        dispatcher.unregister(id);
        assert!(!dispatcher.is_registered(id));
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());

        dispatcher.unregister(ProcessorId::of(&processor));
        dispatcher.unregister(ProcessorId::of(&processor));
        assert_eq!(dispatcher.processor_count(), 0);
    }

    #[test]
    fn test_dispatch_reaches_registered_processor() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        dispatcher.register_all(&processor);

        dispatcher.dispatch(SiteAction::RefreshSites);

        assert_eq!(*processor.received.borrow(), vec!["RefreshSites".to_string()]);
    }

    #[test]
    fn test_repeated_registration_delivers_once() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        for _ in 0..100 {
            dispatcher.register_all(&processor);
        }

        dispatcher.dispatch(SiteAction::RefreshSites);

        assert_eq!(processor.count(), 1);
        assert_eq!(dispatcher.processor_count(), 1);
    }

    #[test]
    fn test_typed_registration_filters_other_types() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        dispatcher.register::<SiteAction, _>(&processor);

        dispatcher.dispatch(AccountAction::Authenticate);
        assert_eq!(processor.count(), 0);

        dispatcher.dispatch(SiteAction::RefreshSite(42));
        assert_eq!(*processor.received.borrow(), vec!["RefreshSite(42)".to_string()]);
    }

    #[test]
    fn test_typed_registration_for_several_types() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        let id = dispatcher.register::<SiteAction, _>(&processor);
        dispatcher.register::<AccountAction, _>(&processor);

        assert!(dispatcher.is_registered_for::<SiteAction>(id));
        assert!(dispatcher.is_registered_for::<AccountAction>(id));

        dispatcher.dispatch(SiteAction::RefreshSites);
        dispatcher.dispatch(AccountAction::Authenticate);
        assert_eq!(processor.count(), 2);

        // unregister drops every route at once
        dispatcher.unregister(id);
        dispatcher.dispatch(SiteAction::RefreshSites);
        dispatcher.dispatch(AccountAction::Authenticate);
        assert_eq!(processor.count(), 2);
    }

    #[test]
    fn test_overlapping_routes_deliver_once() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        dispatcher.register_all(&processor);
        dispatcher.register::<SiteAction, _>(&processor);

        dispatcher.dispatch(SiteAction::RefreshSites);

        assert_eq!(processor.count(), 1);
    }

    #[test]
    fn test_fan_out_reaches_every_processor_before_return() {
        let dispatcher = Dispatcher::new();
        let processors: Vec<Rc<RecordingProcessor>> =
            (0..5).map(|_| Rc::new(RecordingProcessor::default())).collect();
        for processor in &processors {
            dispatcher.register::<AccountAction, _>(processor);
        }

        dispatcher.dispatch(AccountAction::SynchronizeAccount);

        for processor in &processors {
            assert_eq!(processor.count(), 1);
        }
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        let id = dispatcher.register_all(&processor);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(processor.count(), 1);

        dispatcher.unregister(id);
        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(processor.count(), 1);
    }

    #[test]
    fn test_dropped_processor_is_skipped() {
        let dispatcher = Dispatcher::new();
        let kept = Rc::new(RecordingProcessor::default());
        let dropped = Rc::new(RecordingProcessor::default());
        dispatcher.register_all(&kept);
        let dropped_id = dispatcher.register_all(&dropped);
        drop(dropped);

        assert!(!dispatcher.is_registered(dropped_id));
        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(kept.count(), 1);
        assert_eq!(dispatcher.processor_count(), 1);
    }

    #[test]
    fn test_delivery_follows_registration_order() {
        struct Ordered {
            name: &'static str,
            log: Rc<RefCell<Vec<&'static str>>>,
        }
        impl ActionsProcessor for Ordered {
            fn on_action(&self, _action: &dyn Action) {
                self.log.borrow_mut().push(self.name);
            }
        }

        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::new(Ordered { name: "first", log: log.clone() });
        let second = Rc::new(Ordered { name: "second", log: log.clone() });
        dispatcher.register_all(&first);
        dispatcher.register_all(&second);
        // overwrite keeps the original slot
        dispatcher.register_all(&first);

        dispatcher.dispatch(SiteAction::RefreshSites);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    /// Unregisters itself the first time it sees an action
    struct OneShot {
        dispatcher: Dispatcher,
        id: Cell<Option<ProcessorId>>,
        received: Cell<usize>,
    }

    impl ActionsProcessor for OneShot {
        fn on_action(&self, _action: &dyn Action) {
            self.received.set(self.received.get() + 1);
            if let Some(id) = self.id.take() {
                self.dispatcher.unregister(id);
            }
        }
    }

    #[test]
    fn test_self_unregistration_during_dispatch() {
        let dispatcher = Dispatcher::new();
        let before = Rc::new(RecordingProcessor::default());
        let one_shot = Rc::new(OneShot {
            dispatcher: dispatcher.clone(),
            id: Cell::new(None),
            received: Cell::new(0),
        });
        let after = Rc::new(RecordingProcessor::default());

        dispatcher.register_all(&before);
        one_shot.id.set(Some(dispatcher.register_all(&one_shot)));
        dispatcher.register_all(&after);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(before.count(), 1);
        assert_eq!(one_shot.received.get(), 1);
        assert_eq!(after.count(), 1);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(before.count(), 2);
        assert_eq!(one_shot.received.get(), 1);
        assert_eq!(after.count(), 2);
    }

    #[test]
    fn test_unregistering_another_processor_mid_dispatch() {
        struct Evictor {
            dispatcher: Dispatcher,
            victim: ProcessorId,
        }
        impl ActionsProcessor for Evictor {
            fn on_action(&self, _action: &dyn Action) {
                self.dispatcher.unregister(self.victim);
            }
        }

        let dispatcher = Dispatcher::new();
        let victim = Rc::new(RecordingProcessor::default());
        let evictor = Rc::new(Evictor {
            dispatcher: dispatcher.clone(),
            victim: ProcessorId::of(&victim),
        });
        dispatcher.register_all(&evictor);
        dispatcher.register_all(&victim);

        // the recipient set was captured before the evictor ran
        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(victim.count(), 1);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(victim.count(), 1);
    }

    #[test]
    fn test_registration_during_dispatch_applies_to_next_dispatch() {
        struct Recruiter {
            dispatcher: Dispatcher,
            recruit: Rc<RecordingProcessor>,
        }
        impl ActionsProcessor for Recruiter {
            fn on_action(&self, _action: &dyn Action) {
                self.dispatcher.register_all(&self.recruit);
            }
        }

        let dispatcher = Dispatcher::new();
        let recruit = Rc::new(RecordingProcessor::default());
        let recruiter = Rc::new(Recruiter {
            dispatcher: dispatcher.clone(),
            recruit: recruit.clone(),
        });
        dispatcher.register_all(&recruiter);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(recruit.count(), 0);

        dispatcher.dispatch(SiteAction::RefreshSites);
        assert_eq!(recruit.count(), 1);
    }

    #[test]
    fn test_nested_dispatch_completes_inline() {
        struct Forwarder {
            dispatcher: Dispatcher,
        }
        impl ActionsProcessor for Forwarder {
            fn on_action(&self, action: &dyn Action) {
                if let Some(SiteAction::RefreshSites) = action.downcast_ref::<SiteAction>() {
                    self.dispatcher.dispatch(AccountAction::SynchronizeAccount);
                }
            }
        }

        let dispatcher = Dispatcher::new();
        let forwarder = Rc::new(Forwarder {
            dispatcher: dispatcher.clone(),
        });
        let observer = Rc::new(RecordingProcessor::default());
        dispatcher.register_all(&forwarder);
        dispatcher.register_all(&observer);

        dispatcher.dispatch(SiteAction::RefreshSites);

        assert_eq!(
            *observer.received.borrow(),
            vec!["SynchronizeAccount".to_string(), "RefreshSites".to_string()]
        );
    }

    #[test]
    fn test_dispatch_all_preserves_order() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        dispatcher.register_all(&processor);

        dispatcher.dispatch_all(vec![
            Box::new(AccountAction::Authenticate) as Box<dyn Action>,
            Box::new(SiteAction::RefreshSite(1)),
            Box::new(SiteAction::RefreshSites),
        ]);

        assert_eq!(
            *processor.received.borrow(),
            vec![
                "Authenticate".to_string(),
                "RefreshSite(1)".to_string(),
                "RefreshSites".to_string()
            ]
        );
    }

    #[test]
    fn test_shared_dispatcher_is_stable_per_thread() {
        let first = Dispatcher::shared();
        let second = Dispatcher::shared();
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&Dispatcher::new()));
    }

    #[test]
    fn test_sender_queues_until_processed() {
        let dispatcher = Dispatcher::new();
        let processor = Rc::new(RecordingProcessor::default());
        dispatcher.register::<SiteAction, _>(&processor);

        let sender = dispatcher.sender();
        let worker = std::thread::spawn(move || {
            sender.send(SiteAction::RefreshSite(1));
            sender.send(SiteAction::RefreshSite(2));
        });
        worker.join().unwrap();

        assert_eq!(processor.count(), 0);
        assert_eq!(dispatcher.process_pending(), 2);
        assert_eq!(
            *processor.received.borrow(),
            vec!["RefreshSite(1)".to_string(), "RefreshSite(2)".to_string()]
        );
        assert_eq!(dispatcher.process_pending(), 0);
    }

    #[test]
    fn test_process_next_times_out_when_idle() {
        let dispatcher = Dispatcher::new();
        assert!(!dispatcher.process_next(Duration::from_millis(10)));

        dispatcher.sender().send(SiteAction::RefreshSites);
        assert!(dispatcher.process_next(Duration::from_millis(10)));
    }

    #[test]
    #[should_panic(expected = "processor failed")]
    fn test_processor_panic_propagates_to_caller() {
        struct Failing;
        impl ActionsProcessor for Failing {
            fn on_action(&self, _action: &dyn Action) {
                panic!("processor failed");
            }
        }

        let dispatcher = Dispatcher::new();
        let failing = Rc::new(Failing);
        dispatcher.register_all(&failing);
        dispatcher.dispatch(SiteAction::RefreshSites);
    }
}

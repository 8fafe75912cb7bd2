use crate::action::{Action, ActionType, Routable};
use crate::dispatcher::{ActionsProcessor, Dispatcher, ProcessorId};
use std::rc::Rc;

/// ActionLogger - logs every action passing through the dispatcher
pub struct ActionLogger {
    ignored: Vec<ActionType>,
}

impl Default for ActionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLogger {
    pub fn new() -> Self {
        Self {
            ignored: Vec::new(),
        }
    }

    /// Skip actions of type `A` (chatty input plumbing, for instance)
    pub fn ignore<A: Action>(mut self) -> Self {
        self.ignored.push(ActionType::of::<A>());
        self
    }

    /// Register a logger for every action on `dispatcher`
    ///
    /// The dispatcher only holds a weak reference: keep the returned `Rc`
    /// alive for as long as logging is wanted.
    pub fn attach(self, dispatcher: &Dispatcher) -> (Rc<Self>, ProcessorId) {
        let logger = Rc::new(self);
        let id = dispatcher.register_all(&logger);
        (logger, id)
    }

    fn is_ignored(&self, action: &dyn Action) -> bool {
        let action_type = <dyn Action as Routable>::action_type(action);
        self.ignored.contains(&action_type)
    }
}

impl ActionsProcessor for ActionLogger {
    fn on_action(&self, action: &dyn Action) {
        if !self.is_ignored(action) {
            log::debug!("Action: {:?}", action);
        }
    }
}

//! Recording processors and listeners shared by the unit tests

use crate::{Action, ActionsProcessor, Event, EventListener};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
pub enum SiteAction {
    RefreshSites,
    RefreshSite(i64),
}
impl Action for SiteAction {}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountAction {
    Authenticate,
    SynchronizeAccount,
}
impl Action for AccountAction {}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    Authenticated,
}
impl Event for AccountEvent {}

/// Processor that keeps the debug rendering of everything it receives
#[derive(Default)]
pub struct RecordingProcessor {
    pub received: RefCell<Vec<String>>,
}

impl RecordingProcessor {
    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }
}

impl ActionsProcessor for RecordingProcessor {
    fn on_action(&self, action: &dyn Action) {
        self.received.borrow_mut().push(format!("{:?}", action));
    }
}

/// Listener that keeps every event it receives
#[derive(Default)]
pub struct RecordingListener {
    pub received: RefCell<Vec<AccountEvent>>,
}

impl RecordingListener {
    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }
}

impl EventListener<AccountEvent> for RecordingListener {
    fn on_event(&self, event: &AccountEvent) {
        self.received.borrow_mut().push(event.clone());
    }
}

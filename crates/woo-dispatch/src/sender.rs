//! Sendable handle for re-entering the dispatcher from other threads
//!
//! Network work runs off the dispatcher's thread. When it finishes it does not
//! touch stores directly; it sends a completion action through an
//! `ActionSender`, and the owning thread dispatches it on its next
//! `process_pending` / `process_next` call.

use crate::action::Action;
use std::sync::mpsc::Sender;

/// Queues actions for the dispatcher that created it
#[derive(Clone)]
pub struct ActionSender {
    action_tx: Sender<Box<dyn Action + Send>>,
}

impl ActionSender {
    pub(crate) fn new(action_tx: Sender<Box<dyn Action + Send>>) -> Self {
        Self { action_tx }
    }

    /// Queue an action
    ///
    /// If the dispatcher is gone the action is dropped and an error is logged.
    pub fn send<A: Action + Send>(&self, action: A) {
        if let Err(e) = self.action_tx.send(Box::new(action)) {
            log::error!("ActionSender: failed to send action: {}", e);
        }
    }
}

//! Collaborators shared by every store
//!
//! A `StoreContext` is built once and cloned into each store. Tests build one
//! around in-memory collaborators and an isolated dispatcher.
//!
//! Every context carries a scope, renewed by [`StoreContext::with_credentials`].
//! Network completions are tagged with the scope that issued them, and
//! stores drop completions from another scope: results of a signed-out
//! session never reach the stores of the next one.

use crate::error::NetworkError;
use crate::model::Credentials;
use crate::network::{Network, Request};
use crate::storage::StorageManager;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use woo_dispatch::{Action, Dispatcher};

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

fn next_scope() -> u64 {
    NEXT_SCOPE.fetch_add(1, Ordering::Relaxed)
}

/// A store action produced by a finished request
#[derive(Debug)]
pub struct Completion<A> {
    scope: u64,
    action: A,
}

impl<A: Action> Action for Completion<A> {}

#[derive(Clone)]
pub struct StoreContext {
    dispatcher: Dispatcher,
    storage: Arc<dyn StorageManager>,
    network: Arc<dyn Network>,
    runtime: Handle,
    credentials: Option<Credentials>,
    scope: u64,
}

impl StoreContext {
    pub fn new(
        dispatcher: Dispatcher,
        storage: Arc<dyn StorageManager>,
        network: Arc<dyn Network>,
        runtime: Handle,
    ) -> Self {
        Self {
            dispatcher,
            storage,
            network,
            runtime,
            credentials: None,
            scope: next_scope(),
        }
    }

    /// Same collaborators in a new scope, requests signed with `credentials`
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self.scope = next_scope();
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn storage(&self) -> &dyn StorageManager {
        self.storage.as_ref()
    }

    /// A GET request signed with the context's credentials
    pub fn get(&self, path: impl Into<String>) -> Request {
        Request::get(path).authorized(self.credentials.as_ref().map(|c| c.auth_token.as_str()))
    }

    /// Run `request` on the runtime and dispatch its outcome
    ///
    /// The body is decoded into `T`, wrapped into an action by `complete`, and
    /// queued on the dispatcher as a [`Completion`] of this scope. It is
    /// handled on the dispatcher's thread the next time it processes pending
    /// actions.
    pub fn perform<T, A, F>(&self, request: Request, complete: F)
    where
        T: DeserializeOwned + Send + 'static,
        A: Action + Send,
        F: FnOnce(Result<T, NetworkError>) -> A + Send + 'static,
    {
        let network = Arc::clone(&self.network);
        let sender = self.dispatcher.sender();
        let scope = self.scope;

        log::debug!("Performing {}", request);
        self.runtime.spawn(async move {
            let result = network
                .request(request)
                .await
                .and_then(|body| serde_json::from_value::<T>(body).map_err(NetworkError::from));
            sender.send(Completion {
                scope,
                action: complete(result),
            });
        });
    }

    /// The store action inside `completion`, if it belongs to this scope
    pub fn accept<'a, A: Action>(&self, completion: &'a Completion<A>) -> Option<&'a A> {
        if completion.scope == self.scope {
            Some(&completion.action)
        } else {
            log::debug!("Dropping stale completion {:?}", completion.action);
            None
        }
    }

    /// Unwrap a store action of type `A`, plain or as a completion
    ///
    /// Returns `None` for other action types and for completions of
    /// another scope.
    pub fn action<'a, A: Action>(&self, action: &'a dyn Action) -> Option<&'a A> {
        match action.downcast_ref::<Completion<A>>() {
            Some(completion) => self.accept(completion),
            None => action.downcast_ref::<A>(),
        }
    }
}

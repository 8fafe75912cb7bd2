//! Stores manager
//!
//! Owns the stores while a user is signed in. Signing in builds and registers
//! the domain stores; signing out drops them (which unregisters them), wipes
//! storage and forgets the session.
//!
//! Actions dispatched through the manager while signed out are dropped.

use crate::account::{AccountAction, AccountEvent, AccountStore};
use crate::context::StoreContext;
use crate::model::Credentials;
use crate::site::{SiteAction, SiteStore};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use woo_config::Session;
use woo_dispatch::{Action, Dispatcher, Event, EventBus, EventListener, Store, StoreHandle};

/// Sign-in state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn { username: String },
    LoggedOut,
    DefaultSiteChanged(i64),
}

impl Event for SessionEvent {}

struct Authenticated {
    credentials: Credentials,
    account_store: StoreHandle<AccountStore>,
    site_store: StoreHandle<SiteStore>,
    _session_recorder: Rc<SessionRecorder>,
}

enum State {
    Deauthenticated,
    Authenticated(Box<Authenticated>),
}

/// Persists the session, optionally to a file
struct SessionKeeper {
    session: RefCell<Session>,
    path: Option<PathBuf>,
}

impl SessionKeeper {
    fn update(&self, f: impl FnOnce(&mut Session)) {
        let mut session = self.session.borrow_mut();
        f(&mut session);
        if let Some(path) = &self.path {
            if let Err(e) = session.save_to_path(path) {
                log::error!("Failed to save session: {:#}", e);
            }
        }
    }
}

/// Remembers the synchronized account as the session default
struct SessionRecorder {
    keeper: Rc<SessionKeeper>,
}

impl EventListener<AccountEvent> for SessionRecorder {
    fn on_event(&self, event: &AccountEvent) {
        if let AccountEvent::AccountSynchronized(account) = event {
            let user_id = account.user_id;
            self.keeper.update(|s| s.set_default_account_id(user_id));
        }
    }
}

pub struct StoresManager {
    context: StoreContext,
    keeper: Rc<SessionKeeper>,
    state: State,
    session_events: EventBus<SessionEvent>,
}

impl StoresManager {
    /// Start signed out. The session is kept in memory only.
    pub fn new(context: StoreContext, session: Session) -> Self {
        Self {
            context,
            keeper: Rc::new(SessionKeeper {
                session: RefCell::new(session),
                path: None,
            }),
            state: State::Deauthenticated,
            session_events: EventBus::new(),
        }
    }

    /// Write the session to `path` whenever it changes
    pub fn persist_session_to(mut self, path: PathBuf) -> Self {
        let session = self.keeper.session.borrow().clone();
        self.keeper = Rc::new(SessionKeeper {
            session: RefCell::new(session),
            path: Some(path),
        });
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.context.dispatcher()
    }

    pub fn session_events(&self) -> &EventBus<SessionEvent> {
        &self.session_events
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.keeper.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated(_))
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        match &self.state {
            State::Authenticated(auth) => Some(&auth.credentials),
            State::Deauthenticated => None,
        }
    }

    pub fn account_store(&self) -> Option<&StoreHandle<AccountStore>> {
        match &self.state {
            State::Authenticated(auth) => Some(&auth.account_store),
            State::Deauthenticated => None,
        }
    }

    pub fn site_store(&self) -> Option<&StoreHandle<SiteStore>> {
        match &self.state {
            State::Authenticated(auth) => Some(&auth.site_store),
            State::Deauthenticated => None,
        }
    }

    /// Switch to the authenticated state with `credentials`
    ///
    /// Stores built for earlier credentials are dropped first.
    pub fn authenticate(&mut self, credentials: Credentials) {
        let was_authenticated = self.is_authenticated();
        self.state = State::Deauthenticated;

        let context = self.context.clone().with_credentials(credentials.clone());
        let dispatcher = self.context.dispatcher();
        let account_store = StoreHandle::new(AccountStore::new(context.clone()), dispatcher);
        let site_store = StoreHandle::new(SiteStore::new(context), dispatcher);

        let recorder = Rc::new(SessionRecorder {
            keeper: self.keeper.clone(),
        });
        account_store.event_bus().subscribe(&recorder);

        self.keeper
            .update(|s| s.set_credentials(&credentials.username, &credentials.site_address));

        log::info!("Authenticated as {}", credentials.username);
        let username = credentials.username.clone();
        self.state = State::Authenticated(Box::new(Authenticated {
            credentials,
            account_store,
            site_store,
            _session_recorder: recorder,
        }));

        if !was_authenticated {
            self.session_events
                .emit(&SessionEvent::LoggedIn { username });
        }
    }

    /// Switch to the deauthenticated state, wiping storage and session
    pub fn deauthenticate(&mut self) {
        let was_authenticated = self.is_authenticated();
        self.state = State::Deauthenticated;
        self.context.storage().reset();
        self.keeper.update(Session::reset);

        if was_authenticated {
            log::info!("Deauthenticated");
            self.session_events.emit(&SessionEvent::LoggedOut);
        }
    }

    /// Forward `action` to the stores
    pub fn dispatch<A: Action>(&self, action: A) {
        if !self.is_authenticated() {
            log::warn!("Dropping {:?}: not authenticated", action);
            return;
        }
        self.context.dispatcher().dispatch(action);
    }

    /// Forward several actions, in order
    pub fn dispatch_all(&self, actions: Vec<Box<dyn Action>>) {
        if !self.is_authenticated() {
            log::warn!("Dropping {} action(s): not authenticated", actions.len());
            return;
        }
        self.context.dispatcher().dispatch_all(actions);
    }

    /// Kick off synchronization of every session entity
    ///
    /// Account, site list and, once a default site is known, its plan.
    pub fn synchronize_entities(&self) {
        let mut actions: Vec<Box<dyn Action>> = vec![
            Box::new(AccountAction::SynchronizeAccount),
            Box::new(SiteAction::RefreshSites),
        ];
        if let Some(site_id) = self.keeper.session.borrow().default_site_id() {
            actions.push(Box::new(AccountAction::SynchronizeSitePlan { site_id }));
        }
        self.dispatch_all(actions);
    }

    /// Make `site_id` the default site and select it
    pub fn update_default_site(&self, site_id: i64) {
        if !self.is_authenticated() {
            log::warn!("Cannot change default site: not authenticated");
            return;
        }

        let previous = self.keeper.session.borrow().default_site_id();
        self.keeper.update(|s| s.set_default_site_id(site_id));
        self.dispatch(SiteAction::SelectSite(site_id));

        if previous != Some(site_id) {
            self.session_events
                .emit(&SessionEvent::DefaultSiteChanged(site_id));
        }
    }
}

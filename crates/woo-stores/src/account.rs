//! Account domain: sign-in verification, account sync and site plans

use crate::context::{Completion, StoreContext};
use crate::error::NetworkError;
use crate::model::{Account, Credentials, SiteDetails, SitePlan};
use crate::network::Request;
use woo_dispatch::{Action, ActionsProcessor, Event, EventBus, Registrar, Store};

#[derive(Debug)]
pub enum AccountAction {
    /// Verify `Credentials` against the API
    Authenticate(Credentials),
    /// Fetch the signed-in account and store it
    SynchronizeAccount,
    /// Look up a stored account, without a network round trip
    LoadAccount { user_id: i64 },
    /// Fetch and store the plan of a site
    SynchronizeSitePlan { site_id: i64 },

    // completions, queued by the store itself
    AuthenticationCompleted(Result<Account, NetworkError>),
    AccountFetched(Result<Account, NetworkError>),
    SitePlanFetched {
        site_id: i64,
        result: Result<SitePlan, NetworkError>,
    },
}

impl Action for AccountAction {}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    Authenticated(Account),
    AuthenticationFailed(NetworkError),
    AccountSynchronized(Account),
    AccountLoaded(Option<Account>),
    SitePlanSynchronized(SitePlan),
    SynchronizationFailed(NetworkError),
}

impl Event for AccountEvent {}

/// AccountStore - owns the signed-in account and site plans
pub struct AccountStore {
    context: StoreContext,
    event_bus: EventBus<AccountEvent>,
}

impl AccountStore {
    pub fn new(context: StoreContext) -> Self {
        Self {
            context,
            event_bus: EventBus::new(),
        }
    }

    fn authenticate(&self, credentials: &Credentials) {
        let request = Request::get("me").authorized(Some(&credentials.auth_token));
        self.context
            .perform(request, AccountAction::AuthenticationCompleted);
    }

    fn synchronize_account(&self) {
        let request = self.context.get("me");
        self.context.perform(request, AccountAction::AccountFetched);
    }

    fn load_account(&self, user_id: i64) {
        let account = self.context.storage().load_account(user_id);
        self.event_bus.emit(&AccountEvent::AccountLoaded(account));
    }

    fn synchronize_site_plan(&self, site_id: i64) {
        let request = self.context.get(format!("sites/{}", site_id));
        self.context
            .perform(request, move |result: Result<SiteDetails, NetworkError>| {
                AccountAction::SitePlanFetched {
                    site_id,
                    result: result.map(|details| SitePlan {
                        site_id,
                        short_name: details.plan.product_name_short,
                    }),
                }
            });
    }

    fn authentication_completed(&self, result: &Result<Account, NetworkError>) {
        match result {
            Ok(account) => {
                log::info!("Authenticated as {}", account.username);
                self.context.storage().upsert_account(account);
                self.event_bus
                    .emit(&AccountEvent::Authenticated(account.clone()));
            }
            Err(e) => {
                log::warn!("Authentication failed: {}", e);
                self.event_bus
                    .emit(&AccountEvent::AuthenticationFailed(e.clone()));
            }
        }
    }

    fn account_fetched(&self, result: &Result<Account, NetworkError>) {
        match result {
            Ok(account) => {
                self.context.storage().upsert_account(account);
                self.event_bus
                    .emit(&AccountEvent::AccountSynchronized(account.clone()));
            }
            Err(e) => {
                log::error!("Failed to synchronize account: {}", e);
                self.event_bus
                    .emit(&AccountEvent::SynchronizationFailed(e.clone()));
            }
        }
    }

    fn site_plan_fetched(&self, site_id: i64, result: &Result<SitePlan, NetworkError>) {
        match result {
            Ok(plan) => {
                self.context.storage().upsert_site_plan(plan);
                self.event_bus
                    .emit(&AccountEvent::SitePlanSynchronized(plan.clone()));
            }
            Err(e) => {
                log::error!("Failed to synchronize plan of site {}: {}", site_id, e);
                self.event_bus
                    .emit(&AccountEvent::SynchronizationFailed(e.clone()));
            }
        }
    }
}

impl ActionsProcessor for AccountStore {
    fn on_action(&self, action: &dyn Action) {
        let Some(action) = self.context.action::<AccountAction>(action) else {
            log::trace!("AccountStore ignoring {:?}", action);
            return;
        };

        match action {
            AccountAction::Authenticate(credentials) => self.authenticate(credentials),
            AccountAction::SynchronizeAccount => self.synchronize_account(),
            AccountAction::LoadAccount { user_id } => self.load_account(*user_id),
            AccountAction::SynchronizeSitePlan { site_id } => self.synchronize_site_plan(*site_id),
            AccountAction::AuthenticationCompleted(result) => self.authentication_completed(result),
            AccountAction::AccountFetched(result) => self.account_fetched(result),
            AccountAction::SitePlanFetched { site_id, result } => {
                self.site_plan_fetched(*site_id, result)
            }
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
        registrar.register::<Completion<AccountAction>>();
    }
}

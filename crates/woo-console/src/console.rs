//! Console commands and their execution
//!
//! Input lines arrive as [`ConsoleAction`]s through the dispatcher, so they
//! are handled on the main thread between store completions. Store and
//! session events are printed by an [`EventPrinter`].

use anyhow::{bail, Context, Result};
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::io::Write;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use woo_config::AppConfig;
use woo_dispatch::{Action, ActionsProcessor, Dispatcher, EventListener, Store};
use woo_stores::{
    AccountAction, AccountEvent, Credentials, NetworkError, SessionEvent, Site, SiteAction,
    SiteEvent, StoresManager,
};

/// Environment variable holding the auth token when `login` omits it
pub const TOKEN_ENV: &str = "WOO_AUTH_TOKEN";

const HELP: &str = "\
Commands:
  login [user] [token] [site]  sign in (token defaults to $WOO_AUTH_TOKEN)
  logout                       sign out and forget the session
  account                      synchronize the signed-in account
  sites                        refresh the site list
  site <id>                    show a site, fetching the list if needed
  select <id>                  make a site the default one
  plan <id>                    synchronize the plan of a site
  help                         show this help
  quit                         exit";

#[derive(Debug)]
pub enum ConsoleAction {
    /// A line read from the input
    Line(String),
    /// The input reached end of file
    InputClosed,
}

impl Action for ConsoleAction {}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        username: Option<String>,
        token: Option<String>,
        site: Option<String>,
    },
    Logout,
    Account,
    Sites,
    Site(i64),
    Select(i64),
    Plan(i64),
    Help,
    Quit,
}

fn site_id(word: Option<&str>) -> Result<i64> {
    let word = word.context("missing site id")?;
    word.parse()
        .with_context(|| format!("invalid site id `{}`", word))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };

        let command = match name {
            "login" => Command::Login {
                username: words.next().map(str::to_string),
                token: words.next().map(str::to_string),
                site: words.next().map(str::to_string),
            },
            "logout" => Command::Logout,
            "account" => Command::Account,
            "sites" => Command::Sites,
            "site" => Command::Site(site_id(words.next())?),
            "select" => Command::Select(site_id(words.next())?),
            "plan" => Command::Plan(site_id(words.next())?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{}`", other),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument `{}`", extra);
        }
        Ok(command)
    }
}

/// Writes a line per event to the console output
pub struct EventPrinter<W: Write> {
    out: Rc<RefCell<W>>,
}

impl<W: Write> EventPrinter<W> {
    fn say(&self, text: impl Display) {
        if let Err(e) = writeln!(self.out.borrow_mut(), "{}", text) {
            log::error!("Failed to write to console: {}", e);
        }
    }

    fn site_line(site: &Site) -> String {
        let marker = if site.is_woocommerce_active { "" } else { " (no store)" };
        format!("[{}] {} {}{}", site.site_id, site.name, site.url, marker)
    }
}

impl<W: Write> EventListener<AccountEvent> for EventPrinter<W> {
    fn on_event(&self, event: &AccountEvent) {
        match event {
            AccountEvent::Authenticated(account) => {
                self.say(format!("Signed in as {} <{}>", account.display_name, account.email))
            }
            AccountEvent::AuthenticationFailed(e) => self.say(format!("Sign-in failed: {}", e)),
            AccountEvent::AccountSynchronized(account) | AccountEvent::AccountLoaded(Some(account)) => {
                self.say(format!(
                    "Account #{}: {} <{}>",
                    account.user_id, account.username, account.email
                ))
            }
            AccountEvent::AccountLoaded(None) => self.say("Account not stored"),
            AccountEvent::SitePlanSynchronized(plan) => {
                self.say(format!("Site {} is on the {} plan", plan.site_id, plan.short_name))
            }
            AccountEvent::SynchronizationFailed(e) => {
                self.say(format!("Synchronization failed: {}", e))
            }
        }
    }
}

impl<W: Write> EventListener<SiteEvent> for EventPrinter<W> {
    fn on_event(&self, event: &SiteEvent) {
        match event {
            SiteEvent::SitesRefreshed(sites) => {
                self.say(format!("{} site(s):", sites.len()));
                for site in sites {
                    self.say(format!("  {}", Self::site_line(site)));
                }
            }
            SiteEvent::SiteRefreshed(site) | SiteEvent::SiteLoaded(site) => {
                self.say(Self::site_line(site))
            }
            SiteEvent::SiteSelected(site) => self.say(format!("Selected {}", site.name)),
            SiteEvent::UnknownSite(site_id) => self.say(format!("Unknown site {}", site_id)),
            SiteEvent::RefreshFailed(e) => self.say(format!("Failed to refresh sites: {}", e)),
        }
    }
}

impl<W: Write> EventListener<SessionEvent> for EventPrinter<W> {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::LoggedIn { username } => {
                self.say(format!("Logged in as {}, verifying credentials", username))
            }
            SessionEvent::LoggedOut => self.say("Logged out"),
            SessionEvent::DefaultSiteChanged(site_id) => {
                self.say(format!("Default site is now {}", site_id))
            }
        }
    }
}

/// Console - turns input lines into store actions
pub struct Console<W: Write + 'static> {
    me: Weak<Console<W>>,
    manager: RefCell<StoresManager>,
    config: AppConfig,
    printer: Rc<EventPrinter<W>>,
    running: Cell<bool>,
}

impl<W: Write + 'static> Console<W> {
    /// Build a console and register it for [`ConsoleAction`]s
    pub fn attach(manager: StoresManager, config: AppConfig, out: W) -> Rc<Self> {
        let printer = Rc::new(EventPrinter {
            out: Rc::new(RefCell::new(out)),
        });
        manager.session_events().subscribe(&printer);

        let console = Rc::new_cyclic(|me| Console {
            me: me.clone(),
            manager: RefCell::new(manager),
            config,
            printer,
            running: Cell::new(true),
        });
        let dispatcher = console.dispatcher();
        dispatcher.register::<ConsoleAction, _>(&console);
        console
    }

    fn dispatcher(&self) -> Dispatcher {
        self.manager.borrow().dispatcher().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.manager.borrow().is_authenticated()
    }

    /// Sign back in as the session's user when a token is available
    pub fn restore_session(&self, token: Option<String>) {
        let session = self.manager.borrow().session();
        let Some(username) = session.username().map(str::to_string) else {
            return;
        };
        let Some(token) = token else {
            self.printer.say(format!(
                "Session found for {}, set {} or use `login` to sign in",
                username, TOKEN_ENV
            ));
            return;
        };

        log::info!("Restoring session of {}", username);
        self.login(Some(username), Some(token), session.session.site_address);
    }

    fn handle_line(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => self.printer.say(format!("{} (try `help`)", e)),
        }
    }

    fn execute(&self, command: Command) {
        log::debug!("Executing {:?}", command);
        match command {
            Command::Login {
                username,
                token,
                site,
            } => self.login(username, token, site),
            Command::Logout => self.manager.borrow_mut().deauthenticate(),
            Command::Account => self.dispatch(AccountAction::SynchronizeAccount),
            Command::Sites => self.dispatch(SiteAction::RefreshSites),
            Command::Site(site_id) => self.dispatch(SiteAction::LoadSite(site_id)),
            Command::Plan(site_id) => self.dispatch(AccountAction::SynchronizeSitePlan { site_id }),
            Command::Select(site_id) => {
                if self.require_login() {
                    self.manager.borrow().update_default_site(site_id);
                }
            }
            Command::Help => self.printer.say(HELP),
            Command::Quit => self.running.set(false),
        }
    }

    fn require_login(&self) -> bool {
        let authenticated = self.is_authenticated();
        if !authenticated {
            self.printer.say("Not logged in (try `login`)");
        }
        authenticated
    }

    fn dispatch<A: Action>(&self, action: A) {
        if self.require_login() {
            self.manager.borrow().dispatch(action);
        }
    }

    fn login(&self, username: Option<String>, token: Option<String>, site: Option<String>) {
        let Some(username) = username.or_else(|| self.config.username.clone()) else {
            self.printer.say("usage: login <user> <token> [site]");
            return;
        };
        let Some(token) = token.or_else(|| std::env::var(TOKEN_ENV).ok()) else {
            self.printer
                .say(format!("No token given and {} is not set", TOKEN_ENV));
            return;
        };
        let site = site.unwrap_or_else(|| self.config.site_address.clone());
        let credentials = Credentials::new(&username, &token, &site);

        {
            let mut manager = self.manager.borrow_mut();
            manager.authenticate(credentials.clone());
            self.watch_stores(&manager);
        }

        let manager = self.manager.borrow();
        manager.dispatch(AccountAction::Authenticate(credentials));
        manager.synchronize_entities();
    }

    fn watch_stores(&self, manager: &StoresManager) {
        if let Some(store) = manager.account_store() {
            store.event_bus().subscribe(&self.printer);
            if let Some(me) = self.me.upgrade() {
                store.event_bus().subscribe(&me);
            }
        }
        if let Some(store) = manager.site_store() {
            store.event_bus().subscribe(&self.printer);
        }
    }

    fn authentication_failed(&self, error: &NetworkError) {
        log::warn!("Signing out after failed authentication: {}", error);
        match self.manager.try_borrow_mut() {
            Ok(mut manager) => manager.deauthenticate(),
            Err(_) => log::error!("Stores manager busy, staying signed in"),
        }
    }
}

impl<W: Write + 'static> ActionsProcessor for Console<W> {
    fn on_action(&self, action: &dyn Action) {
        let Some(action) = action.downcast_ref::<ConsoleAction>() else {
            return;
        };

        match action {
            ConsoleAction::Line(line) => self.handle_line(line),
            ConsoleAction::InputClosed => {
                log::info!("Input closed");
                self.running.set(false);
            }
        }
    }
}

impl<W: Write + 'static> EventListener<AccountEvent> for Console<W> {
    fn on_event(&self, event: &AccountEvent) {
        if let AccountEvent::AuthenticationFailed(error) = event {
            self.authentication_failed(error);
        }
    }
}

#[cfg(test)]
impl<W: Write + 'static> Console<W> {
    fn output(&self) -> std::cell::Ref<'_, W> {
        self.printer.out.borrow()
    }
}

//! Site domain: the list of sites the user manages and the selected one

use crate::context::{Completion, StoreContext};
use crate::error::NetworkError;
use crate::model::{Site, SiteList};
use std::cell::Cell;
use woo_dispatch::{Action, ActionsProcessor, Event, EventBus, Registrar, Store};

#[derive(Debug)]
pub enum SiteAction {
    /// Fetch every site of the signed-in user, replacing the stored list
    RefreshSites,
    /// Fetch one site and update it in storage
    RefreshSite(i64),
    /// Return a stored site, synchronizing the list first if it is unknown
    LoadSite(i64),
    /// Make a stored site the current one
    SelectSite(i64),

    // completions, queued by the store itself
    SitesFetched {
        /// Site to look up once the list is stored (from `LoadSite`)
        requested: Option<i64>,
        result: Result<Vec<Site>, NetworkError>,
    },
    SiteFetched(Result<Site, NetworkError>),
}

impl Action for SiteAction {}

#[derive(Debug, Clone, PartialEq)]
pub enum SiteEvent {
    SitesRefreshed(Vec<Site>),
    SiteRefreshed(Site),
    SiteLoaded(Site),
    SiteSelected(Site),
    UnknownSite(i64),
    RefreshFailed(NetworkError),
}

impl Event for SiteEvent {}

/// SiteStore - owns the site list and the current selection
pub struct SiteStore {
    context: StoreContext,
    event_bus: EventBus<SiteEvent>,
    selected_site_id: Cell<Option<i64>>,
}

impl SiteStore {
    pub fn new(context: StoreContext) -> Self {
        Self {
            context,
            event_bus: EventBus::new(),
            selected_site_id: Cell::new(None),
        }
    }

    pub fn selected_site_id(&self) -> Option<i64> {
        self.selected_site_id.get()
    }

    /// The selected site, if it is still stored
    pub fn selected_site(&self) -> Option<Site> {
        self.selected_site_id
            .get()
            .and_then(|site_id| self.context.storage().load_site(site_id))
    }

    fn refresh_sites(&self, requested: Option<i64>) {
        let request = self.context.get("me/sites");
        self.context
            .perform(request, move |result: Result<SiteList, NetworkError>| {
                SiteAction::SitesFetched {
                    requested,
                    result: result.map(|list| list.sites),
                }
            });
    }

    fn refresh_site(&self, site_id: i64) {
        let request = self.context.get(format!("sites/{}", site_id));
        self.context.perform(request, SiteAction::SiteFetched);
    }

    fn load_site(&self, site_id: i64) {
        match self.context.storage().load_site(site_id) {
            Some(site) => self.event_bus.emit(&SiteEvent::SiteLoaded(site)),
            None => {
                log::debug!("Site {} not stored, synchronizing sites", site_id);
                self.refresh_sites(Some(site_id));
            }
        }
    }

    fn select_site(&self, site_id: i64) {
        match self.context.storage().load_site(site_id) {
            Some(site) => {
                log::info!("Selected site {} ({})", site.site_id, site.name);
                self.selected_site_id.set(Some(site_id));
                self.event_bus.emit(&SiteEvent::SiteSelected(site));
            }
            None => {
                log::warn!("Cannot select unknown site {}", site_id);
                self.event_bus.emit(&SiteEvent::UnknownSite(site_id));
            }
        }
    }

    fn sites_fetched(&self, requested: Option<i64>, result: &Result<Vec<Site>, NetworkError>) {
        let sites = match result {
            Ok(sites) => sites,
            Err(e) => {
                log::error!("Failed to refresh sites: {}", e);
                self.event_bus.emit(&SiteEvent::RefreshFailed(e.clone()));
                return;
            }
        };

        self.context.storage().replace_sites(sites);
        if let Some(selected) = self.selected_site_id.get() {
            if !sites.iter().any(|s| s.site_id == selected) {
                log::warn!("Selected site {} is gone", selected);
                self.selected_site_id.set(None);
            }
        }
        self.event_bus.emit(&SiteEvent::SitesRefreshed(sites.clone()));

        if let Some(site_id) = requested {
            match self.context.storage().load_site(site_id) {
                Some(site) => self.event_bus.emit(&SiteEvent::SiteLoaded(site)),
                None => self.event_bus.emit(&SiteEvent::UnknownSite(site_id)),
            }
        }
    }

    fn site_fetched(&self, result: &Result<Site, NetworkError>) {
        match result {
            Ok(site) => {
                self.context.storage().upsert_site(site);
                self.event_bus.emit(&SiteEvent::SiteRefreshed(site.clone()));
            }
            Err(e) => {
                log::error!("Failed to refresh site: {}", e);
                self.event_bus.emit(&SiteEvent::RefreshFailed(e.clone()));
            }
        }
    }
}

impl ActionsProcessor for SiteStore {
    fn on_action(&self, action: &dyn Action) {
        let Some(action) = self.context.action::<SiteAction>(action) else {
            log::trace!("SiteStore ignoring {:?}", action);
            return;
        };

        match action {
            SiteAction::RefreshSites => self.refresh_sites(None),
            SiteAction::RefreshSite(site_id) => self.refresh_site(*site_id),
            SiteAction::LoadSite(site_id) => self.load_site(*site_id),
            SiteAction::SelectSite(site_id) => self.select_site(*site_id),
            SiteAction::SitesFetched { requested, result } => self.sites_fetched(*requested, result),
            SiteAction::SiteFetched(result) => self.site_fetched(result),
        }
    }
}

impl Store for SiteStore {
    type Event = SiteEvent;

    fn event_bus(&self) -> &EventBus<SiteEvent> {
        &self.event_bus
    }

    fn register_supported_actions(&self, registrar: &mut Registrar<'_>) {
        registrar.register::<SiteAction>();
        registrar.register::<Completion<SiteAction>>();
    }
}

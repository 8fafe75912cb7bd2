//! Storage collaborator
//!
//! The local, persistent view of domain entities. Stores write here when a
//! network result comes back and read here to answer lookups without a round
//! trip.

use crate::model::{Account, Site, SitePlan};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

pub trait StorageManager: Send + Sync {
    fn upsert_account(&self, account: &Account);
    fn load_account(&self, user_id: i64) -> Option<Account>;

    /// Replace the stored site list with `sites`
    fn replace_sites(&self, sites: &[Site]);
    fn upsert_site(&self, site: &Site);
    fn load_site(&self, site_id: i64) -> Option<Site>;
    /// All stored sites, ordered by id
    fn load_sites(&self) -> Vec<Site>;

    fn upsert_site_plan(&self, plan: &SitePlan);
    fn load_site_plan(&self, site_id: i64) -> Option<SitePlan>;

    /// Drop everything (sign-out)
    fn reset(&self);
}

#[derive(Default)]
struct Entities {
    accounts: HashMap<i64, Account>,
    sites: BTreeMap<i64, Site>,
    plans: HashMap<i64, SitePlan>,
}

/// Process-local storage
#[derive(Default)]
pub struct InMemoryStorage {
    entities: RwLock<Entities>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Entities) -> T) -> T {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        f(&entities)
    }

    fn write(&self, f: impl FnOnce(&mut Entities)) {
        let mut entities = self.entities.write().unwrap_or_else(|e| e.into_inner());
        f(&mut entities)
    }
}

impl StorageManager for InMemoryStorage {
    fn upsert_account(&self, account: &Account) {
        self.write(|e| {
            e.accounts.insert(account.user_id, account.clone());
        });
    }

    fn load_account(&self, user_id: i64) -> Option<Account> {
        self.read(|e| e.accounts.get(&user_id).cloned())
    }

    fn replace_sites(&self, sites: &[Site]) {
        self.write(|e| {
            e.sites = sites.iter().map(|s| (s.site_id, s.clone())).collect();
            // plans of sites that disappeared are stale
            let known = &e.sites;
            e.plans.retain(|site_id, _| known.contains_key(site_id));
        });
    }

    fn upsert_site(&self, site: &Site) {
        self.write(|e| {
            e.sites.insert(site.site_id, site.clone());
        });
    }

    fn load_site(&self, site_id: i64) -> Option<Site> {
        self.read(|e| e.sites.get(&site_id).cloned())
    }

    fn load_sites(&self) -> Vec<Site> {
        self.read(|e| e.sites.values().cloned().collect())
    }

    fn upsert_site_plan(&self, plan: &SitePlan) {
        self.write(|e| {
            e.plans.insert(plan.site_id, plan.clone());
        });
    }

    fn load_site_plan(&self, site_id: i64) -> Option<SitePlan> {
        self.read(|e| e.plans.get(&site_id).cloned())
    }

    fn reset(&self) {
        self.write(|e| *e = Entities::default());
    }
}

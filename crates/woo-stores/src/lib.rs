//! Domain stores built on `woo-dispatch`
//!
//! - `AccountStore` handles [`AccountAction`]s and announces [`AccountEvent`]s
//! - `SiteStore` handles [`SiteAction`]s and announces [`SiteEvent`]s
//! - `StoresManager` owns the stores while a user is signed in
//!
//! Stores talk to the outside world through two injected collaborators:
//! [`Network`] (async requests returning JSON) and [`StorageManager`]
//! (the local view of domain entities). In-memory implementations of both
//! back the tests and the console's offline mode.

pub mod account;
pub mod context;
pub mod error;
pub mod model;
pub mod network;
pub mod site;
pub mod storage;
pub mod stores_manager;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{AccountAction, AccountEvent, AccountStore};
pub use context::{Completion, StoreContext};
pub use error::NetworkError;
pub use model::{Account, Credentials, Site, SitePlan};
pub use network::{InMemoryNetwork, Method, Network, Request};
pub use site::{SiteAction, SiteEvent, SiteStore};
pub use storage::{InMemoryStorage, StorageManager};
pub use stores_manager::{SessionEvent, StoresManager};

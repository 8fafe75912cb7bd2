//! Fixtures shared by the store tests

use crate::context::StoreContext;
use crate::model::{Account, Credentials, Site};
use crate::network::{InMemoryNetwork, Method};
use crate::storage::InMemoryStorage;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use woo_dispatch::Dispatcher;

pub const TOKEN: &str = "token-123";

pub fn account(user_id: i64, username: &str) -> Account {
    Account {
        user_id,
        username: username.to_string(),
        email: format!("{}@example.org", username),
        display_name: username.to_string(),
    }
}

pub fn site(site_id: i64, name: &str) -> Site {
    Site {
        site_id,
        name: name.to_string(),
        url: format!("https://{}.example.org", name.to_lowercase()),
        is_woocommerce_active: true,
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("merchant", TOKEN, "https://shop.example.org")
}

/// Network answering the account, site list, single site and plan endpoints
pub fn api() -> InMemoryNetwork {
    InMemoryNetwork::new()
        .with_response(
            Method::Get,
            "me",
            json!({ "ID": 7, "username": "merchant", "email": "merchant@example.org", "display_name": "Merchant" }),
        )
        .with_response(
            Method::Get,
            "me/sites",
            json!({ "sites": [
                { "ID": 1, "name": "Shop", "URL": "https://shop.example.org", "is_woocommerce_active": true },
                { "ID": 2, "name": "Blog", "URL": "https://blog.example.org" }
            ]}),
        )
        .with_response(
            Method::Get,
            "sites/1",
            json!({ "ID": 1, "name": "Shop (renamed)", "URL": "https://shop.example.org", "is_woocommerce_active": true,
                    "plan": { "product_name_short": "Business" } }),
        )
        .require_token(TOKEN)
}

/// Everything a store needs, with handles kept for assertions
pub struct Harness {
    pub runtime: Runtime,
    pub dispatcher: Dispatcher,
    pub storage: Arc<InMemoryStorage>,
    pub network: Arc<InMemoryNetwork>,
}

impl Harness {
    pub fn new(network: InMemoryNetwork) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        Self {
            runtime,
            dispatcher: Dispatcher::new(),
            storage: Arc::new(InMemoryStorage::new()),
            network: Arc::new(network),
        }
    }

    pub fn context(&self) -> StoreContext {
        StoreContext::new(
            self.dispatcher.clone(),
            self.storage.clone(),
            self.network.clone(),
            self.runtime.handle().clone(),
        )
    }

    pub fn authenticated_context(&self) -> StoreContext {
        self.context().with_credentials(credentials())
    }

    /// Wait for one network completion to come back and dispatch it
    pub fn complete_one(&self) {
        assert!(
            self.dispatcher.process_next(Duration::from_secs(5)),
            "no completion arrived"
        );
    }
}

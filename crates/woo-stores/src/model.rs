//! Domain models exchanged with the API and kept in storage

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign-in credentials for one store address
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub auth_token: String,
    pub site_address: String,
}

impl Credentials {
    pub fn new(username: &str, auth_token: &str, site_address: &str) -> Self {
        Self {
            username: username.to_string(),
            auth_token: auth_token.to_string(),
            site_address: site_address.to_string(),
        }
    }
}

// Credentials travel inside actions, which get logged
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("auth_token", &"<redacted>")
            .field("site_address", &self.site_address)
            .finish()
    }
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "ID")]
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
}

/// A site the user can manage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "ID")]
    pub site_id: i64,
    pub name: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(default)]
    pub is_woocommerce_active: bool,
}

/// Envelope of the site list endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct SiteList {
    pub sites: Vec<Site>,
}

/// Subscription plan of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePlan {
    pub site_id: i64,
    pub short_name: String,
}

/// Payload of the site details endpoint, of which only the plan is used
#[derive(Debug, Deserialize)]
pub(crate) struct SiteDetails {
    pub plan: PlanDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanDetails {
    pub product_name_short: String,
}

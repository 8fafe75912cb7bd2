//! Canned API responses for offline mode

use anyhow::Result;
use woo_stores::InMemoryNetwork;

const DEMO_FIXTURES: &str = r#"{
  "GET me": {
    "ID": 1001,
    "username": "demo",
    "email": "demo@example.com",
    "display_name": "Demo Merchant"
  },
  "GET me/sites": {
    "sites": [
      { "ID": 1, "name": "Coffee Beans Co.", "URL": "https://coffee.example.com", "is_woocommerce_active": true },
      { "ID": 2, "name": "Tea Corner", "URL": "https://tea.example.com", "is_woocommerce_active": true },
      { "ID": 3, "name": "Personal Blog", "URL": "https://blog.example.com", "is_woocommerce_active": false }
    ]
  },
  "GET sites/1": {
    "ID": 1, "name": "Coffee Beans Co.", "URL": "https://coffee.example.com", "is_woocommerce_active": true,
    "plan": { "product_slug": "ecommerce-bundle", "product_name_short": "eCommerce" }
  },
  "GET sites/2": {
    "ID": 2, "name": "Tea Corner", "URL": "https://tea.example.com", "is_woocommerce_active": true,
    "plan": { "product_slug": "business-bundle", "product_name_short": "Business" }
  },
  "GET sites/3": {
    "ID": 3, "name": "Personal Blog", "URL": "https://blog.example.com", "is_woocommerce_active": false,
    "plan": { "product_slug": "free_plan", "product_name_short": "Free" }
  }
}"#;

/// Network answering from the built-in demo data
pub fn demo_network() -> Result<InMemoryNetwork> {
    InMemoryNetwork::from_fixture_str(DEMO_FIXTURES)
}

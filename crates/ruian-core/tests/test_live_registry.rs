//! Checks against the real RUIAN registry
//!
//! Run with: RUIAN_API_KEY=... cargo test --features integration --test test_live_registry

#![cfg(feature = "integration")]

use ruian_core::{AddressQuery, Diagnostics, HttpTransport, RegistryClient, WidgetConfig};
use std::sync::Arc;

fn live_client() -> RegistryClient {
    let config = WidgetConfig::load(None).expect("RUIAN_API_KEY must be set for live tests");
    let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout())
        .expect("Failed to build HTTP transport");
    RegistryClient::new(Arc::new(transport), config.api_key, Diagnostics::new())
}

#[tokio::test]
async fn test_validate_known_address() {
    let client = live_client();
    let query = AddressQuery {
        municipality_name: Some("Praha".into()),
        street: Some("Václavské náměstí".into()),
        cp: Some("812".into()),
        co: Some("59".into()),
        zip: None,
    };

    let response = client.validate(&query).await.expect("registry reachable");
    let place = response.matched_place().expect("address should match");
    assert_eq!(place.zip.as_deref(), Some("11000"));
}

#[tokio::test]
async fn test_region_listing() {
    let client = live_client();
    let praha = &ruian_types::REGIONS[0];

    let municipalities = client.municipalities(praha).await.expect("registry reachable");
    assert!(municipalities.iter().any(|m| m.name == "Praha"));
}

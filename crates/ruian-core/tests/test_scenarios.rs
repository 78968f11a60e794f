//! End-to-end widget scenarios against an in-memory registry

use async_trait::async_trait;
use ruian_core::{
    AddressEvents, AddressWidget, CachePort, Diagnostics, Endpoint, FileCache, MemoryCache,
    RegistryTransport, Result, RuianError, WidgetConfig,
};
use ruian_types::{ResolvedAddress, Suggestion, SuggestionList, Validity};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Registry serving Praha and Brno, with one known address
#[derive(Default)]
struct StubRegistry {
    calls: Mutex<Vec<Endpoint>>,
}

impl StubRegistry {
    fn count(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().unwrap().iter().filter(|e| **e == endpoint).count()
    }
}

#[async_trait]
impl RegistryTransport for StubRegistry {
    async fn get(&self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Value> {
        self.calls.lock().unwrap().push(endpoint);
        let params: HashMap<&str, &str> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        let body = match endpoint {
            Endpoint::Municipalities => match params.get("regionId").copied() {
                Some("19") => json!({"data": [{"municipalityId": "554782", "municipalityName": "Praha"}]}),
                Some("116") => json!({"data": [{"municipalityId": 582786, "municipalityName": "Brno"}]}),
                Some(_) => json!({"data": []}),
                None => {
                    return Err(RuianError::RegistryStatus {
                        endpoint: endpoint.to_string(),
                        status: 400,
                    })
                }
            },
            Endpoint::Streets => json!({"data": [
                {"streetName": "Václavské náměstí"},
                {"streetName": "Vodičkova"}
            ]}),
            Endpoint::Places => json!({"data": [{"placeCp": "812", "placeCo": 59, "placeZip": "11000"}]}),
            Endpoint::Validate => {
                if params.get("cp") == Some(&"812") && params.get("co") == Some(&"59") {
                    json!({
                        "status": "MATCH",
                        "place": {
                            "id": "21717672",
                            "municipalityId": "554782",
                            "municipalityName": "Praha",
                            "municipalityPartName": "Nové Město",
                            "streetName": "Václavské náměstí",
                            "cp": "812",
                            "co": "59",
                            "zip": "11000",
                            "regionId": "19"
                        }
                    })
                } else {
                    json!({"status": "NOT_FOUND"})
                }
            }
        };
        Ok(body)
    }
}

#[derive(Default)]
struct Host {
    results: Mutex<Vec<(Option<bool>, Option<Value>)>>,
    lists: Mutex<Vec<SuggestionList>>,
}

impl AddressEvents for Host {
    fn on_result(&self, validity: Validity, address: Option<&ResolvedAddress>) {
        self.results
            .lock()
            .unwrap()
            .push((validity.as_option(), address.map(ResolvedAddress::to_payload)));
    }

    fn on_suggestions(&self, suggestions: &SuggestionList) {
        self.lists.lock().unwrap().push(suggestions.clone());
    }
}

fn widget_with(registry: Arc<StubRegistry>, cache: Arc<dyn CachePort>, host: Arc<Host>) -> AddressWidget {
    AddressWidget::new(
        &WidgetConfig::with_api_key("secret"),
        registry,
        cache,
        host,
        Diagnostics::new(),
    )
}

#[tokio::test]
async fn test_progressive_flow() {
    let host = Arc::new(Host::default());
    let widget = widget_with(Arc::new(StubRegistry::default()), Arc::new(MemoryCache::new()), host.clone());

    let resolution = widget.resolve_now("Prah").await.unwrap();
    let praha = resolution
        .suggestions
        .items
        .iter()
        .find(|s| s.label() == "Praha")
        .cloned()
        .expect("Praha suggested");

    let selection = widget.select(&praha).await;
    assert_eq!(selection.input, "Praha, ");
    let streets: Vec<String> = selection
        .resolution
        .unwrap()
        .suggestions
        .items
        .iter()
        .map(|s| s.label().to_string())
        .collect();
    assert_eq!(streets, vec!["Václavské náměstí", "Vodičkova"]);
}

#[tokio::test]
async fn test_full_paste_valid() {
    let host = Arc::new(Host::default());
    let widget = widget_with(Arc::new(StubRegistry::default()), Arc::new(MemoryCache::new()), host.clone());

    let resolution = widget
        .resolve_now("Václavské náměstí 812/59, 110 00 Praha")
        .await
        .unwrap();
    assert!(resolution.suggestions.is_empty(), "no correction for canonical input");

    let results = host.results.lock().unwrap();
    assert_eq!(results.len(), 1);
    let (validity, payload) = &results[0];
    assert_eq!(*validity, Some(true));

    let place = &payload.as_ref().unwrap()["RUIANplace"];
    assert_eq!(place["valid"], json!(true));
    assert_eq!(place["cp"], json!("812"));
    assert_eq!(place["co"], json!("59"));
    assert_eq!(place["zip"], json!("11000"));
    assert_eq!(place["municipalityName"], json!("Praha"));
    assert_eq!(place["regionName"], json!("Hlavní město Praha"));
}

#[tokio::test]
async fn test_full_paste_needing_correction() {
    let host = Arc::new(Host::default());
    let widget = widget_with(Arc::new(StubRegistry::default()), Arc::new(MemoryCache::new()), host.clone());

    let resolution = widget.resolve_now("Praha, Václavské náměstí 812/59").await.unwrap();

    assert_eq!(host.results.lock().unwrap()[0].0, Some(true));
    assert_eq!(resolution.suggestions.len(), 1);
    assert_eq!(resolution.suggestions.highlighted, Some(0));
    match &resolution.suggestions.items[0] {
        Suggestion::Complete { label, .. } => {
            assert_eq!(label, "Václavské náměstí 812/59, 110 00 Praha")
        }
        other => panic!("expected a complete suggestion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_on_municipality_edit() {
    let host = Arc::new(Host::default());
    let widget = widget_with(Arc::new(StubRegistry::default()), Arc::new(MemoryCache::new()), host);

    widget.resolve_now("Praha, Vodičkova, ").await;
    assert_eq!(widget.context().municipality_name(), Some("Praha"));
    assert_eq!(widget.context().street_name(), Some("Vodičkova"));

    let resolution = widget.resolve_now("Brn").await.unwrap();
    assert!(widget.context().municipality().is_none());
    assert_eq!(resolution.suggestions.items[0].label(), "Brno");
}

#[tokio::test(start_paused = true)]
async fn test_debounced_input_resolves_once() {
    let registry = Arc::new(StubRegistry::default());
    let host = Arc::new(Host::default());
    let widget = widget_with(registry.clone(), Arc::new(MemoryCache::new()), host.clone());

    for value in ["P", "Pr", "Pra", "Prah"] {
        widget.input(value);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;

    let lists = host.lists.lock().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].items[0].label(), "Praha");
    assert_eq!(registry.count(Endpoint::Municipalities), ruian_types::REGIONS.len());
}

#[tokio::test]
async fn test_catalog_survives_restart_in_file_cache() {
    let dir = TempDir::new().unwrap();

    let first = Arc::new(StubRegistry::default());
    let cache: Arc<dyn CachePort> = Arc::new(FileCache::new(dir.path()).unwrap());
    widget_with(first.clone(), cache, Arc::new(Host::default()))
        .resolve_now("Brno")
        .await;
    assert_eq!(first.count(Endpoint::Municipalities), ruian_types::REGIONS.len());

    let second = Arc::new(StubRegistry::default());
    let cache: Arc<dyn CachePort> = Arc::new(FileCache::new(dir.path()).unwrap());
    let resolution = widget_with(second.clone(), cache, Arc::new(Host::default()))
        .resolve_now("Brno")
        .await
        .unwrap();
    assert_eq!(resolution.suggestions.items[0].label(), "Brno");
    assert_eq!(second.count(Endpoint::Municipalities), 0);
}

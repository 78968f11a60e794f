//! In-memory registry and fixtures for unit tests

use crate::clients::{Endpoint, RegistryTransport};
use crate::error::{Result, RuianError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

pub type Params = BTreeMap<String, String>;

type Handler = Box<dyn Fn(Endpoint, &Params) -> Option<Value> + Send + Sync>;
type DelayRule = Box<dyn Fn(Endpoint, &Params) -> Option<Duration> + Send + Sync>;

/// Registry fake: `None` from the handler simulates a transport failure
pub struct FakeRegistry {
    handler: Handler,
    delay: Option<DelayRule>,
    calls: Mutex<Vec<(Endpoint, Params)>>,
}

impl FakeRegistry {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Endpoint, &Params) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay<F>(mut self, rule: F) -> Self
    where
        F: Fn(Endpoint, &Params) -> Option<Duration> + Send + Sync + 'static,
    {
        self.delay = Some(Box::new(rule));
        self
    }

    pub fn calls(&self) -> Vec<(Endpoint, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count_of(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }
}

#[async_trait]
impl RegistryTransport for FakeRegistry {
    async fn get(&self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Value> {
        let params: Params = params.iter().cloned().collect();
        self.calls.lock().unwrap().push((endpoint, params.clone()));

        if let Some(delay) = self.delay.as_ref().and_then(|rule| rule(endpoint, &params)) {
            tokio::time::sleep(delay).await;
        }

        (self.handler)(endpoint, &params).ok_or(RuianError::RegistryStatus {
            endpoint: endpoint.path().to_string(),
            status: 503,
        })
    }
}

/// Catalog rows for `build/municipalities`, keyed by region code
pub fn municipalities_body(params: &Params, catalog: &[(u32, u64, &str)]) -> Value {
    let region: u32 = params
        .get("regionId")
        .and_then(|r| r.parse().ok())
        .unwrap_or_default();
    let rows: Vec<Value> = catalog
        .iter()
        .filter(|(r, _, _)| *r == region)
        .map(|(_, id, name)| json!({"municipalityId": id, "municipalityName": name}))
        .collect();
    json!({ "data": rows })
}

/// `validate` body for Václavské náměstí 812/59, 110 00 Praha
pub fn wenceslas_match() -> Value {
    json!({
        "status": "MATCH",
        "place": {
            "id": 21717672,
            "ruianId": 21717672,
            "municipalityId": 554782,
            "municipalityName": "Praha",
            "municipalityPartId": 490407,
            "municipalityPartName": "Nové Město",
            "streetName": "Václavské náměstí",
            "cp": 812,
            "co": "59",
            "zip": 11000,
            "regionId": 19,
            "regionName": "Hlavní město Praha"
        }
    })
}

//! HTTP transport for the registry
//!
//! `RegistryTransport` is the seam between the typed registry client and the
//! network, so tests can substitute an in-memory registry.

use crate::error::{Result, RuianError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Registry endpoints used by the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Validate,
    Municipalities,
    Streets,
    Places,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Validate => "validate",
            Endpoint::Municipalities => "build/municipalities",
            Endpoint::Streets => "build/streets",
            Endpoint::Places => "build/places",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Raw GET against the registry returning the decoded JSON body
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn get(&self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Value>;
}

pub struct HttpTransport {
    base_url: String,
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn get(&self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Value> {
        let response = self
            .http_client
            .get(self.url(endpoint))
            .query(params)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            return Err(RuianError::RegistryStatus {
                endpoint: endpoint.path().to_string(),
                status: response.status().as_u16(),
            });
        }

        let data: Value = response.json().await.map_err(|e| e.without_url())?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let transport =
            HttpTransport::new("https://ruian.fnx.io/api/v1/ruian/", Duration::from_secs(5)).unwrap();

        assert_eq!(
            transport.url(Endpoint::Validate),
            "https://ruian.fnx.io/api/v1/ruian/validate"
        );
        assert_eq!(
            transport.url(Endpoint::Places),
            "https://ruian.fnx.io/api/v1/ruian/build/places"
        );
        assert_eq!(Endpoint::Municipalities.to_string(), "build/municipalities");
    }
}

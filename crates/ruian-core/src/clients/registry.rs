//! Typed client for the RUIAN registry service
//!
//! Every registry call funnels through `RegistryClient::query`. Transport
//! failures and non-success statuses are logged and turned into "no data";
//! nothing here returns an error to the caller.

use super::transport::{Endpoint, RegistryTransport};
use crate::diagnostics::{mask_credential, Diagnostics};
use crate::constants::STATUS_MATCH;
use crate::error::RuianError;
use ruian_types::serde_helpers::{opt_string_from_any, u64_from_any};
use ruian_types::{HouseNumber, Municipality, MunicipalityId, Place, Region, Street};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Parameters of a full-address validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressQuery {
    pub municipality_name: Option<String>,
    pub street: Option<String>,
    pub zip: Option<String>,
    pub cp: Option<String>,
    pub co: Option<String>,
}

impl AddressQuery {
    fn to_params(&self) -> Vec<(String, String)> {
        [
            ("municipalityName", &self.municipality_name),
            ("street", &self.street),
            ("zip", &self.zip),
            ("cp", &self.cp),
            ("co", &self.co),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
    }
}

/// Place record inside a validation response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryPlace {
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub ruian_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub municipality_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub municipality_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub municipality_part_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub municipality_part_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub street_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub ce: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub cp: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub co: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub region_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub region_name: Option<String>,
}

/// Body of `validate`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationResponse {
    pub status: String,
    #[serde(default)]
    pub place: Option<RegistryPlace>,
}

impl ValidationResponse {
    /// The matched place, only when the status is `MATCH`
    pub fn matched_place(&self) -> Option<&RegistryPlace> {
        if self.status == STATUS_MATCH {
            self.place.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MunicipalityRow {
    #[serde(deserialize_with = "u64_from_any")]
    municipality_id: u64,
    municipality_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreetRow {
    #[serde(default)]
    street_name: Option<String>,
    #[serde(default)]
    street_less_part_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceRow {
    #[serde(default, deserialize_with = "opt_string_from_any")]
    place_cp: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    place_co: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    place_ce: Option<String>,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    place_zip: Option<String>,
}

pub struct RegistryClient {
    transport: Arc<dyn RegistryTransport>,
    api_key: RwLock<String>,
    diagnostics: Diagnostics,
}

impl RegistryClient {
    pub fn new(
        transport: Arc<dyn RegistryTransport>,
        api_key: impl Into<String>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            transport,
            api_key: RwLock::new(api_key.into()),
            diagnostics,
        }
    }

    /// Replace the credential used for subsequent calls
    pub fn set_api_key(&self, api_key: impl Into<String>) {
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = api_key.into();
    }

    pub fn has_credential(&self) -> bool {
        !self.current_key().trim().is_empty()
    }

    fn current_key(&self) -> String {
        self.api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Single choke point for registry access
    pub async fn query(&self, endpoint: Endpoint, params: Vec<(String, String)>) -> Option<Value> {
        let api_key = self.current_key();
        if api_key.trim().is_empty() {
            self.diagnostics
                .error(&format!("{}, skipping {}", RuianError::MissingCredential, endpoint));
            return None;
        }

        let mut full_params = Vec::with_capacity(params.len() + 1);
        full_params.push(("apiKey".to_string(), api_key.clone()));
        full_params.extend(params);

        let trace = full_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.diagnostics
            .debug(&mask_credential(&format!("GET {}?{}", endpoint, trace), &api_key));

        match self.transport.get(endpoint, &full_params).await {
            Ok(data) => Some(data),
            Err(e) => {
                self.diagnostics.warn(&mask_credential(
                    &format!("Registry request {} failed: {}", endpoint, e),
                    &api_key,
                ));
                None
            }
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, endpoint: Endpoint, data: Value) -> Option<T> {
        match serde_json::from_value(data) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                let error = RuianError::Deserialization(format!("unexpected {} response: {}", endpoint, e));
                self.diagnostics.warn(&error.to_string());
                None
            }
        }
    }

    /// Validate a full address
    pub async fn validate(&self, query: &AddressQuery) -> Option<ValidationResponse> {
        let data = self.query(Endpoint::Validate, query.to_params()).await?;
        let response: ValidationResponse = self.decode(Endpoint::Validate, data)?;

        log::debug!("Validation status: {}", response.status);
        Some(response)
    }

    /// List the municipalities of one region
    pub async fn municipalities(&self, region: &Region) -> Option<Vec<Municipality>> {
        let params = vec![("regionId".to_string(), region.id.to_string())];
        let data = self.query(Endpoint::Municipalities, params).await?;
        let rows: ListResponse<MunicipalityRow> = self.decode(Endpoint::Municipalities, data)?;

        Some(
            rows.data
                .into_iter()
                .map(|row| {
                    Municipality::new(MunicipalityId::new(row.municipality_id), row.municipality_name, region)
                })
                .collect(),
        )
    }

    /// List the streets of a municipality, in server order
    pub async fn streets(&self, municipality_id: MunicipalityId) -> Option<Vec<Street>> {
        let params = vec![("municipalityId".to_string(), municipality_id.to_string())];
        let data = self.query(Endpoint::Streets, params).await?;
        let rows: ListResponse<StreetRow> = self.decode(Endpoint::Streets, data)?;

        Some(
            rows.data
                .into_iter()
                .filter_map(|row| row.street_name.or(row.street_less_part_name))
                .filter(|name| !name.trim().is_empty())
                .map(|name| Street { name, municipality_id })
                .collect(),
        )
    }

    /// List the places of a municipality, optionally restricted to one street
    pub async fn places(
        &self,
        municipality_id: MunicipalityId,
        street_name: Option<&str>,
    ) -> Option<Vec<Place>> {
        let mut params = vec![("municipalityId".to_string(), municipality_id.to_string())];
        if let Some(street) = street_name {
            params.push(("streetName".to_string(), street.to_string()));
        }

        let data = self.query(Endpoint::Places, params).await?;
        let rows: ListResponse<PlaceRow> = self.decode(Endpoint::Places, data)?;

        Some(
            rows.data
                .into_iter()
                .filter_map(|row| {
                    let number = HouseNumber::from_parts(row.place_cp, row.place_co, row.place_ce)?;
                    Some(Place {
                        number,
                        zip: row.place_zip.unwrap_or_default(),
                        municipality_id,
                        street_name: street_name.map(str::to_string),
                    })
                })
                .collect(),
        )
    }
}

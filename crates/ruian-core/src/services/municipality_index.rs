//! Municipality catalog: loading, ranked search and same-name disambiguation
//!
//! The catalog is loaded once per session: memory first, then the persisted
//! cache (TTL checked), then the registry region by region. Concurrent callers
//! share a single in-flight load and all receive its result.

use crate::cache::{CachePort, CatalogEntry};
use crate::clients::{AddressQuery, RegistryClient};
use crate::constants::{
    CATALOG_CACHE_KEY, MIN_MUNICIPALITY_QUERY_CHARS, MUNICIPALITY_RESULT_CAP,
    NO_STREET_PLACEHOLDER, ZIP_PROBE_HOUSE_NUMBER,
};
use crate::diagnostics::Diagnostics;
use crate::services::reconciler::format_zip;
use chrono::Duration;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use ruian_types::{Municipality, MunicipalityId, Suggestion, REGIONS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type CatalogLoad = Shared<BoxFuture<'static, Arc<Vec<Municipality>>>>;

struct IndexInner {
    registry: Arc<RegistryClient>,
    cache: Arc<dyn CachePort>,
    retention: Duration,
    diagnostics: Diagnostics,
    loaded: RwLock<Option<Arc<Vec<Municipality>>>>,
    inflight: Mutex<Option<CatalogLoad>>,
    zips: Mutex<HashMap<MunicipalityId, String>>,
}

pub struct MunicipalityIndex {
    inner: Arc<IndexInner>,
}

/// How a search hit must be labeled to tell it apart from its namesakes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disambiguation {
    /// Another municipality of the same name exists in the same region
    pub needs_zip: bool,
    /// Another municipality of the same name exists anywhere
    pub needs_region: bool,
}

impl MunicipalityIndex {
    pub fn new(
        registry: Arc<RegistryClient>,
        cache: Arc<dyn CachePort>,
        retention: Duration,
        reset_cache: bool,
        diagnostics: Diagnostics,
    ) -> Self {
        if reset_cache {
            diagnostics.info("Dropping persisted municipality catalog on request");
            if let Err(e) = cache.remove(CATALOG_CACHE_KEY) {
                diagnostics.warn(&format!("Failed to drop municipality cache: {}", e));
            }
        }

        Self {
            inner: Arc::new(IndexInner {
                registry,
                cache,
                retention,
                diagnostics,
                loaded: RwLock::new(None),
                inflight: Mutex::new(None),
                zips: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Full catalog; empty when it could not be loaded
    pub async fn load_all(&self) -> Arc<Vec<Municipality>> {
        let load = {
            let mut inflight = self.inner.inflight.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(list) = self.inner.loaded() {
                return list;
            }

            match inflight.as_ref() {
                Some(existing) => {
                    log::debug!("Joining in-flight municipality catalog load");
                    existing.clone()
                }
                None => {
                    let load = IndexInner::load_catalog(self.inner.clone()).boxed().shared();
                    *inflight = Some(load.clone());
                    load
                }
            }
        };

        load.await
    }

    /// Ranked, disambiguated municipality suggestions for a typed fragment
    pub async fn search(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_MUNICIPALITY_QUERY_CHARS
            || query.starts_with(|c: char| c.is_ascii_digit())
        {
            return Vec::new();
        }

        let catalog = self.load_all().await;
        let ranked = rank_matches(&catalog, query);
        let flags = disambiguate(&ranked);

        let top: Vec<(&Municipality, Disambiguation)> = ranked
            .into_iter()
            .zip(flags)
            .take(MUNICIPALITY_RESULT_CAP)
            .collect();

        // All lookups finish before any label is built
        let zips = join_all(top.iter().map(|(municipality, flags)| async move {
            if flags.needs_zip {
                self.resolve_zip(municipality).await
            } else {
                None
            }
        }))
        .await;

        top.into_iter()
            .zip(zips)
            .map(|((municipality, flags), zip)| {
                let label = municipality_label(municipality, flags, zip.as_deref());
                Suggestion::Municipality {
                    id: municipality.id,
                    name: municipality.name.clone(),
                    zip,
                    region_name: municipality.region_name.clone(),
                    label,
                }
            })
            .collect()
    }

    /// ZIP of a municipality via three fallback tiers; cached per municipality
    pub async fn resolve_zip(&self, municipality: &Municipality) -> Option<String> {
        if let Some(zip) = self.inner.cached_zip(municipality.id) {
            return Some(zip);
        }

        let zip = if let Some(zip) = self.zip_from_house_number(municipality).await {
            Some(zip)
        } else if let Some(zip) = self.zip_from_streetless_places(municipality).await {
            Some(zip)
        } else {
            self.zip_from_first_street(municipality).await
        };

        match &zip {
            Some(zip) => {
                self.inner
                    .zips
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(municipality.id, zip.clone());
            }
            None => self.inner.diagnostics.debug(&format!(
                "No ZIP known for {} ({})",
                municipality.name, municipality.id
            )),
        }
        zip
    }

    /// Tier 1: validate house number 1 directly in the municipality
    async fn zip_from_house_number(&self, municipality: &Municipality) -> Option<String> {
        let query = AddressQuery {
            municipality_name: Some(municipality.name.clone()),
            cp: Some(ZIP_PROBE_HOUSE_NUMBER.to_string()),
            ..AddressQuery::default()
        };
        let response = self.inner.registry.validate(&query).await?;
        let place = response.matched_place()?;

        // A namesake elsewhere may answer; only our own municipality counts
        if place.municipality_id.as_deref() != Some(municipality.id.to_string().as_str()) {
            return None;
        }
        place.zip.clone().filter(|z| !z.is_empty())
    }

    /// Tier 2: places filed under the "no street" placeholder
    async fn zip_from_streetless_places(&self, municipality: &Municipality) -> Option<String> {
        let places = self
            .inner
            .registry
            .places(municipality.id, Some(NO_STREET_PLACEHOLDER))
            .await?;
        places.into_iter().map(|p| p.zip).find(|z| !z.is_empty())
    }

    /// Tier 3: first place on the first street
    async fn zip_from_first_street(&self, municipality: &Municipality) -> Option<String> {
        let streets = self.inner.registry.streets(municipality.id).await?;
        let street = streets.into_iter().next()?;
        let places = self
            .inner
            .registry
            .places(municipality.id, Some(&street.name))
            .await?;
        places.into_iter().map(|p| p.zip).find(|z| !z.is_empty())
    }
}

impl IndexInner {
    fn loaded(&self) -> Option<Arc<Vec<Municipality>>> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cached_zip(&self, id: MunicipalityId) -> Option<String> {
        self.zips
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    async fn load_catalog(self: Arc<Self>) -> Arc<Vec<Municipality>> {
        let list = match self.read_persisted() {
            Some(list) => {
                self.diagnostics.info(&format!(
                    "Loaded {} municipalities from cache",
                    list.len()
                ));
                list
            }
            None => self.fetch_from_registry().await,
        };
        let list = Arc::new(list);

        {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            if !list.is_empty() {
                *self.loaded.write().unwrap_or_else(PoisonError::into_inner) = Some(list.clone());
            }
            *inflight = None;
        }

        list
    }

    fn read_persisted(&self) -> Option<Vec<Municipality>> {
        let raw = match self.cache.get(CATALOG_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.diagnostics
                    .warn(&format!("Municipality cache unavailable: {}", e));
                return None;
            }
        };

        let entry: CatalogEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.diagnostics
                    .warn(&format!("Municipality cache is corrupt, refetching: {}", e));
                return None;
            }
        };

        if !entry.is_fresh(self.retention) {
            self.diagnostics.info(&format!(
                "Municipality cache from {} has expired",
                entry.timestamp
            ));
            return None;
        }

        if entry.municipalities.is_empty() {
            return None;
        }
        Some(entry.municipalities)
    }

    async fn fetch_from_registry(&self) -> Vec<Municipality> {
        self.diagnostics
            .info("Fetching municipality catalog from the registry");

        let results = join_all(REGIONS.iter().map(|region| self.registry.municipalities(region))).await;

        let mut municipalities = Vec::new();
        for (region, result) in REGIONS.iter().zip(results) {
            match result {
                Some(list) => municipalities.extend(list),
                None => {
                    self.diagnostics.warn(&format!(
                        "Municipality catalog for {} could not be loaded",
                        region.name
                    ));
                    return Vec::new();
                }
            }
        }

        // A fresh catalog starts a fresh ZIP sub-cache
        self.zips.lock().unwrap_or_else(PoisonError::into_inner).clear();

        let entry = CatalogEntry::new(municipalities);
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = self.cache.put(CATALOG_CACHE_KEY, &json) {
                    self.diagnostics
                        .warn(&format!("Failed to persist municipality catalog: {}", e));
                }
            }
            Err(e) => self
                .diagnostics
                .warn(&format!("Failed to serialize municipality catalog: {}", e)),
        }

        self.diagnostics.info(&format!(
            "Fetched {} municipalities",
            entry.municipalities.len()
        ));
        entry.municipalities
    }
}

/// Case-insensitive substring matches ordered exact, prefix, shorter, alphabetical
pub fn rank_matches<'a>(catalog: &'a [Municipality], query: &str) -> Vec<&'a Municipality> {
    let query = query.trim().to_lowercase();

    let mut matches: Vec<(String, &Municipality)> = catalog
        .iter()
        .map(|m| (m.name.to_lowercase(), m))
        .filter(|(lower, _)| lower.contains(&query))
        .collect();

    matches.sort_by(|(a_lower, a), (b_lower, b)| {
        (a_lower != &query)
            .cmp(&(b_lower != &query))
            .then_with(|| (!a_lower.starts_with(&query)).cmp(&!b_lower.starts_with(&query)))
            .then_with(|| a_lower.chars().count().cmp(&b_lower.chars().count()))
            .then_with(|| a_lower.cmp(b_lower))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    matches.into_iter().map(|(_, m)| m).collect()
}

/// Flags for each entry of the full match set, in the same order
pub fn disambiguate(matches: &[&Municipality]) -> Vec<Disambiguation> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut by_name_region: HashMap<(String, u32), usize> = HashMap::new();

    for m in matches {
        let lower = m.name.to_lowercase();
        *by_name_region.entry((lower.clone(), m.region_id.value())).or_default() += 1;
        *by_name.entry(lower).or_default() += 1;
    }

    matches
        .iter()
        .map(|m| {
            let lower = m.name.to_lowercase();
            Disambiguation {
                needs_zip: by_name_region
                    .get(&(lower.clone(), m.region_id.value()))
                    .is_some_and(|n| *n > 1),
                needs_region: by_name.get(&lower).is_some_and(|n| *n > 1),
            }
        })
        .collect()
}

/// `Name, ZIP (Region)`, `Name (Region)` or just `Name`
pub fn municipality_label(municipality: &Municipality, flags: Disambiguation, zip: Option<&str>) -> String {
    match (flags.needs_zip, zip) {
        (true, Some(zip)) => format!(
            "{}, {} ({})",
            municipality.name,
            format_zip(zip),
            municipality.region_name
        ),
        _ if flags.needs_region => format!("{} ({})", municipality.name, municipality.region_name),
        _ => municipality.name.clone(),
    }
}

//! Resolution state machine
//!
//! One `AddressSession` per text field. Each call to `resolve` is a pass
//! tagged with a generation number; a pass that finishes after a newer one
//! started is dropped without notifying the host.

use super::events::AddressEvents;
use super::state::{next_query, AddressContext, NextQuery};
use crate::clients::RegistryClient;
use crate::constants::LIST_RESULT_CAP;
use crate::diagnostics::Diagnostics;
use crate::services::address_parser::{looks_like_full_address, validation_query, SegmentedInput};
use crate::services::reconciler::{format_zip, reconcile};
use crate::services::MunicipalityIndex;
use ruian_types::{MunicipalityId, ResolvedAddress, Suggestion, SuggestionList, Validity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a completed pass delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub validity: Validity,
    pub address: Option<ResolvedAddress>,
    pub suggestions: SuggestionList,
}

/// Outcome of picking a suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// New text field value
    pub input: String,
    /// The pass run on the new value; `None` when it was superseded
    pub resolution: Option<Resolution>,
}

pub struct AddressSession {
    registry: Arc<RegistryClient>,
    index: Arc<MunicipalityIndex>,
    events: Arc<dyn AddressEvents>,
    diagnostics: Diagnostics,
    context: Mutex<AddressContext>,
    generation: AtomicU64,
}

impl AddressSession {
    pub fn new(
        registry: Arc<RegistryClient>,
        index: Arc<MunicipalityIndex>,
        events: Arc<dyn AddressEvents>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            registry,
            index,
            events,
            diagnostics,
            context: Mutex::new(AddressContext::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the remembered context
    pub fn context(&self) -> AddressContext {
        self.lock_context().clone()
    }

    /// Forget municipality and street; the catalog stays loaded
    pub fn reset_context(&self) {
        self.lock_context().reset();
        self.next_generation();
        self.diagnostics.debug("Session context cleared");
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        self.registry.set_api_key(api_key);
    }

    /// Run one resolution pass for the current field value
    ///
    /// Returns `None` when a newer pass started before this one finished.
    pub async fn resolve(&self, value: &str) -> Option<Resolution> {
        let generation = self.next_generation();

        if value.trim().is_empty() {
            return self.finish(generation, Validity::Unknown, None, SuggestionList::empty(), false);
        }

        let input = SegmentedInput::parse(value);

        {
            let mut context = self.lock_context();
            if input.index() == 0 && context.diverges_from(input.first()) {
                self.diagnostics.debug(&format!(
                    "'{}' no longer matches {:?}, clearing context",
                    input.first(),
                    context.municipality_name()
                ));
                context.reset();
            }
        }

        self.promote_context(generation, &input).await;
        if !self.is_current(generation) {
            return None;
        }

        let mut invalid_sent = false;
        if looks_like_full_address(value) {
            let query = validation_query(value, &self.lock_context().hints());
            let response = self.registry.validate(&query).await;
            if !self.is_current(generation) {
                return None;
            }

            let matched = response
                .as_ref()
                .and_then(|r| r.matched_place())
                .and_then(|place| reconcile(value, place));

            match matched {
                Some(reconciliation) => {
                    self.diagnostics
                        .info(&format!("Address resolved: {}", reconciliation.canonical));
                    let suggestions = SuggestionList::new(reconciliation.correction.into_iter().collect());
                    return self.finish(
                        generation,
                        Validity::Valid,
                        Some(reconciliation.address),
                        suggestions,
                        false,
                    );
                }
                None => {
                    self.events.on_result(Validity::Invalid, None);
                    invalid_sent = true;
                }
            }
        }

        let items = self.incremental(&input).await;
        let validity = if invalid_sent {
            Validity::Invalid
        } else {
            Validity::Unknown
        };
        self.finish(generation, validity, None, SuggestionList::new(items), invalid_sent)
    }

    /// Apply a picked suggestion and re-run resolution on the rewritten text
    pub async fn select(&self, suggestion: &Suggestion) -> Selection {
        match suggestion {
            Suggestion::Complete { label, address } => {
                let generation = self.next_generation();
                self.lock_context().adopt_address(address);
                let resolution = self.finish(
                    generation,
                    Validity::Valid,
                    Some((**address).clone()),
                    SuggestionList::empty(),
                    false,
                );
                Selection {
                    input: label.clone(),
                    resolution,
                }
            }
            Suggestion::Municipality { id, name, zip, .. } => {
                self.lock_context()
                    .select_municipality(*id, name.clone(), zip.clone());
                self.rerun(format!("{}, ", name)).await
            }
            Suggestion::Street { name, .. } => {
                let input = {
                    let mut context = self.lock_context();
                    match context.municipality_name().map(str::to_string) {
                        Some(municipality) => {
                            context.select_street(name.clone());
                            format!("{}, {}, ", municipality, name)
                        }
                        None => format!("{}, ", name),
                    }
                };
                self.rerun(input).await
            }
            Suggestion::Place {
                street_name,
                number,
                zip,
                ..
            } => {
                let mut parts: Vec<String> = Vec::new();
                if let Some(municipality) = self.lock_context().municipality_name() {
                    parts.push(municipality.to_string());
                }
                if let Some(street) = street_name {
                    parts.push(street.clone());
                }
                parts.push(number.to_string());
                if !zip.is_empty() {
                    parts.push(format_zip(zip));
                }
                self.rerun(parts.join(", ")).await
            }
        }
    }

    async fn rerun(&self, input: String) -> Selection {
        let resolution = self.resolve(&input).await;
        Selection { input, resolution }
    }

    /// Silently adopt typed segments that name a known municipality or street
    async fn promote_context(&self, generation: u64, input: &SegmentedInput) {
        let has_municipality = self.lock_context().municipality().is_some();

        if !has_municipality && input.len() > 1 {
            let typed = input.first().to_lowercase();
            let hit = self
                .index
                .search(input.first())
                .await
                .into_iter()
                .find(|s| matches!(s, Suggestion::Municipality { .. }) && s.value().to_lowercase() == typed);

            if !self.is_current(generation) {
                return;
            }
            if let Some(Suggestion::Municipality { id, name, zip, .. }) = hit {
                self.diagnostics
                    .debug(&format!("Adopting typed municipality {} ({})", name, id));
                self.lock_context().select_municipality(id, name, zip);
            }
        }

        let (municipality_id, has_street) = {
            let context = self.lock_context();
            (context.municipality_id(), context.street_name().is_some())
        };

        if let (Some(municipality_id), false, Some(typed)) = (municipality_id, has_street, input.get(1)) {
            if input.len() <= 2 || typed.is_empty() {
                return;
            }

            let typed = typed.to_lowercase();
            let streets = self.registry.streets(municipality_id).await.unwrap_or_default();
            if !self.is_current(generation) {
                return;
            }
            if let Some(street) = streets.into_iter().find(|s| s.name.to_lowercase() == typed) {
                self.diagnostics
                    .debug(&format!("Adopting typed street {}", street.name));
                self.lock_context().select_street(street.name);
            }
        }
    }

    /// Exactly one lookup chosen by the dispatch table
    async fn incremental(&self, input: &SegmentedInput) -> Vec<Suggestion> {
        let next = next_query(&self.lock_context(), input.index(), input.current());
        log::debug!("Next lookup: {:?}", next);

        match next {
            NextQuery::Municipality { query } => {
                let hits = self.index.search(&query).await;
                let unresolved = self.lock_context().municipality().is_none();
                if hits.is_empty() && unresolved && input.index() > 0 {
                    self.index.search(input.first()).await
                } else {
                    hits
                }
            }
            NextQuery::Street { municipality_id, query } => {
                let streets = self.street_suggestions(municipality_id, &query).await;
                if streets.is_empty() && query.is_empty() {
                    self.place_suggestions(municipality_id, None, "").await
                } else {
                    streets
                }
            }
            NextQuery::Place {
                municipality_id,
                street_name,
                query,
            } => {
                self.place_suggestions(municipality_id, street_name.as_deref(), &query)
                    .await
            }
        }
    }

    async fn street_suggestions(&self, municipality_id: MunicipalityId, query: &str) -> Vec<Suggestion> {
        let query = query.to_lowercase();

        self.registry
            .streets(municipality_id)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|street| street.name.to_lowercase().contains(&query))
            .take(LIST_RESULT_CAP)
            .map(|street| Suggestion::Street {
                label: street.name.clone(),
                name: street.name,
            })
            .collect()
    }

    async fn place_suggestions(
        &self,
        municipality_id: MunicipalityId,
        street_name: Option<&str>,
        query: &str,
    ) -> Vec<Suggestion> {
        let query = query.to_lowercase();

        self.registry
            .places(municipality_id, street_name)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|place| {
                let label = if place.zip.is_empty() {
                    place.number.to_string()
                } else {
                    format!("{}, {}", place.number, format_zip(&place.zip))
                };
                (label, place)
            })
            .filter(|(label, _)| label.to_lowercase().starts_with(&query))
            .take(LIST_RESULT_CAP)
            .map(|(label, place)| Suggestion::Place {
                street_name: place.street_name,
                number: place.number,
                zip: place.zip,
                label,
            })
            .collect()
    }

    /// Deliver a pass to the host unless it has been superseded
    fn finish(
        &self,
        generation: u64,
        validity: Validity,
        address: Option<ResolvedAddress>,
        suggestions: SuggestionList,
        result_sent: bool,
    ) -> Option<Resolution> {
        if !self.is_current(generation) {
            log::debug!("Dropping stale resolution pass {}", generation);
            return None;
        }

        self.events.on_suggestions(&suggestions);
        if !result_sent {
            self.events.on_result(validity, address.as_ref());
        }

        Some(Resolution {
            validity,
            address,
            suggestions,
        })
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn lock_context(&self) -> MutexGuard<'_, AddressContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

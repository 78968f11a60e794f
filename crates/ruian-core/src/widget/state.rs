//! Session context and the query dispatch table
//!
//! No I/O here: given what the session knows and what the user is typing,
//! `next_query` decides which registry lookup runs next.

use crate::services::address_parser::{is_numeric_leading, ParseHints};
use ruian_types::{MunicipalityId, ResolvedAddress};

/// Progress of the disambiguation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Empty,
    HasMunicipality,
    HasStreet,
}

/// A municipality the user selected or typed exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMunicipality {
    pub id: MunicipalityId,
    pub name: String,
}

/// What the session remembers between keystrokes
///
/// A municipality name never exists without its id, and a street never
/// exists without a municipality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressContext {
    municipality: Option<SelectedMunicipality>,
    zip: Option<String>,
    street_name: Option<String>,
}

impl AddressContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ResolutionState {
        match (&self.municipality, &self.street_name) {
            (None, _) => ResolutionState::Empty,
            (Some(_), None) => ResolutionState::HasMunicipality,
            (Some(_), Some(_)) => ResolutionState::HasStreet,
        }
    }

    pub fn municipality(&self) -> Option<&SelectedMunicipality> {
        self.municipality.as_ref()
    }

    pub fn municipality_id(&self) -> Option<MunicipalityId> {
        self.municipality.as_ref().map(|m| m.id)
    }

    pub fn municipality_name(&self) -> Option<&str> {
        self.municipality.as_ref().map(|m| m.name.as_str())
    }

    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref()
    }

    pub fn street_name(&self) -> Option<&str> {
        self.street_name.as_deref()
    }

    /// Adopt a municipality; any remembered street belonged to the old one
    pub fn select_municipality(&mut self, id: MunicipalityId, name: impl Into<String>, zip: Option<String>) {
        self.municipality = Some(SelectedMunicipality { id, name: name.into() });
        self.zip = zip;
        self.street_name = None;
    }

    /// Adopt a street; ignored while no municipality is known
    pub fn select_street(&mut self, name: impl Into<String>) -> bool {
        if self.municipality.is_none() {
            return false;
        }
        self.street_name = Some(name.into());
        true
    }

    /// Take municipality, ZIP and street from a resolved address
    pub fn adopt_address(&mut self, address: &ResolvedAddress) {
        self.municipality = Some(SelectedMunicipality {
            id: address.municipality_id,
            name: address.municipality_name.clone(),
        });
        self.zip = Some(address.zip.clone()).filter(|z| !z.is_empty());
        self.street_name = address.street_name.clone();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when the leading text no longer starts like the remembered
    /// municipality, compared case-insensitively over the shorter length
    pub fn diverges_from(&self, leading: &str) -> bool {
        let Some(municipality) = &self.municipality else {
            return false;
        };

        let typed: Vec<char> = leading.trim().to_lowercase().chars().collect();
        let known: Vec<char> = municipality.name.to_lowercase().chars().collect();
        let shorter = typed.len().min(known.len());

        typed[..shorter] != known[..shorter]
    }

    pub fn hints(&self) -> ParseHints<'_> {
        ParseHints {
            municipality_name: self.municipality_name(),
            street_name: self.street_name(),
            zip: self.zip(),
        }
    }
}

/// The single lookup a resolution pass performs after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuery {
    Municipality {
        query: String,
    },
    Street {
        municipality_id: MunicipalityId,
        query: String,
    },
    Place {
        municipality_id: MunicipalityId,
        street_name: Option<String>,
        query: String,
    },
}

/// Map `(state, segment index, text shape)` to the next lookup
pub fn next_query(context: &AddressContext, segment_index: usize, text: &str) -> NextQuery {
    let query = text.trim().to_string();

    let municipality_id = match (context.state(), context.municipality_id()) {
        (ResolutionState::Empty, _) | (_, None) => return NextQuery::Municipality { query },
        (_, Some(id)) => id,
    };

    match segment_index {
        0 => NextQuery::Municipality { query },
        1 if !is_numeric_leading(&query) => NextQuery::Street { municipality_id, query },
        // A number where the street goes: the municipality has no streets
        1 => NextQuery::Place {
            municipality_id,
            street_name: None,
            query,
        },
        _ => NextQuery::Place {
            municipality_id,
            street_name: context.street_name.clone(),
            query,
        },
    }
}

//! Shared types for the RUIAN address widget
//!
//! Strongly typed municipality, street and house-number records as returned by
//! the registry, plus the suggestion and result types handed to the host.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod serde_helpers;

/// Strongly typed municipality code from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MunicipalityId(#[serde(deserialize_with = "serde_helpers::u64_from_any")] u64);

impl MunicipalityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed region (VÚSC) code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the 14 top-level Czech administrative regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub name: &'static str,
}

/// Static region table, in the order the catalog is fetched
pub const REGIONS: [Region; 14] = [
    Region { id: RegionId::new(19), name: "Hlavní město Praha" },
    Region { id: RegionId::new(27), name: "Středočeský kraj" },
    Region { id: RegionId::new(35), name: "Jihočeský kraj" },
    Region { id: RegionId::new(43), name: "Plzeňský kraj" },
    Region { id: RegionId::new(51), name: "Karlovarský kraj" },
    Region { id: RegionId::new(60), name: "Ústecký kraj" },
    Region { id: RegionId::new(78), name: "Liberecký kraj" },
    Region { id: RegionId::new(86), name: "Královéhradecký kraj" },
    Region { id: RegionId::new(94), name: "Pardubický kraj" },
    Region { id: RegionId::new(108), name: "Kraj Vysočina" },
    Region { id: RegionId::new(116), name: "Jihomoravský kraj" },
    Region { id: RegionId::new(124), name: "Olomoucký kraj" },
    Region { id: RegionId::new(132), name: "Zlínský kraj" },
    Region { id: RegionId::new(141), name: "Moravskoslezský kraj" },
];

impl Region {
    /// Look up a region by its code
    pub fn by_id(id: RegionId) -> Option<&'static Region> {
        REGIONS.iter().find(|r| r.id == id)
    }
}

/// Municipality record, immutable once fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Municipality {
    pub id: MunicipalityId,
    pub name: String,
    pub region_id: RegionId,
    pub region_name: String,
}

impl Municipality {
    pub fn new(id: MunicipalityId, name: impl Into<String>, region: &Region) -> Self {
        Self {
            id,
            name: name.into(),
            region_id: region.id,
            region_name: region.name.to_string(),
        }
    }
}

/// Street record, fetched per municipality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Street {
    pub name: String,
    pub municipality_id: MunicipalityId,
}

/// House number in one of the two Czech labeling modes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum HouseNumber {
    /// Descriptive number (cp) with optional orientation number (co)
    Descriptive { cp: String, co: Option<String> },
    /// Registration number (ce), used for recreational buildings
    Registration { ce: String },
}

impl HouseNumber {
    /// Build from the raw registry fields; `ce` wins when present
    pub fn from_parts(cp: Option<String>, co: Option<String>, ce: Option<String>) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        if let Some(ce) = non_empty(ce) {
            return Some(HouseNumber::Registration { ce });
        }
        non_empty(cp).map(|cp| HouseNumber::Descriptive { cp, co: non_empty(co) })
    }

    pub fn cp(&self) -> Option<&str> {
        match self {
            HouseNumber::Descriptive { cp, .. } => Some(cp),
            HouseNumber::Registration { .. } => None,
        }
    }

    pub fn co(&self) -> Option<&str> {
        match self {
            HouseNumber::Descriptive { co, .. } => co.as_deref(),
            HouseNumber::Registration { .. } => None,
        }
    }

    pub fn ce(&self) -> Option<&str> {
        match self {
            HouseNumber::Descriptive { .. } => None,
            HouseNumber::Registration { ce } => Some(ce),
        }
    }
}

impl fmt::Display for HouseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HouseNumber::Descriptive { cp, co: Some(co) } => write!(f, "{}/{}", cp, co),
            HouseNumber::Descriptive { cp, co: None } => write!(f, "{}", cp),
            HouseNumber::Registration { ce } => write!(f, "ev.{}", ce),
        }
    }
}

/// House-number record from the place listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub number: HouseNumber,
    pub zip: String,
    pub municipality_id: MunicipalityId,
    pub street_name: Option<String>,
}

/// Canonical address produced by a successful validation or selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub valid: bool,
    pub municipality_id: MunicipalityId,
    pub municipality_name: String,
    pub municipality_part_id: Option<String>,
    pub municipality_part_name: Option<String>,
    pub street_name: Option<String>,
    pub ce: Option<String>,
    pub cp: Option<String>,
    pub co: Option<String>,
    pub zip: String,
    pub id: String,
    pub ruian_id: String,
    pub region_id: Option<RegionId>,
    pub region_name: Option<String>,
    pub original_string: String,
}

impl ResolvedAddress {
    /// Payload shape delivered to the host's result notification
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "RUIANplace": self })
    }
}

/// Outcome of a resolution pass as seen by the host (`true|false|none`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validity {
    Valid,
    Invalid,
    Unknown,
}

impl Validity {
    pub fn as_option(&self) -> Option<bool> {
        match self {
            Validity::Valid => Some(true),
            Validity::Invalid => Some(false),
            Validity::Unknown => None,
        }
    }
}

/// Severity attached to diagnostic lines sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single entry in the suggestion list; each variant carries only its own fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Suggestion {
    Municipality {
        id: MunicipalityId,
        name: String,
        zip: Option<String>,
        region_name: String,
        label: String,
    },
    Street {
        name: String,
        label: String,
    },
    Place {
        street_name: Option<String>,
        number: HouseNumber,
        zip: String,
        label: String,
    },
    /// Canonical rewrite of a fully typed address that already matched
    Complete {
        label: String,
        address: Box<ResolvedAddress>,
    },
}

impl Suggestion {
    /// Text shown to the user
    pub fn label(&self) -> &str {
        match self {
            Suggestion::Municipality { label, .. }
            | Suggestion::Street { label, .. }
            | Suggestion::Place { label, .. }
            | Suggestion::Complete { label, .. } => label,
        }
    }

    /// The value matched against typed text during auto-promotion
    pub fn value(&self) -> &str {
        match self {
            Suggestion::Municipality { name, .. } | Suggestion::Street { name, .. } => name,
            Suggestion::Place { label, .. } | Suggestion::Complete { label, .. } => label,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Suggestion::Complete { .. })
    }
}

/// Ranked suggestions with the optionally auto-highlighted entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionList {
    pub items: Vec<Suggestion>,
    pub highlighted: Option<usize>,
}

impl SuggestionList {
    pub fn new(items: Vec<Suggestion>) -> Self {
        // A correction is always listed first and highlighted
        let highlighted = items.first().filter(|s| s.is_complete()).map(|_| 0);
        Self { items, highlighted }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&Suggestion> {
        self.items.get(index)
    }
}

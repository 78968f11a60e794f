//! Resolution constants shared by the widget components

/// Quiet period after the last keystroke before a resolution pass runs
pub const DEBOUNCE_MS: u64 = 400;

/// Municipality search results kept before ZIP enrichment
pub const MUNICIPALITY_RESULT_CAP: usize = 15;

/// Street and place suggestions kept, in server order
pub const LIST_RESULT_CAP: usize = 10;

/// Shortest query accepted by the municipality search
pub const MIN_MUNICIPALITY_QUERY_CHARS: usize = 2;

/// Inputs longer than this that contain a digit are validated as a whole
pub const FULL_ADDRESS_MIN_CHARS: usize = 5;

/// Key of the persisted municipality catalog
pub const CATALOG_CACHE_KEY: &str = "ruian_municipalities";

/// House number probed by the first ZIP-resolution tier
pub const ZIP_PROBE_HOUSE_NUMBER: &str = "1";

/// Street name the registry uses for places in municipalities without streets
pub const NO_STREET_PLACEHOLDER: &str = "bez ulice";

/// Registry status for a full address match
pub const STATUS_MATCH: &str = "MATCH";

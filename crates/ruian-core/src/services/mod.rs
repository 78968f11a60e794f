//! Service modules for address resolution

pub mod address_parser;
pub mod municipality_index;
pub mod reconciler;

// Re-export service types
pub use address_parser::{ParseHints, SegmentedInput};
pub use municipality_index::MunicipalityIndex;
pub use reconciler::{canonical_label, format_zip, Reconciliation};

//! RUIAN address widget core
//!
//! Progressive autocomplete (municipality, street, house number) and
//! full-address validation against the RUIAN registry, independent of any UI.

pub mod cache;
pub mod clients;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod services;
pub mod widget;

#[cfg(test)]
mod test_support;

pub use config::WidgetConfig;
pub use error::{Result, RuianError};

pub use cache::{CachePort, CatalogEntry, FileCache, MemoryCache};

pub use clients::{AddressQuery, Endpoint, HttpTransport, RegistryClient, RegistryTransport};

pub use diagnostics::{mask_credential, Diagnostics, LogHook};

pub use services::{canonical_label, format_zip, MunicipalityIndex};

pub use widget::{
    AddressContext, AddressEvents, AddressSession, AddressWidget, NoopEvents, Resolution,
    ResolutionState, Selection,
};

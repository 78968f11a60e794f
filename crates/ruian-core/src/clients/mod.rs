//! Client modules for the RUIAN registry service

pub mod registry;
pub mod transport;

// Re-export client types
pub use registry::{AddressQuery, RegistryClient, RegistryPlace, ValidationResponse};
pub use transport::{Endpoint, HttpTransport, RegistryTransport};

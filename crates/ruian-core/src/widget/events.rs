//! Notifications delivered to the host

use ruian_types::{ResolvedAddress, SuggestionList, Validity};

/// Host-side receiver for resolution outcomes
///
/// Every outcome reaches the host through here; nothing is returned as an
/// error.
pub trait AddressEvents: Send + Sync {
    /// Validity changed: `Valid` carries the resolved address
    fn on_result(&self, validity: Validity, address: Option<&ResolvedAddress>);

    /// A fresh suggestion list is ready; an empty list closes the dropdown
    fn on_suggestions(&self, _suggestions: &SuggestionList) {}
}

/// Host that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl AddressEvents for NoopEvents {
    fn on_result(&self, _validity: Validity, _address: Option<&ResolvedAddress>) {}
}

//! Address widget: session, debouncing and host notifications

pub mod debounce;
pub mod events;
pub mod session;
pub mod state;

pub use debounce::Debouncer;
pub use events::{AddressEvents, NoopEvents};
pub use session::{AddressSession, Resolution, Selection};
pub use state::{next_query, AddressContext, NextQuery, ResolutionState};

use crate::cache::CachePort;
use crate::clients::{HttpTransport, RegistryClient, RegistryTransport};
use crate::config::WidgetConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::services::MunicipalityIndex;
use ruian_types::Suggestion;
use std::sync::Arc;

/// One text field's worth of address resolution
///
/// `input` must be called from within a tokio runtime.
pub struct AddressWidget {
    session: Arc<AddressSession>,
    debouncer: Debouncer,
}

impl AddressWidget {
    pub fn new(
        config: &WidgetConfig,
        transport: Arc<dyn RegistryTransport>,
        cache: Arc<dyn CachePort>,
        events: Arc<dyn AddressEvents>,
        diagnostics: Diagnostics,
    ) -> Self {
        let registry = Arc::new(RegistryClient::new(
            transport,
            config.api_key.clone(),
            diagnostics.clone(),
        ));
        let index = Arc::new(MunicipalityIndex::new(
            registry.clone(),
            cache,
            config.cache_retention(),
            config.reset_cache,
            diagnostics.clone(),
        ));

        log::info!("Address widget ready (registry: {})", config.base_url);

        Self {
            session: Arc::new(AddressSession::new(registry, index, events, diagnostics)),
            debouncer: Debouncer::new(config.debounce()),
        }
    }

    /// Widget talking to the configured registry over HTTP
    pub fn with_http(
        config: &WidgetConfig,
        cache: Arc<dyn CachePort>,
        events: Arc<dyn AddressEvents>,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout())?;
        Ok(Self::new(config, Arc::new(transport), cache, events, diagnostics))
    }

    /// Keystroke: resolve `value` once the field has been quiet long enough
    pub fn input(&self, value: impl Into<String>) {
        let session = self.session.clone();
        let value = value.into();
        self.debouncer.schedule(async move {
            session.resolve(&value).await;
        });
    }

    /// Resolve immediately, dropping any pending keystroke
    pub async fn resolve_now(&self, value: &str) -> Option<Resolution> {
        self.debouncer.cancel();
        self.session.resolve(value).await
    }

    pub async fn select(&self, suggestion: &Suggestion) -> Selection {
        self.debouncer.cancel();
        self.session.select(suggestion).await
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        self.session.set_api_key(api_key);
    }

    pub fn reset_context(&self) {
        self.debouncer.cancel();
        self.session.reset_context();
    }

    pub fn context(&self) -> AddressContext {
        self.session.context()
    }

    pub fn session(&self) -> &Arc<AddressSession> {
        &self.session
    }
}

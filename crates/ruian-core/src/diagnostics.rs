//! Diagnostic lines for the host
//!
//! Every line is written to the `log` facade and, when the host registered a
//! hook, forwarded to it with a `Severity`.

use ruian_types::Severity;
use std::fmt;
use std::sync::Arc;

/// Host callback receiving `(message, severity)`
pub type LogHook = Arc<dyn Fn(&str, Severity) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Diagnostics {
    hook: Option<LogHook>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: LogHook) -> Self {
        Self { hook: Some(hook) }
    }

    pub fn emit(&self, severity: Severity, message: &str) {
        let level = match severity {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        };
        log::log!(level, "{}", message);

        if let Some(hook) = &self.hook {
            hook(message, severity);
        }
    }

    pub fn debug(&self, message: &str) {
        self.emit(Severity::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Severity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Severity::Error, message);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Replace every occurrence of the credential with `***`, both raw and as it
/// appears inside an encoded query string
pub fn mask_credential(text: &str, credential: &str) -> String {
    if credential.is_empty() {
        return text.to_string();
    }

    let masked = text.replace(credential, "***");
    match query_encoded(credential) {
        Some(encoded) if encoded != credential => masked.replace(&encoded, "***"),
        _ => masked,
    }
}

fn query_encoded(value: &str) -> Option<String> {
    let mut url = reqwest::Url::parse("http://localhost/").ok()?;
    url.query_pairs_mut().append_pair("k", value);
    url.query()
        .and_then(|q| q.strip_prefix("k="))
        .map(str::to_string)
}

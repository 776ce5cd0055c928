use std::sync::{Arc, RwLock};

/// Shared process locale, sent to other services as `App-Locale`.
///
/// Read on every outbound call, written rarely (administrative switch).
#[derive(Clone, Debug)]
pub struct AppLocale(Arc<RwLock<String>>);

impl AppLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(locale.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, locale: impl Into<String>) {
        let mut l = self.0.write().unwrap_or_else(|e| e.into_inner());
        *l = locale.into();
    }
}

impl Default for AppLocale {
    fn default() -> Self {
        Self::new("en")
    }
}

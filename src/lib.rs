pub mod access_key;
pub mod client;
pub mod config;
mod error;
pub mod locale;
pub mod security;
pub mod server;

pub use error::{GateError, GateResult};

use std::sync::Arc;
use std::time::Duration;

use access_key::AccessKeyMinter;
use client::ServiceClient;
use config::GateConfig;
use locale::AppLocale;

/// Outbound side wired from configuration: a minter sharing the process key
/// and a client factory carrying the process locale.
#[derive(Clone)]
pub struct Outbound {
    pub minter: Arc<AccessKeyMinter>,
    pub locale: AppLocale,
    timeout: Duration,
}

impl Outbound {
    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        let cipher = config.cipher_profile.build(&config.app_key)?;
        Ok(Self {
            minter: Arc::new(AccessKeyMinter::new(cipher, config.app_key.clone())),
            locale: AppLocale::new(config.locale.clone()),
            timeout: config.service_timeout,
        })
    }

    /// Client for one downstream service. `async_uris` are dispatched
    /// without waiting for a response.
    pub fn client(&self, base_uri: &str, async_uris: Vec<String>) -> GateResult<ServiceClient> {
        ServiceClient::new(
            base_uri,
            async_uris,
            self.minter.clone(),
            self.locale.clone(),
            self.timeout,
        )
    }
}

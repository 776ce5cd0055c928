use std::sync::Arc;

use chrono::Utc;

use crate::error::{GateError, GateResult};
use crate::security::TokenCipher;

/// Mints Access-Key tokens: `<secret>@<unix seconds>`, encrypted.
#[derive(Clone)]
pub struct AccessKeyMinter {
    cipher: Arc<dyn TokenCipher>,
    secret: String,
}

impl AccessKeyMinter {
    pub fn new(cipher: Arc<dyn TokenCipher>, secret: impl Into<String>) -> Self {
        Self {
            cipher,
            secret: secret.into(),
        }
    }

    /// Mint a token stamped with the current time.
    pub fn mint(&self) -> GateResult<String> {
        self.mint_at(Utc::now().timestamp())
    }

    pub fn mint_at(&self, now: i64) -> GateResult<String> {
        let payload = format!("{}@{}", self.secret, now);
        self.cipher
            .encode(&payload)
            .map_err(|e| GateError::Mint(e.to_string()))
    }
}

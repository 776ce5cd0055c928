use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::security::TokenCipher;

/// The check a token failed at. Kept for logs only; every rejection looks
/// the same from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    HeaderCheck,
    Decrypt,
    Parse,
    TimeCheck,
}

impl Stage {
    pub fn reason(self) -> &'static str {
        match self {
            Stage::HeaderCheck => "missing credential",
            Stage::Decrypt | Stage::Parse => "invalid credential",
            Stage::TimeCheck => "expired or skewed credential",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::HeaderCheck => "header_check",
            Stage::Decrypt => "decrypt",
            Stage::Parse => "parse",
            Stage::TimeCheck => "time_check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit { issued_at: i64 },
    Reject(Stage),
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

/// Checks inbound Access-Key tokens.
///
/// Runs header check, decrypt, parse and time check in order and stops at
/// the first failure. No retries: a token that fails once fails every time.
#[derive(Clone)]
pub struct AccessKeyValidator {
    cipher: Arc<dyn TokenCipher>,
    secret: String,
    window_secs: u64,
}

impl AccessKeyValidator {
    pub fn new(cipher: Arc<dyn TokenCipher>, secret: impl Into<String>, window_secs: u64) -> Self {
        Self {
            cipher,
            secret: secret.into(),
            window_secs,
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn validate(&self, token: Option<&str>) -> Decision {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: Option<&str>, now: i64) -> Decision {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Decision::Reject(Stage::HeaderCheck),
        };

        let payload = match self.cipher.decode(token) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("Access-Key decrypt failed: {}", e);
                return Decision::Reject(Stage::Decrypt);
            }
        };

        let mut parts = payload.split('@');
        let (secret, timestamp) = match (parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(t), None) => (s, t),
            _ => return Decision::Reject(Stage::Parse),
        };

        if !bool::from(secret.as_bytes().ct_eq(self.secret.as_bytes())) {
            return Decision::Reject(Stage::Parse);
        }

        let issued_at: i64 = match timestamp.parse() {
            Ok(ts) => ts,
            Err(_) => return Decision::Reject(Stage::TimeCheck),
        };

        if issued_at > now {
            return Decision::Reject(Stage::TimeCheck);
        }
        match now.checked_sub(issued_at) {
            Some(age) if (age as u64) <= self.window_secs => Decision::Admit { issued_at },
            _ => Decision::Reject(Stage::TimeCheck),
        }
    }
}

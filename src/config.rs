use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::access_key::frontend::FrontendPolicy;
use crate::error::{GateError, GateResult};
use crate::security::CipherProfile;

/// Fallback key for local development only.
pub const DEFAULT_APP_KEY: &str = "v9N+xLCNqMhbBWv1YNFLDpFDR9S1e62gHHfdIwYQHYs=";
pub const DEFAULT_EXPIRE_SECS: u64 = 9999;
pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(30);

const SUPPORTED_HASH: &str = "sha256";
const SUPPORTED_CIPHER: &str = "aes-256-cbc";

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct GateConfig {
    pub app_key: String,
    pub cipher_profile: CipherProfile,
    pub locale: String,
    pub expire_secs: u64,
    pub addr: SocketAddr,
    pub service_timeout: Duration,
    pub frontend: FrontendPolicy,
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("app_key", &"<redacted>")
            .field("cipher_profile", &self.cipher_profile)
            .field("locale", &self.locale)
            .field("expire_secs", &self.expire_secs)
            .field("addr", &self.addr)
            .field("service_timeout", &self.service_timeout)
            .field("frontend", &self.frontend)
            .finish()
    }
}

impl GateConfig {
    pub fn from_env() -> GateResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> GateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let hash = get("APP_HASH").unwrap_or_else(|| SUPPORTED_HASH.to_string());
        if !hash.trim().eq_ignore_ascii_case(SUPPORTED_HASH) {
            return Err(GateError::Config(format!("unsupported APP_HASH {:?}", hash)));
        }

        let cipher = get("APP_CIPHER").unwrap_or_else(|| SUPPORTED_CIPHER.to_string());
        if !cipher.trim().eq_ignore_ascii_case(SUPPORTED_CIPHER) {
            return Err(GateError::Config(format!("unsupported APP_CIPHER {:?}", cipher)));
        }

        let cipher_profile = match get("APP_CIPHER_PROFILE") {
            Some(v) => v.parse::<CipherProfile>()?,
            None => CipherProfile::default(),
        };

        let expire_secs = match get("ACCESS_KEY_EXPIRE") {
            Some(v) => parse_number(&v, "ACCESS_KEY_EXPIRE")?,
            None => DEFAULT_EXPIRE_SECS,
        };

        let service_timeout = match get("SERVICE_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number(&v, "SERVICE_TIMEOUT_SECS")?),
            None => DEFAULT_SERVICE_TIMEOUT,
        };

        let addr = get("APP_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8084".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| GateError::Config(format!("invalid APP_ADDR: {}", e)))?;

        let frontend = FrontendPolicy {
            enabled: parse_flag(get("FRONTEND_BYPASS_ENABLED"), "FRONTEND_BYPASS_ENABLED")?,
            allowed_origins: parse_list(get("FRONTEND_ALLOWED_ORIGINS")),
            allowed_referers: parse_list(get("FRONTEND_ALLOWED_REFERERS")),
            require_origin: parse_flag(get("FRONTEND_REQUIRE_ORIGIN"), "FRONTEND_REQUIRE_ORIGIN")?,
            trust_browser_agent: parse_flag(
                get("FRONTEND_TRUST_BROWSER_AGENT"),
                "FRONTEND_TRUST_BROWSER_AGENT",
            )?,
            header_name: get("FRONTEND_HEADER_NAME").map(|v| v.trim().to_string()),
            header_value: get("FRONTEND_HEADER_VALUE"),
        };

        Ok(Self {
            app_key: get("APP_KEY").unwrap_or_else(|| DEFAULT_APP_KEY.to_string()),
            cipher_profile,
            locale: get("APP_LOCALE").unwrap_or_else(|| "en".to_string()),
            expire_secs,
            addr,
            service_timeout,
            frontend,
        })
    }
}

/// Load `.env` into the process environment without overriding variables
/// that are already set. A missing file is not an error.
pub fn load_dotenv() -> GateResult<Option<PathBuf>> {
    dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(result: Result<PathBuf, dotenvy::Error>) -> GateResult<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(GateError::Config(format!("failed to read .env: {}", e))),
    }
}

fn parse_number(value: &str, key: &str) -> GateResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| GateError::Config(format!("{} must be a non-negative integer, got {:?}", key, value)))
}

fn parse_flag(value: Option<String>, key: &str) -> GateResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GateError::Config(format!("{} must be a boolean, got {:?}", key, value))),
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

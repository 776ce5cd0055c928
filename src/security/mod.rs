//! Symmetric token ciphers.
//!
//! Two profiles share one AES-256-CBC core:
//!
//! - [`FrameworkCipher`] mirrors the encrypt routine of the PHP framework the
//!   other services run on: serialized string payload, key and IV taken from
//!   the ASCII hex digest of the configured key, double base64. Access-Key
//!   tokens use this profile.
//! - [`JsonCipher`] encrypts arbitrary JSON values under a base64 key and
//!   an IV hashed from the decoded key bytes.
//!
//! Both sit behind [`TokenCipher`] so callers pick one from configuration.

pub mod framework;
pub mod json;
pub mod padding;
pub mod serialize;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aes::Aes256;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::{GateError, GateResult};

pub use framework::FrameworkCipher;
pub use json::JsonCipher;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// A reversible string-to-token transform.
pub trait TokenCipher: Send + Sync {
    fn profile(&self) -> CipherProfile;

    /// Encrypt `plaintext` into a wire token.
    fn encode(&self, plaintext: &str) -> GateResult<String>;

    /// Recover the plaintext from a wire token.
    fn decode(&self, token: &str) -> GateResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherProfile {
    /// Framework-compatible profile (default for Access-Key tokens).
    #[default]
    Framework,
    /// Generic JSON profile.
    Json,
}

impl CipherProfile {
    /// Build the cipher for this profile. Fails fast on unusable key material.
    pub fn build(self, key: &str) -> GateResult<Arc<dyn TokenCipher>> {
        Ok(match self {
            CipherProfile::Framework => Arc::new(FrameworkCipher::new(key)),
            CipherProfile::Json => Arc::new(JsonCipher::new(key)?),
        })
    }
}

impl FromStr for CipherProfile {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "framework" | "laravel" => Ok(CipherProfile::Framework),
            "json" => Ok(CipherProfile::Json),
            other => Err(GateError::Config(format!("unknown cipher profile {:?}", other))),
        }
    }
}

impl fmt::Display for CipherProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherProfile::Framework => f.write_str("framework"),
            CipherProfile::Json => f.write_str("json"),
        }
    }
}

/// CBC-encrypt input that is already block aligned.
fn cbc_encrypt(key: &[u8], iv: &[u8], padded: &[u8]) -> GateResult<Vec<u8>> {
    let enc = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| GateError::Key(format!("failed to create cipher: {}", e)))?;
    Ok(enc.encrypt_padded_vec_mut::<NoPadding>(padded))
}

/// CBC-decrypt without touching padding. Caller checks block alignment.
fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> GateResult<Vec<u8>> {
    let dec = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| GateError::Key(format!("failed to create cipher: {}", e)))?;
    dec.decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|e| GateError::Decrypt(format!("cipher failure: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_KEY: &str = "base64:v9N+xLCNqMhbBWv1YNFLDpFDR9S1e62gHHfdIwYQHYs=";

    #[test]
    fn profile_parses_case_insensitively() {
        assert_eq!("Framework".parse::<CipherProfile>().unwrap(), CipherProfile::Framework);
        assert_eq!(" json ".parse::<CipherProfile>().unwrap(), CipherProfile::Json);
        assert!(matches!("rot13".parse::<CipherProfile>(), Err(GateError::Config(_))));
    }

    #[test]
    fn each_profile_round_trips_through_the_trait() {
        for (profile, key) in [
            (CipherProfile::Framework, "s3cr3t"),
            (CipherProfile::Json, JSON_KEY),
        ] {
            let cipher = profile.build(key).unwrap();
            assert_eq!(cipher.profile(), profile);
            let token = cipher.encode("s3cr3t@1700000000").unwrap();
            assert_eq!(cipher.decode(&token).unwrap(), "s3cr3t@1700000000");
        }
    }

    #[test]
    fn json_profile_refuses_short_key_at_build_time() {
        assert!(matches!(
            CipherProfile::Json.build("c2hvcnQ="),
            Err(GateError::Key(_))
        ));
    }

    #[test]
    fn profiles_are_not_interchangeable() {
        let framework = CipherProfile::Framework.build(JSON_KEY).unwrap();
        let json = CipherProfile::Json.build(JSON_KEY).unwrap();
        let token = json.encode("payload").unwrap();
        assert_ne!(framework.decode(&token).ok().as_deref(), Some("payload"));
    }
}

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::padding::{pkcs7_pad, pkcs7_unpad, BLOCK_SIZE};
use super::serialize::{deserialize, serialize, STRING_MARKER};
use super::{cbc_decrypt, cbc_encrypt, CipherProfile, TokenCipher};
use crate::error::{GateError, GateResult};

/// Cipher byte-compatible with the framework's own `encrypt()` as used by
/// the other services for Access-Key tokens.
///
/// The cipher key is the first 32 ASCII characters of the SHA-256 hex digest
/// of the configured key, and the IV is the first 16 characters of the same
/// digest. The hex text itself is the key material, not the decoded bytes.
#[derive(Clone)]
pub struct FrameworkCipher {
    key_hex: String,
}

impl FrameworkCipher {
    pub fn new(key: &str) -> Self {
        Self {
            key_hex: hash_key(key),
        }
    }

    fn key_bytes(&self) -> &[u8] {
        &self.key_hex.as_bytes()[..32]
    }

    fn iv_bytes(&self) -> &[u8] {
        &self.key_hex.as_bytes()[..BLOCK_SIZE]
    }

    pub fn encrypt(&self, value: &str) -> GateResult<String> {
        let serialized = serialize(value);
        let padded = pkcs7_pad(serialized.as_bytes(), BLOCK_SIZE);
        let encrypted = cbc_encrypt(self.key_bytes(), self.iv_bytes(), &padded)?;

        let inner = STANDARD.encode(encrypted);
        Ok(STANDARD.encode(inner))
    }

    /// Decrypt a token.
    ///
    /// Bad padding and malformed serialization are tolerated: the raw
    /// decrypted text is returned instead, with a warning logged.
    pub fn decrypt(&self, value: &str) -> GateResult<String> {
        let outer = STANDARD
            .decode(value)
            .map_err(|e| GateError::Decrypt(format!("failed to decode base64 (outer): {}", e)))?;
        let ciphertext = STANDARD
            .decode(&outer)
            .map_err(|e| GateError::Decrypt(format!("failed to decode base64 (inner): {}", e)))?;

        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(GateError::Padding(
                "ciphertext is not a multiple of block size".into(),
            ));
        }

        let decrypted = cbc_decrypt(self.key_bytes(), self.iv_bytes(), &ciphertext)?;

        let unpadded = match pkcs7_unpad(&decrypted) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Access-Key unpadding failed ({}), continuing with raw bytes", e);
                decrypted.as_slice()
            }
        };

        // Invalid UTF-8 in a garbled padding tail is replaced, not rejected.
        let text = String::from_utf8_lossy(unpadded);

        if !text.starts_with(STRING_MARKER) {
            return Ok(text.into_owned());
        }

        match deserialize(&text) {
            Ok(content) => Ok(content),
            Err(e) => {
                log::warn!("Access-Key unserialize failed ({}), returning raw value", e);
                Ok(text.into_owned())
            }
        }
    }
}

impl TokenCipher for FrameworkCipher {
    fn profile(&self) -> CipherProfile {
        CipherProfile::Framework
    }

    fn encode(&self, plaintext: &str) -> GateResult<String> {
        self.encrypt(plaintext)
    }

    fn decode(&self, token: &str) -> GateResult<String> {
        self.decrypt(token)
    }
}

/// Lowercase SHA-256 hex digest of the raw key string.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

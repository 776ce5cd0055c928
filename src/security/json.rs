use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::padding::{pkcs7_pad, BLOCK_SIZE};
use super::{cbc_decrypt, cbc_encrypt, CipherProfile, TokenCipher};
use crate::error::{GateError, GateResult};

const KEY_PREFIX: &str = "base64:";
const KEY_LEN: usize = 32;

/// Generic profile: JSON payloads under a raw 32-byte key.
///
/// The IV is the first block of SHA-256 over the decoded key, so it is fixed
/// per key.
#[derive(Clone)]
pub struct JsonCipher {
    key: [u8; KEY_LEN],
    iv: [u8; BLOCK_SIZE],
}

impl std::fmt::Debug for JsonCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCipher").finish_non_exhaustive()
    }
}

impl JsonCipher {
    /// Accepts the key with or without a `base64:` prefix.
    pub fn new(key: &str) -> GateResult<Self> {
        let encoded = key.strip_prefix(KEY_PREFIX).unwrap_or(key);
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| GateError::Key(format!("error decoding key: {}", e)))?;

        let key: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            GateError::Key(format!(
                "invalid key length, expected {} bytes, got {} bytes",
                KEY_LEN,
                decoded.len()
            ))
        })?;

        let digest = Sha256::digest(key);
        let mut iv = [0u8; BLOCK_SIZE];
        iv.copy_from_slice(&digest[..BLOCK_SIZE]);

        Ok(Self { key, iv })
    }

    pub fn encrypt<T: Serialize + ?Sized>(&self, value: &T) -> GateResult<String> {
        let json = serde_json::to_vec(value)?;
        let padded = pkcs7_pad(&json, BLOCK_SIZE);
        let encrypted = cbc_encrypt(&self.key, &self.iv, &padded)?;
        Ok(STANDARD.encode(encrypted))
    }

    pub fn decrypt<T: DeserializeOwned>(&self, value: &str) -> GateResult<T> {
        let data = STANDARD
            .decode(value)
            .map_err(|e| GateError::Decrypt(format!("invalid base64: {}", e)))?;

        if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
            return Err(GateError::Decrypt(
                "ciphertext is not a positive multiple of block size".into(),
            ));
        }

        let mut decrypted = cbc_decrypt(&self.key, &self.iv, &data)?;

        // Single trailing count byte, then any NUL fill older writers left.
        let padding = decrypted[decrypted.len() - 1] as usize;
        if padding > decrypted.len() {
            return Err(GateError::Decrypt("padding count exceeds data".into()));
        }
        decrypted.truncate(decrypted.len() - padding);
        while decrypted.last() == Some(&0) {
            decrypted.pop();
        }

        serde_json::from_slice(&decrypted)
            .map_err(|e| GateError::Decrypt(format!("invalid JSON payload: {}", e)))
    }
}

impl TokenCipher for JsonCipher {
    fn profile(&self) -> CipherProfile {
        CipherProfile::Json
    }

    fn encode(&self, plaintext: &str) -> GateResult<String> {
        self.encrypt(plaintext)
    }

    fn decode(&self, token: &str) -> GateResult<String> {
        match self.decrypt::<serde_json::Value>(token)? {
            serde_json::Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

//! Password-sealed envelopes using Argon2id + AES-256-GCM
//!
//! An [`Envelope`] is the only place this crate turns a human password into
//! ciphertext. Every call to [`Envelope::seal`] draws a fresh salt and IV, so
//! two envelopes of the same payload under the same password share nothing.
//!
//! Serialized form (all binary fields are standard base64):
//!
//! ```json
//! { "salt": "...", "iv": "...", "authTag": "...", "encrypted": "..." }
//! ```

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::kdf::{KdfError, KdfParams, SALT_SIZE};

/// Size of the AES-GCM IV in bytes
pub const IV_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur while sealing or opening an envelope
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Wrong password, or the ciphertext / tag were modified.
    ///
    /// The two cases are deliberately indistinguishable.
    #[error("authentication failed: wrong password or corrupted data")]
    Auth,
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error(transparent)]
    Kdf(#[from] KdfError),
    #[error("failed to gather randomness: {0}")]
    Rng(getrandom::Error),
}

/// A password-sealed, tamper-evident container for one secret payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(with = "b64")]
    pub salt: Vec<u8>,
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    #[serde(rename = "authTag", with = "b64")]
    pub auth_tag: Vec<u8>,
    #[serde(with = "b64")]
    pub encrypted: Vec<u8>,
    /// Work factor used to derive the key. Older files omit it.
    #[serde(default)]
    pub kdf: KdfParams,
}

impl Envelope {
    /// Seal `plaintext` so that only holders of `password` can read it.
    pub fn seal(
        password: &str,
        plaintext: &[u8],
        params: &KdfParams,
    ) -> Result<Self, EnvelopeError> {
        let mut salt = vec![0u8; SALT_SIZE];
        getrandom::getrandom(&mut salt).map_err(EnvelopeError::Rng)?;
        let mut iv = vec![0u8; IV_SIZE];
        getrandom::getrandom(&mut iv).map_err(EnvelopeError::Rng)?;

        let key = params.derive(password.as_bytes(), &salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|_| EnvelopeError::Malformed("derived key has wrong length".into()))?;

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| EnvelopeError::Malformed("plaintext too large to seal".into()))?;

        Ok(Self {
            salt,
            iv,
            auth_tag: tag.to_vec(),
            encrypted: buffer,
            kdf: *params,
        })
    }

    /// Open the envelope with `password`.
    ///
    /// Never returns partial plaintext: either the tag verifies and the whole
    /// payload comes back, or the call fails.
    pub fn open(&self, password: &str) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        if self.salt.len() < 8 {
            return Err(EnvelopeError::Malformed(format!(
                "salt too short, got {} bytes",
                self.salt.len()
            )));
        }
        if self.iv.len() != IV_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "invalid iv size, expected {}, got {}",
                IV_SIZE,
                self.iv.len()
            )));
        }
        if self.auth_tag.len() != TAG_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "invalid auth tag size, expected {}, got {}",
                TAG_SIZE,
                self.auth_tag.len()
            )));
        }

        let key = self.kdf.derive(password.as_bytes(), &self.salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|_| EnvelopeError::Malformed("derived key has wrong length".into()))?;

        let mut buffer = Zeroizing::new(self.encrypted.clone());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&self.iv),
                b"",
                &mut *buffer,
                Tag::from_slice(&self.auth_tag),
            )
            .map_err(|_| EnvelopeError::Auth)?;

        Ok(buffer)
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string_pretty(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }
}

/// Serde adapter encoding byte vectors as standard base64 strings
pub(crate) mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

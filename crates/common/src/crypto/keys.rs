use std::ops::Deref;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Size of Ed25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of Ed25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410)
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const PUBLIC_KEY_PEM_TAG: &str = "PUBLIC KEY";

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("failed to generate key material: {0}")]
    Rng(getrandom::Error),
}

/// Public half of the approval signing keypair
///
/// Stored in cleartext next to the sealed private key so anyone can check an
/// approval signature without the password. The on-disk form is an SPKI PEM
/// (`-----BEGIN PUBLIC KEY-----`), the same thing `openssl pkey -pubout`
/// prints for an Ed25519 key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl Deref for PublicKey {
    type Target = VerifyingKey;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        PublicKey(key)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid public key size, expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        let key = VerifyingKey::from_bytes(&buff)
            .map_err(|_| anyhow::anyhow!("public key is not a valid edwards point"))?;
        Ok(PublicKey(key))
    }
}

impl PublicKey {
    /// Parse a public key from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|_| anyhow::anyhow!("public key hex decode error"))?;
        Self::try_from(bytes.as_slice())
    }

    /// Convert public key to raw bytes
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Convert public key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Short, stable identifier for display: hex SHA-256 of the key bytes
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_bytes()))
    }

    /// Encode as an SPKI PEM block
    pub fn to_pem(&self) -> String {
        let mut der = Vec::with_capacity(ED25519_SPKI_PREFIX.len() + PUBLIC_KEY_SIZE);
        der.extend_from_slice(&ED25519_SPKI_PREFIX);
        der.extend_from_slice(&self.to_bytes());
        pem::encode(&pem::Pem::new(PUBLIC_KEY_PEM_TAG, der))
    }

    /// Parse an SPKI PEM block
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PUBLIC KEY"
    /// - The DER body is not an Ed25519 SubjectPublicKeyInfo
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        if pem.tag() != PUBLIC_KEY_PEM_TAG {
            return Err(anyhow::anyhow!("invalid PEM tag, expected PUBLIC KEY").into());
        }

        let der = pem.contents();
        let raw = der
            .strip_prefix(ED25519_SPKI_PREFIX.as_slice())
            .ok_or_else(|| anyhow::anyhow!("public key is not an Ed25519 SPKI structure"))?;
        Self::try_from(raw)
    }

    /// Verify an Ed25519 signature on a message.
    pub fn verify(
        &self,
        msg: &[u8],
        signature: &ed25519_dalek::Signature,
    ) -> Result<(), ed25519_dalek::SignatureError> {
        self.0.verify_strict(msg, signature)
    }
}

/// Private half of the approval signing keypair
///
/// Only ever exists in memory between unlocking the vault and finishing a
/// signature. The underlying `SigningKey` wipes itself on drop.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&"<redacted>").finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&secret))
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid private key size, expected {}, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        buff.copy_from_slice(bytes);
        Ok(Self::from(*buff))
    }
}

impl SecretKey {
    /// Generate a new random secret key using the OS RNG
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        getrandom::getrandom(&mut bytes[..]).map_err(KeyError::Rng)?;
        Ok(Self::from(*bytes))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Raw seed bytes, wiped when the returned buffer drops
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        Zeroizing::new(self.0.to_bytes())
    }

    /// Sign a message with this secret key using Ed25519.
    pub fn sign(&self, msg: &[u8]) -> ed25519_dalek::Signature {
        self.0.sign(msg)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let private_key = SecretKey::generate().unwrap();
        let public_key = private_key.public();

        let recovered_private = SecretKey::try_from(private_key.to_bytes().as_slice()).unwrap();
        assert_eq!(*private_key.to_bytes(), *recovered_private.to_bytes());

        let recovered_public = PublicKey::from_hex(&public_key.to_hex()).unwrap();
        assert_eq!(public_key, recovered_public);
    }

    #[test]
    fn test_pem_serialization() {
        let public_key = SecretKey::generate().unwrap().public();

        let pem = public_key.to_pem();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(PublicKey::from_pem(&pem).unwrap(), public_key);
    }

    #[test]
    fn test_pem_rejects_wrong_tag() {
        let pem = pem::encode(&pem::Pem::new("PRIVATE KEY", vec![0u8; 44]));
        assert!(PublicKey::from_pem(&pem).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let secret_key = SecretKey::generate().unwrap();
        let public_key = secret_key.public();
        let message = b"hello, world!";

        let signature = secret_key.sign(message);
        assert!(public_key.verify(message, &signature).is_ok());

        assert!(public_key.verify(b"hello, world?", &signature).is_err());

        let other_key = SecretKey::generate().unwrap().public();
        assert!(other_key.verify(message, &signature).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secret_key = SecretKey::generate().unwrap();
        let debug = format!("{:?}", secret_key);
        assert!(!debug.contains(&hex::encode(*secret_key.to_bytes())));
    }
}

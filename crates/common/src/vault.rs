//! # Key Vault
//!
//! Holds the one Ed25519 keypair a workspace uses to sign approvals.
//!
//! The key file is a JSON object:
//!
//! ```json
//! {
//!   "salt": "...", "iv": "...", "authTag": "...", "encrypted": "...",
//!   "publicKey": "-----BEGIN PUBLIC KEY-----\n...",
//!   "createdAt": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! The private key seed only ever appears inside the sealed envelope. The
//! public key is cleartext so that verification needs no password.
//!
//! Approval gating is opt-in: a workspace without a key file is unprotected,
//! and [`KeyVault::is_enabled`] is how callers find out. The vault never
//! generates a key on its own, since a new key orphans every signature made
//! with the old one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{Envelope, EnvelopeError, KdfParams, KeyError, PublicKey, SecretKey};
use crate::fs::{atomic_create, atomic_write, Access};

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("no signing key at {0}. Run 'postgate key init' first")]
    NotInitialized(PathBuf),

    #[error("a signing key already exists at {0}; refusing to overwrite it")]
    AlreadyInitialized(PathBuf),

    #[error("wrong password for signing key, or the key file is damaged")]
    Auth,

    #[error("signing key file is corrupted: {0}")]
    Corrupted(String),

    #[error("key generation failed: {0}")]
    Key(#[from] KeyError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<EnvelopeError> for VaultError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::Auth => VaultError::Auth,
            EnvelopeError::Rng(e) => VaultError::Key(KeyError::Rng(e)),
            other => VaultError::Corrupted(other.to_string()),
        }
    }
}

/// On-disk form of the signing key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyFile {
    #[serde(flatten)]
    envelope: Envelope,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

/// Handle on a workspace's signing key file
#[derive(Debug, Clone)]
pub struct KeyVault {
    path: PathBuf,
    kdf: KdfParams,
}

impl KeyVault {
    pub fn new(path: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self {
            path: path.into(),
            kdf,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether approval gating applies to this workspace at all
    pub fn is_enabled(&self) -> bool {
        self.path.is_file()
    }

    /// Generate the workspace keypair and seal it under `password`.
    ///
    /// Fails with [`VaultError::AlreadyInitialized`] if a key file exists.
    pub fn initialize(&self, password: &str) -> Result<PublicKey, VaultError> {
        if self.path.exists() {
            return Err(VaultError::AlreadyInitialized(self.path.clone()));
        }

        let secret = SecretKey::generate()?;
        let public = secret.public();
        let envelope = Envelope::seal(password, secret.to_bytes().as_slice(), &self.kdf)?;

        let file = KeyFile {
            envelope,
            public_key: public.to_pem(),
            created_at: Some(Utc::now()),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| VaultError::Corrupted(e.to_string()))?;

        atomic_create(&self.path, &json, Access::OwnerOnly).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                VaultError::AlreadyInitialized(self.path.clone())
            } else {
                VaultError::Io(e)
            }
        })?;

        tracing::info!(
            path = %self.path.display(),
            fingerprint = %public.fingerprint(),
            "initialized signing key"
        );
        Ok(public)
    }

    fn read(&self) -> Result<Option<KeyFile>, VaultError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file = serde_json::from_str(&raw).map_err(|e| VaultError::Corrupted(e.to_string()))?;
        Ok(Some(file))
    }

    fn read_required(&self) -> Result<KeyFile, VaultError> {
        self.read()?
            .ok_or_else(|| VaultError::NotInitialized(self.path.clone()))
    }

    /// Read the key file for opening with a password.
    ///
    /// A damaged file fails the same way a wrong password does.
    fn read_sealed(&self) -> Result<KeyFile, VaultError> {
        match self.read_required() {
            Err(VaultError::Corrupted(reason)) => {
                tracing::warn!(path = %self.path.display(), "unreadable signing key file: {}", reason);
                Err(VaultError::Auth)
            }
            other => other,
        }
    }

    /// Cheap, password-free read of the public key
    pub fn load_public_key(&self) -> Result<Option<PublicKey>, VaultError> {
        match self.read()? {
            Some(file) => PublicKey::from_pem(&file.public_key)
                .map(Some)
                .map_err(|e| VaultError::Corrupted(e.to_string())),
            None => Ok(None),
        }
    }

    /// When the key was generated, if the file records it
    pub fn created_at(&self) -> Result<Option<DateTime<Utc>>, VaultError> {
        Ok(self.read()?.and_then(|f| f.created_at))
    }

    /// Open the sealed private key.
    ///
    /// The unlocked key must match the stored public key; a mismatch means
    /// one half of the file was swapped and is reported as corruption.
    pub fn unlock(&self, password: &str) -> Result<SecretKey, VaultError> {
        let file = self.read_sealed()?;
        Self::open(&file, password)
    }

    fn open(file: &KeyFile, password: &str) -> Result<SecretKey, VaultError> {
        let seed = file.envelope.open(password).map_err(|e| {
            if !matches!(e, EnvelopeError::Auth) {
                tracing::warn!("cannot open signing key envelope: {}", e);
            }
            VaultError::Auth
        })?;
        let secret = SecretKey::try_from(seed.as_slice())
            .map_err(|e| VaultError::Corrupted(e.to_string()))?;

        let stored = PublicKey::from_pem(&file.public_key)
            .map_err(|e| VaultError::Corrupted(e.to_string()))?;
        if stored != secret.public() {
            return Err(VaultError::Corrupted(
                "sealed private key does not match stored public key".into(),
            ));
        }
        Ok(secret)
    }

    /// Re-seal the existing private key under a new password.
    ///
    /// The keypair itself is unchanged, so existing signatures stay valid.
    pub fn rotate_password(&self, old: &str, new: &str) -> Result<(), VaultError> {
        let mut file = self.read_sealed()?;
        let secret = Self::open(&file, old)?;

        file.envelope = Envelope::seal(new, secret.to_bytes().as_slice(), &self.kdf)?;
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| VaultError::Corrupted(e.to_string()))?;
        atomic_write(&self.path, &json, Access::OwnerOnly)?;

        tracing::info!(path = %self.path.display(), "re-sealed signing key under new password");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn vault(dir: &TempDir) -> KeyVault {
        let kdf = KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        KeyVault::new(dir.path().join(".postgate").join("signing-key.json"), kdf)
    }

    #[test]
    fn test_disabled_until_initialized() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        assert!(!vault.is_enabled());
        assert!(vault.load_public_key().unwrap().is_none());
        assert!(matches!(
            vault.unlock("pw"),
            Err(VaultError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_initialize_and_unlock() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let public = vault.initialize("correctpw").unwrap();
        assert!(vault.is_enabled());
        assert_eq!(vault.load_public_key().unwrap(), Some(public));

        let secret = vault.unlock("correctpw").unwrap();
        assert_eq!(secret.public(), public);
    }

    #[test]
    fn test_initialize_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        let first = vault.initialize("pw").unwrap();
        assert!(matches!(
            vault.initialize("pw"),
            Err(VaultError::AlreadyInitialized(_))
        ));
        assert_eq!(vault.load_public_key().unwrap(), Some(first));
    }

    #[test]
    fn test_wrong_password_is_auth() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.initialize("correctpw").unwrap();

        for wrong in ["wrongpw", "", "x"] {
            assert!(matches!(vault.unlock(wrong), Err(VaultError::Auth)));
        }
    }

    #[test]
    fn test_key_file_shape() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.initialize("pw").unwrap();

        let raw = fs::read_to_string(vault.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for field in ["salt", "iv", "authTag", "encrypted", "publicKey"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert!(!raw.contains("PRIVATE KEY"));
    }

    #[test]
    fn test_swapped_public_key_is_corruption() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.initialize("pw").unwrap();

        let raw = fs::read_to_string(vault.path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let other = SecretKey::generate().unwrap().public().to_pem();
        value["publicKey"] = serde_json::Value::String(other);
        fs::write(vault.path(), serde_json::to_string(&value).unwrap()).unwrap();

        assert!(matches!(vault.unlock("pw"), Err(VaultError::Corrupted(_))));
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        fs::create_dir_all(vault.path().parent().unwrap()).unwrap();
        fs::write(vault.path(), "not json").unwrap();

        assert!(vault.is_enabled());
        assert!(matches!(vault.unlock("pw"), Err(VaultError::Auth)));
        assert!(matches!(
            vault.load_public_key(),
            Err(VaultError::Corrupted(_))
        ));
    }

    fn rewrite(vault: &KeyVault, edit: impl FnOnce(&mut serde_json::Value)) {
        let raw = fs::read_to_string(vault.path()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        edit(&mut value);
        fs::write(vault.path(), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_inflated_kdf_is_auth() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.initialize("correctpw").unwrap();
        rewrite(&vault, |v| {
            v["kdf"] = serde_json::json!({"memoryKib": 8, "iterations": 20_000_000, "parallelism": 1})
        });

        let started = std::time::Instant::now();
        assert!(matches!(vault.unlock("wrongpw"), Err(VaultError::Auth)));
        assert!(matches!(vault.unlock("correctpw"), Err(VaultError::Auth)));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_truncated_envelope_is_auth() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        let public = vault.initialize("correctpw").unwrap();
        rewrite(&vault, |v| v["iv"] = "AAAA".into());

        assert!(matches!(vault.unlock("correctpw"), Err(VaultError::Auth)));
        // verification needs no envelope
        assert_eq!(vault.load_public_key().unwrap(), Some(public));

        rewrite(&vault, |v| {
            v.as_object_mut().unwrap().remove("encrypted");
        });
        assert!(matches!(vault.unlock("correctpw"), Err(VaultError::Auth)));
    }

    #[test]
    fn test_rotate_password_keeps_keypair() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        let public = vault.initialize("old").unwrap();

        assert!(matches!(
            vault.rotate_password("nope", "new"),
            Err(VaultError::Auth)
        ));
        vault.rotate_password("old", "new").unwrap();

        assert!(matches!(vault.unlock("old"), Err(VaultError::Auth)));
        assert_eq!(vault.unlock("new").unwrap().public(), public);
    }
}

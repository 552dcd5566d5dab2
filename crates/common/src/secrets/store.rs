use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::archive::{pack_dir, unpack_dir, ArchiveError};
use crate::crypto::{b64, Envelope, EnvelopeError, KdfParams};
use crate::fs::{atomic_write, Access};

const CREDENTIALS_SUFFIX: &str = ".credentials.json";
const PROFILE_SUFFIX: &str = ".profile.json";

#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    #[error("no stored secret for {0}")]
    NotFound(SecretId),

    #[error("wrong password or corrupted secret")]
    Auth,

    #[error("{0} is stored in cleartext (insecure mode); refusing to read it in sealed mode")]
    InsecureRecord(SecretId),

    #[error("a password is required to seal or open secrets")]
    PasswordRequired,

    #[error("secret record for {0} is malformed: {1}")]
    Corrupted(SecretId, String),

    #[error("invalid platform name '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidName(String),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// How the store writes new records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretMode {
    /// Every record is a password-sealed envelope.
    #[default]
    Sealed,
    /// Records are written in cleartext and labeled `"insecure": true`.
    ///
    /// Opt-in only. Anyone who can read the secrets directory can read the
    /// credentials.
    Insecure,
}

impl fmt::Display for SecretMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretMode::Sealed => write!(f, "sealed"),
            SecretMode::Insecure => write!(f, "insecure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecretKind {
    /// JSON credentials for a posting adapter
    Credentials,
    /// A packed directory, e.g. a browser profile
    Profile,
}

/// Address of one secret record: a platform plus what is stored for it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretId {
    platform: String,
    kind: SecretKind,
}

impl SecretId {
    pub fn credentials(platform: &str) -> Result<Self, SecretStoreError> {
        Self::new(platform, SecretKind::Credentials)
    }

    pub fn profile(platform: &str) -> Result<Self, SecretStoreError> {
        Self::new(platform, SecretKind::Profile)
    }

    fn new(platform: &str, kind: SecretKind) -> Result<Self, SecretStoreError> {
        let valid = !platform.is_empty()
            && platform
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(SecretStoreError::InvalidName(platform.to_string()));
        }
        Ok(Self {
            platform: platform.to_string(),
            kind,
        })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn kind(&self) -> SecretKind {
        self.kind
    }

    fn file_name(&self) -> String {
        match self.kind {
            SecretKind::Credentials => format!("{}{}", self.platform, CREDENTIALS_SUFFIX),
            SecretKind::Profile => format!("{}{}", self.platform, PROFILE_SUFFIX),
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        if let Some(platform) = name.strip_suffix(CREDENTIALS_SUFFIX) {
            return Self::credentials(platform).ok();
        }
        if let Some(platform) = name.strip_suffix(PROFILE_SUFFIX) {
            return Self::profile(platform).ok();
        }
        None
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SecretKind::Credentials => write!(f, "{} credentials", self.platform),
            SecretKind::Profile => write!(f, "{} profile", self.platform),
        }
    }
}

impl FromStr for SecretId {
    type Err = SecretStoreError;

    /// Parses `platform` (credentials) or `platform:profile`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((platform, "profile")) => Self::profile(platform),
            Some((platform, "credentials")) => Self::credentials(platform),
            Some(_) => Err(SecretStoreError::InvalidName(s.to_string())),
            None => Self::credentials(s),
        }
    }
}

/// Sealed packed-directory record: same envelope, payload under `data`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArchiveRecord {
    #[serde(with = "b64")]
    salt: Vec<u8>,
    #[serde(with = "b64")]
    iv: Vec<u8>,
    #[serde(rename = "authTag", with = "b64")]
    auth_tag: Vec<u8>,
    #[serde(with = "b64")]
    data: Vec<u8>,
    #[serde(default)]
    kdf: KdfParams,
}

impl From<Envelope> for ArchiveRecord {
    fn from(e: Envelope) -> Self {
        Self {
            salt: e.salt,
            iv: e.iv,
            auth_tag: e.auth_tag,
            data: e.encrypted,
            kdf: e.kdf,
        }
    }
}

impl From<ArchiveRecord> for Envelope {
    fn from(r: ArchiveRecord) -> Self {
        Self {
            salt: r.salt,
            iv: r.iv,
            auth_tag: r.auth_tag,
            encrypted: r.data,
            kdf: r.kdf,
        }
    }
}

/// Cleartext record written only in [`SecretMode::Insecure`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InsecureRecord {
    insecure: bool,
    #[serde(with = "b64")]
    plaintext: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Record {
    Insecure(InsecureRecord),
    Sealed(Envelope),
    Archive(ArchiveRecord),
}

/// Encrypted-at-rest storage for platform credentials and profile directories
#[derive(Debug, Clone)]
pub struct SecretStore {
    dir: PathBuf,
    kdf: KdfParams,
    mode: SecretMode,
}

impl SecretStore {
    pub fn new(dir: impl Into<PathBuf>, kdf: KdfParams, mode: SecretMode) -> Self {
        Self {
            dir: dir.into(),
            kdf,
            mode,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> SecretMode {
        self.mode
    }

    pub fn path_for(&self, id: &SecretId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    pub fn exists(&self, id: &SecretId) -> bool {
        self.path_for(id).is_file()
    }

    /// Seal `payload` and write it to the record for `id`.
    ///
    /// `password` may be `None` only in insecure mode.
    pub fn put(
        &self,
        id: &SecretId,
        payload: &[u8],
        password: Option<&str>,
    ) -> Result<(), SecretStoreError> {
        let record = match self.mode {
            SecretMode::Sealed => {
                let password = password.ok_or(SecretStoreError::PasswordRequired)?;
                let envelope = Envelope::seal(password, payload, &self.kdf)
                    .map_err(|e| SecretStoreError::Corrupted(id.clone(), e.to_string()))?;
                match id.kind {
                    SecretKind::Credentials => Record::Sealed(envelope),
                    SecretKind::Profile => Record::Archive(envelope.into()),
                }
            }
            SecretMode::Insecure => {
                tracing::warn!(secret = %id, "writing secret in cleartext (insecure mode)");
                Record::Insecure(InsecureRecord {
                    insecure: true,
                    plaintext: payload.to_vec(),
                })
            }
        };

        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| SecretStoreError::Corrupted(id.clone(), e.to_string()))?;
        atomic_write(&self.path_for(id), &json, Access::OwnerOnly)?;

        tracing::info!(secret = %id, mode = %self.mode, "stored secret");
        Ok(())
    }

    /// Read and open the record for `id`.
    pub fn get(
        &self,
        id: &SecretId,
        password: Option<&str>,
    ) -> Result<Zeroizing<Vec<u8>>, SecretStoreError> {
        let raw = match fs::read_to_string(self.path_for(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SecretStoreError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        // an unreadable record looks exactly like a wrong password to the caller
        let record: Record = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(secret = %id, "unreadable secret record: {}", e);
            SecretStoreError::Auth
        })?;

        let envelope = match record {
            Record::Insecure(record) => {
                if !record.insecure || self.mode == SecretMode::Sealed {
                    return Err(SecretStoreError::InsecureRecord(id.clone()));
                }
                tracing::warn!(secret = %id, "reading cleartext secret (insecure mode)");
                return Ok(Zeroizing::new(record.plaintext));
            }
            Record::Sealed(envelope) => envelope,
            Record::Archive(record) => record.into(),
        };

        let password = password.ok_or(SecretStoreError::PasswordRequired)?;
        envelope.open(password).map_err(|e| {
            if !matches!(e, EnvelopeError::Auth) {
                tracing::warn!(secret = %id, "cannot open secret record: {}", e);
            }
            SecretStoreError::Auth
        })
    }

    pub fn put_json(
        &self,
        id: &SecretId,
        value: &serde_json::Value,
        password: Option<&str>,
    ) -> Result<(), SecretStoreError> {
        let bytes = Zeroizing::new(
            serde_json::to_vec(value)
                .map_err(|e| SecretStoreError::Corrupted(id.clone(), e.to_string()))?,
        );
        self.put(id, &bytes, password)
    }

    pub fn get_json(
        &self,
        id: &SecretId,
        password: Option<&str>,
    ) -> Result<serde_json::Value, SecretStoreError> {
        let bytes = self.get(id, password)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SecretStoreError::Corrupted(id.clone(), e.to_string()))
    }

    /// Pack `source` and store it under `id`.
    pub fn put_dir(
        &self,
        id: &SecretId,
        source: &Path,
        password: Option<&str>,
    ) -> Result<(), SecretStoreError> {
        let packed = Zeroizing::new(pack_dir(source)?);
        self.put(id, &packed, password)
    }

    /// Open the record for `id` and unpack it at `target`.
    ///
    /// Nothing is written to `target` unless decryption and extraction both
    /// succeed.
    pub fn get_dir(
        &self,
        id: &SecretId,
        target: &Path,
        password: Option<&str>,
    ) -> Result<(), SecretStoreError> {
        let packed = self.get(id, password)?;
        unpack_dir(&packed, target)?;
        Ok(())
    }

    pub fn delete(&self, id: &SecretId) -> Result<(), SecretStoreError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                tracing::info!(secret = %id, "deleted secret");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SecretStoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every record currently in the store, sorted
    pub fn list(&self) -> Result<Vec<SecretId>, SecretStoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(SecretId::from_file_name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

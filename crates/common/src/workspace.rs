//! # Workspace
//!
//! Everything one invocation needs, resolved once and passed explicitly:
//! paths, configuration and the password session.
//!
//! ```text
//! <root>/
//!   postgate.toml          configuration
//!   drafts/                content items being worked on
//!   posted/                archive of posted items (read-only files)
//!   .postgate/
//!     signing-key.json     sealed approval key (only once `key init` ran)
//!     threads/             feedback threads, one JSON-lines file per item
//! ```
//!
//! Platform secrets live outside the workspace, in a per-user directory
//! (default `~/.postgate/secrets/`), so several workspaces can share them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::prompt::Session;
use crate::secrets::{SecretMode, SecretStore};
use crate::vault::KeyVault;

pub const APP_NAME: &str = "postgate";
pub const CONFIG_FILE_NAME: &str = "postgate.toml";
pub const STATE_DIR_NAME: &str = ".postgate";
pub const KEY_FILE_NAME: &str = "signing-key.json";
pub const THREADS_DIR_NAME: &str = "threads";
pub const DRAFTS_DIR_NAME: &str = "drafts";
pub const ARCHIVE_DIR_NAME: &str = "posted";
pub const SECRETS_DIR_NAME: &str = "secrets";

/// How to run a command-line posting adapter for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Program and arguments. The verified post arrives as JSON on stdin.
    pub command: Vec<String>,
    /// Optional pre-flight check, fed the same JSON; prints a validation result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_command: Option<Vec<String>>,
    /// Secret-store entries to decrypt and hand to the adapter
    #[serde(default)]
    pub needs_credentials: bool,
    #[serde(default)]
    pub needs_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Refuse to approve or post at all until a signing key exists
    #[serde(default)]
    pub require_signing: bool,
    /// How platform secrets are written
    #[serde(default)]
    pub secret_mode: SecretMode,
    /// Name recorded as `approved_by`; falls back to `$USER`
    #[serde(default)]
    pub approver: Option<String>,
    /// Name used for agent-authored thread entries
    #[serde(default = "default_agent")]
    pub agent: String,
    /// Override for the per-user secrets directory
    #[serde(default)]
    pub secrets_dir: Option<PathBuf>,
    /// Program run (detached) with each content event as a JSON argument
    #[serde(default)]
    pub notify_command: Option<Vec<String>>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Also write logs to daily files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub kdf: KdfParams,
    #[serde(default)]
    pub adapters: BTreeMap<String, AdapterConfig>,
}

fn default_agent() -> String {
    "agent".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            require_signing: false,
            secret_mode: SecretMode::default(),
            approver: None,
            agent: default_agent(),
            secrets_dir: None,
            notify_command: None,
            log_level: default_log_level(),
            log_dir: None,
            kdf: KdfParams::default(),
            adapters: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("no postgate workspace at {0}. Run 'postgate init' first")]
    NotInitialized(PathBuf),

    #[error("postgate workspace already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("no home directory found; set secrets_dir in postgate.toml")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Resolved paths, configuration and session for one invocation
#[derive(Debug)]
pub struct WorkspaceContext {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
    pub key_path: PathBuf,
    pub threads_dir: PathBuf,
    pub drafts_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub secrets_dir: PathBuf,
    pub config: WorkspaceConfig,
    session: Session,
}

impl WorkspaceContext {
    fn resolve(root: PathBuf, config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let state_dir = root.join(STATE_DIR_NAME);
        let secrets_dir = match &config.secrets_dir {
            Some(dir) => dir.clone(),
            None => default_secrets_dir()?,
        };
        Ok(Self {
            config_path: root.join(CONFIG_FILE_NAME),
            key_path: state_dir.join(KEY_FILE_NAME),
            threads_dir: state_dir.join(THREADS_DIR_NAME),
            drafts_dir: root.join(DRAFTS_DIR_NAME),
            archive_dir: root.join(ARCHIVE_DIR_NAME),
            state_dir,
            secrets_dir,
            root,
            config,
            session: Session::default(),
        })
    }

    /// Scaffold a new workspace at `root`
    pub fn init(root: &Path, config: Option<WorkspaceConfig>) -> Result<Self, WorkspaceError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(WorkspaceError::AlreadyInitialized(root.to_path_buf()));
        }

        let config = config.unwrap_or_default();
        let ctx = Self::resolve(root.to_path_buf(), config)?;

        fs::create_dir_all(&ctx.threads_dir)?;
        fs::create_dir_all(&ctx.drafts_dir)?;
        fs::create_dir_all(&ctx.archive_dir)?;
        fs::write(&ctx.config_path, toml::to_string_pretty(&ctx.config)?)?;

        tracing::info!(root = %ctx.root.display(), "initialized workspace");
        Ok(ctx)
    }

    /// Load the workspace at `root`
    pub fn load(root: &Path) -> Result<Self, WorkspaceError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(WorkspaceError::NotInitialized(root.to_path_buf()));
        }
        let config: WorkspaceConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        Self::resolve(root.to_path_buf(), config)
    }

    pub fn vault(&self) -> KeyVault {
        KeyVault::new(&self.key_path, self.config.kdf)
    }

    pub fn secret_store(&self) -> SecretStore {
        SecretStore::new(&self.secrets_dir, self.config.kdf, self.config.secret_mode)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Name to record for approvals made from this workspace
    pub fn approver_name(&self) -> String {
        self.config
            .approver
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "human".to_string())
    }

    /// Where the archived copy of an item named `name` lives
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.archive_dir.join(name)
    }
}

fn default_secrets_dir() -> Result<PathBuf, WorkspaceError> {
    let home = dirs::home_dir().ok_or(WorkspaceError::NoHomeDirectory)?;
    Ok(home
        .join(format!(".{}", APP_NAME))
        .join(SECRETS_DIR_NAME))
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> WorkspaceConfig {
        WorkspaceConfig {
            secrets_dir: Some(dir.path().join("secrets")),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.approver = Some("alice".into());

        let ctx = WorkspaceContext::init(dir.path(), Some(cfg.clone())).unwrap();
        assert!(ctx.drafts_dir.is_dir());
        assert!(ctx.archive_dir.is_dir());
        assert!(ctx.threads_dir.is_dir());
        assert!(!ctx.vault().is_enabled());

        let loaded = WorkspaceContext::load(dir.path()).unwrap();
        assert_eq!(loaded.config, cfg);
        assert_eq!(loaded.approver_name(), "alice");
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = TempDir::new().unwrap();
        WorkspaceContext::init(dir.path(), Some(config(&dir))).unwrap();
        assert!(matches!(
            WorkspaceContext::init(dir.path(), Some(config(&dir))),
            Err(WorkspaceError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            WorkspaceContext::load(dir.path()),
            Err(WorkspaceError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_minimal_config_file() {
        let cfg: WorkspaceConfig = toml::from_str(
            r#"
            require_signing = true
            secret_mode = "insecure"

            [kdf]
            memoryKib = 2048

            [adapters.reddit]
            command = ["reddit-post", "--json"]
            needs_credentials = true
            "#,
        )
        .unwrap();

        assert!(cfg.require_signing);
        assert_eq!(cfg.secret_mode, SecretMode::Insecure);
        assert_eq!(cfg.agent, "agent");
        assert_eq!(cfg.kdf.memory_kib, 2048);
        assert_eq!(cfg.kdf.iterations, crate::crypto::KdfParams::default().iterations);
        assert_eq!(cfg.adapters["reddit"].command[0], "reddit-post");
        assert!(!cfg.adapters["reddit"].needs_profile);
    }
}

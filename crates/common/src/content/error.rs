use std::io;
use std::path::{Path, PathBuf};

use super::status::Status;
use crate::vault::VaultError;

/// An attempted transition is not allowed for the item's current state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("'{0}' has already been posted and is archived; it cannot change")]
    AlreadyPosted(String),

    #[error("cannot move '{name}' from {from} to {to}")]
    Illegal {
        name: String,
        from: Status,
        to: Status,
    },

    #[error("'{name}' is {status}, not approved; approve it before posting")]
    NotApproved { name: String, status: Status },

    #[error("approval requires an interactive terminal (use --force to override)")]
    RequiresHuman,

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("invalid item name '{0}': use a plain file name without path separators")]
    InvalidName(String),
}

/// Everything that can stop a content operation
///
/// The gate failures are kept apart on purpose: `Tamper` means the body
/// changed after approval, `Signature` means the approval itself does not
/// check out, and `Auth` means the password was wrong. Each needs a
/// different fix from the human.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("wrong password for signing key, or the key file is damaged")]
    Auth,

    #[error("content was modified after approval (approved hash {expected}, current hash {actual}); re-approve it before posting")]
    Tamper { expected: String, actual: String },

    #[error("approval signature is invalid: {0}; re-approve before posting")]
    Signature(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("this workspace requires signed approvals but has no signing key. Run 'postgate key init' first")]
    MissingKey,

    #[error("a password is required to unlock the signing key")]
    PasswordRequired,

    #[error("signing key unavailable: {0}")]
    Vault(VaultError),

    #[error("{platform} rejected the content: {}", errors.join("; "))]
    Rejected {
        platform: String,
        errors: Vec<String>,
    },

    #[error("posting to {platform} failed: {reason}")]
    PostFailed { platform: String, reason: String },

    #[error("posted to {platform}{} but archiving failed: {reason}; the working copy is marked posted and will not be posted again", url.as_deref().map(|u| format!(" ({})", u)).unwrap_or_default())]
    Archive {
        platform: String,
        url: Option<String>,
        reason: String,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("no content item at {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl ContentError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return ContentError::NotFound(path.to_path_buf());
        }
        ContentError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        ContentError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<VaultError> for ContentError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::Auth => ContentError::Auth,
            VaultError::NotInitialized(_) => ContentError::MissingKey,
            other => ContentError::Vault(other),
        }
    }
}

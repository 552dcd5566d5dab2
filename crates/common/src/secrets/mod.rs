//! # Secret Store
//!
//! Generic encrypted-at-rest storage for whatever a posting adapter needs:
//! JSON credentials, or a whole directory (a browser profile) packed into one
//! archive before sealing.
//!
//! Records live at fixed per-platform paths in a per-user directory
//! (default `~/.postgate/secrets/`):
//!
//! - `<platform>.credentials.json`: `{salt, iv, authTag, encrypted}`
//! - `<platform>.profile.json`: `{salt, iv, authTag, data}`
//!
//! Failures mirror the envelope: a wrong password and a damaged record both
//! surface as [`SecretStoreError::Auth`], and a failed directory restore
//! writes nothing.

mod archive;
mod store;

pub use archive::{pack_dir, unpack_dir, ArchiveError};
pub use store::{SecretId, SecretKind, SecretMode, SecretStore, SecretStoreError};

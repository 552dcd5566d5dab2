//! Secret command - platform credentials and profiles, sealed at rest
//!
//! - postgate secret set-credentials  - Seal a JSON credentials file
//! - postgate secret import-profile   - Pack and seal a profile directory
//! - postgate secret restore-profile  - Unpack a sealed profile somewhere
//! - postgate secret list             - Show what is stored
//! - postgate secret delete           - Remove one record

use clap::{Args, Subcommand};
use zeroize::Zeroizing;

pub mod delete;
pub mod import_profile;
pub mod list;
pub mod restore_profile;
pub mod set_credentials;

use common::secrets::{SecretMode, SecretStore, SecretStoreError};
use common::workspace::WorkspaceError;

use crate::op::{Op, OpContext, PasswordError};

crate::command_enum! {
    (SetCredentials, set_credentials::SetCredentials),
    (ImportProfile, import_profile::ImportProfile),
    (RestoreProfile, restore_profile::RestoreProfile),
    (List, list::List),
    (Delete, delete::Delete),
}

pub type SecretCommand = Command;

#[derive(Args, Debug, Clone)]
#[command(about = "Manage sealed platform credentials and profiles")]
pub struct Secret {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[async_trait::async_trait]
impl Op for Secret {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Store(#[from] SecretStoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("failed to read {path}: {source}")]
    Input {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not valid JSON: {1}")]
    Json(std::path::PathBuf, serde_json::Error),
}

/// Password to seal a new record with; none in insecure mode
pub(crate) fn sealing_password(
    ctx: &OpContext,
    store: &SecretStore,
) -> Result<Option<Zeroizing<String>>, PasswordError> {
    match store.mode() {
        SecretMode::Sealed => ctx.new_password("Secret password: ").map(Some),
        SecretMode::Insecure => Ok(None),
    }
}

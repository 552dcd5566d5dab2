//! Key command - manage the workspace signing key
//!
//! - postgate key init     - Generate the keypair, sealed under a new password
//! - postgate key show     - Print the public key and its fingerprint
//! - postgate key rotate   - Re-seal the same key under a new password

use clap::{Args, Subcommand};

pub mod init;
pub mod rotate;
pub mod show;

use common::vault::VaultError;
use common::workspace::WorkspaceError;

use crate::op::{Op, PasswordError};

crate::command_enum! {
    (Init, init::Init),
    (Show, show::Show),
    (Rotate, rotate::Rotate),
}

// Rename the generated Command to KeyCommand for clarity
pub type KeyCommand = Command;

#[derive(Args, Debug, Clone)]
#[command(about = "Manage the workspace signing key")]
pub struct Key {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[async_trait::async_trait]
impl Op for Key {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

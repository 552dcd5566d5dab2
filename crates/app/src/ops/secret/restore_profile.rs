use std::path::PathBuf;

use clap::Args;

use common::secrets::{SecretId, SecretMode};

use super::SecretError;
use crate::op::PasswordError;

/// Unpack a sealed profile into a directory
#[derive(Args, Debug, Clone)]
pub struct RestoreProfile {
    #[arg(long)]
    pub platform: String,

    /// Target directory. It must not exist yet; missing parents are created.
    #[arg(long)]
    pub dir: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for RestoreProfile {
    type Error = SecretError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let store = ws.secret_store();
        let id = SecretId::profile(&self.platform)?;

        let password = match store.mode() {
            SecretMode::Sealed => Some(
                ctx.password(&ws, "Secret password: ")
                    .map_err(PasswordError::from)?,
            ),
            SecretMode::Insecure => None,
        };
        store.get_dir(&id, &self.dir, password.as_deref().map(String::as_str))?;

        Ok(format!("Restored {} into {}", id, self.dir.display()))
    }
}

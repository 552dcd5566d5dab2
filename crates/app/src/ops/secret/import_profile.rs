use std::path::PathBuf;

use clap::Args;

use common::secrets::SecretId;

use super::{sealing_password, SecretError};

/// Pack a profile directory (e.g. a logged-in browser profile) and seal it
#[derive(Args, Debug, Clone)]
pub struct ImportProfile {
    #[arg(long)]
    pub platform: String,

    #[arg(long)]
    pub dir: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for ImportProfile {
    type Error = SecretError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let store = ws.secret_store();
        let id = SecretId::profile(&self.platform)?;
        if !self.dir.is_dir() {
            return Err(SecretError::Input {
                path: self.dir.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let password = sealing_password(ctx, &store)?;
        store.put_dir(&id, &self.dir, password.as_deref().map(String::as_str))?;

        Ok(format!(
            "Stored {} ({}). The source directory {} was left in place; remove it if it should not stay in cleartext.",
            id,
            store.mode(),
            self.dir.display()
        ))
    }
}

use clap::Args;

use super::KeyError;

#[derive(Args, Debug, Clone)]
pub struct Show;

#[async_trait::async_trait]
impl crate::op::Op for Show {
    type Error = KeyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let vault = ws.vault();
        let Some(public) = vault.load_public_key()? else {
            return Ok("No signing key; approvals in this workspace are unsigned.".to_string());
        };

        let created = vault
            .created_at()?
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(format!(
            "Key file: {}\nCreated: {}\nFingerprint: {}\n{}",
            vault.path().display(),
            created,
            public.fingerprint(),
            public.to_pem().trim_end()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;
    use common::vault::VaultError;

    #[tokio::test]
    async fn test_show_before_and_after_init() {
        let dir = workspace();
        let (ctx, prompt) = context(&dir, ScriptedPrompt::new(&["pw"], true));

        let output = Show.execute(&ctx).await.unwrap();
        assert!(output.starts_with("No signing key"));

        let public = ctx.workspace().unwrap().vault().initialize("pw").unwrap();
        let output = Show.execute(&ctx).await.unwrap();
        assert!(output.contains(&format!("Fingerprint: {}", public.fingerprint())));
        assert!(output.contains("-----BEGIN PUBLIC KEY-----"));
        assert!(!output.contains("Created: unknown"));
        // showing the public half never asks for the password
        assert_eq!(prompt.remaining(), 1);
    }

    #[tokio::test]
    async fn test_show_garbage_key_file() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], true));
        let ws = ctx.workspace().unwrap();
        std::fs::write(&ws.key_path, "not json").unwrap();

        assert!(matches!(
            Show.execute(&ctx).await,
            Err(KeyError::Vault(VaultError::Corrupted(_)))
        ));
    }
}

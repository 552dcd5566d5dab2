use clap::Args;

use super::KeyError;

#[derive(Args, Debug, Clone)]
pub struct Init;

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = KeyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let vault = ws.vault();
        if vault.is_enabled() {
            return Err(common::vault::VaultError::AlreadyInitialized(vault.path().to_path_buf()).into());
        }

        let password = ctx.new_password("New signing key password: ")?;
        let public = vault.initialize(&password)?;

        Ok(format!(
            "Signing key created at {}\n\
             Fingerprint: {}\n\
             From now on every approval is signed and checked before posting.\n\
             There is no recovery if the password is lost.",
            vault.path().display(),
            public.fingerprint()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::{Op, PasswordError};

    #[tokio::test]
    async fn test_key_init() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&["pw", "pw"], true));
        let output = Init.execute(&ctx).await.unwrap();
        assert!(output.contains("Fingerprint"));

        let ws = ctx.workspace().unwrap();
        assert!(ws.vault().unlock("pw").is_ok());

        // a second init never overwrites
        let (ctx, prompt) = context(&dir, ScriptedPrompt::new(&["x", "x"], true));
        assert!(matches!(
            Init.execute(&ctx).await,
            Err(KeyError::Vault(common::vault::VaultError::AlreadyInitialized(_)))
        ));
        assert_eq!(prompt.remaining(), 2);
    }

    #[tokio::test]
    async fn test_key_init_mismatch() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&["one", "two"], true));
        assert!(matches!(
            Init.execute(&ctx).await,
            Err(KeyError::Password(PasswordError::Mismatch))
        ));
        assert!(!ctx.workspace().unwrap().vault().is_enabled());
    }
}

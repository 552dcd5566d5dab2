use clap::Args;

use super::KeyError;

/// Change the password protecting the signing key. Existing approvals stay valid.
#[derive(Args, Debug, Clone)]
pub struct Rotate;

#[async_trait::async_trait]
impl crate::op::Op for Rotate {
    type Error = KeyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let vault = ws.vault();
        // fail on a missing key before asking for anything
        if !vault.is_enabled() {
            return Err(common::vault::VaultError::NotInitialized(vault.path().to_path_buf()).into());
        }

        let old = ctx
            .prompt
            .read_hidden("Current password: ")
            .map_err(crate::op::PasswordError::from)?;
        vault.unlock(&old)?;
        let new = ctx.new_password("New password: ")?;
        vault.rotate_password(&old, &new)?;

        Ok(format!("Signing key at {} re-sealed under the new password.", vault.path().display()))
    }
}

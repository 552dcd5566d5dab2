use clap::Args;

use super::SecretError;

/// Show stored records (never their contents)
#[derive(Args, Debug, Clone)]
pub struct List;

#[async_trait::async_trait]
impl crate::op::Op for List {
    type Error = SecretError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let store = ws.secret_store();
        let ids = store.list()?;
        if ids.is_empty() {
            return Ok(format!("No secrets in {}", store.dir().display()));
        }

        let mut out = format!("{} ({} mode):", store.dir().display(), store.mode());
        for id in ids {
            out.push_str(&format!("\n  {}", id));
        }
        Ok(out)
    }
}

use clap::Args;

use common::secrets::SecretId;

use super::SecretError;

/// Remove one record: `<platform>` for credentials, `<platform>:profile`
#[derive(Args, Debug, Clone)]
pub struct Delete {
    pub id: SecretId,
}

#[async_trait::async_trait]
impl crate::op::Op for Delete {
    type Error = SecretError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        ws.secret_store().delete(&self.id)?;
        Ok(format!("Deleted {}", self.id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;
    use crate::ops::secret::list::List;
    use common::secrets::SecretStoreError;

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], true));
        assert!(List.execute(&ctx).await.unwrap().starts_with("No secrets"));

        let store = ctx.workspace().unwrap().secret_store();
        let id: SecretId = "reddit".parse().unwrap();
        store
            .put_json(&id, &serde_json::json!({ "token": "abc" }), Some("pw"))
            .unwrap();

        let listing = List.execute(&ctx).await.unwrap();
        assert!(listing.contains("reddit credentials"));
        assert!(!listing.contains("abc"));

        Delete { id: id.clone() }.execute(&ctx).await.unwrap();
        assert!(matches!(
            Delete { id }.execute(&ctx).await,
            Err(SecretError::Store(SecretStoreError::NotFound(_)))
        ));
    }
}

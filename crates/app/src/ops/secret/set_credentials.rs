use std::path::PathBuf;

use clap::Args;

use common::secrets::SecretId;

use super::{sealing_password, SecretError};

/// Seal a JSON credentials file for a platform adapter
#[derive(Args, Debug, Clone)]
pub struct SetCredentials {
    #[arg(long)]
    pub platform: String,

    /// JSON file with the credentials; it is not deleted afterwards
    #[arg(long)]
    pub file: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for SetCredentials {
    type Error = SecretError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let store = ws.secret_store();
        let id = SecretId::credentials(&self.platform)?;

        let raw = std::fs::read_to_string(&self.file).map_err(|source| SecretError::Input {
            path: self.file.clone(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| SecretError::Json(self.file.clone(), e))?;

        let password = sealing_password(ctx, &store)?;
        store.put_json(&id, &value, password.as_deref().map(String::as_str))?;

        Ok(format!(
            "Stored {} ({}) at {}",
            id,
            store.mode(),
            store.path_for(&id).display()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;

    #[tokio::test]
    async fn test_set_credentials_sealed() {
        let dir = workspace();
        let file = dir.path().join("creds.json");
        std::fs::write(&file, r#"{"token": "abc"}"#).unwrap();

        let (ctx, _) = context(&dir, ScriptedPrompt::new(&["pw", "pw"], true));
        SetCredentials {
            platform: "reddit".into(),
            file,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let store = ctx.workspace().unwrap().secret_store();
        let id = SecretId::credentials("reddit").unwrap();
        let raw = std::fs::read_to_string(store.path_for(&id)).unwrap();
        assert!(!raw.contains("abc"));
        assert_eq!(store.get_json(&id, Some("pw")).unwrap()["token"], "abc");
    }

    #[tokio::test]
    async fn test_set_credentials_rejects_bad_input() {
        let dir = workspace();
        let file = dir.path().join("creds.json");
        std::fs::write(&file, "token=abc").unwrap();

        let (ctx, prompt) = context(&dir, ScriptedPrompt::new(&["pw", "pw"], true));
        let err = SetCredentials {
            platform: "reddit".into(),
            file: file.clone(),
        }
        .execute(&ctx)
        .await
        .unwrap_err();
        assert!(matches!(err, SecretError::Json(..)));
        assert_eq!(prompt.remaining(), 2);

        let err = SetCredentials {
            platform: "../etc".into(),
            file,
        }
        .execute(&ctx)
        .await
        .unwrap_err();
        assert!(matches!(err, SecretError::Store(_)));
    }
}

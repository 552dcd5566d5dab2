use clap::Args;

use common::secrets::SecretMode;
use common::workspace::{WorkspaceConfig, WorkspaceContext, WorkspaceError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Refuse unsigned approvals; run `postgate key init` next
    #[arg(long)]
    pub require_signing: bool,

    /// Name recorded on approvals (defaults to $USER)
    #[arg(long)]
    pub approver: Option<String>,

    /// Name used for agent-authored thread entries
    #[arg(long, default_value = "agent")]
    pub agent: String,

    /// Store platform secrets in cleartext. Labeled on every record.
    #[arg(long)]
    pub insecure_secrets: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] WorkspaceError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = WorkspaceConfig {
            require_signing: self.require_signing,
            approver: self.approver.clone(),
            agent: self.agent.clone(),
            secret_mode: if self.insecure_secrets {
                SecretMode::Insecure
            } else {
                SecretMode::Sealed
            },
            ..Default::default()
        };

        let ws = WorkspaceContext::init(&ctx.root, Some(config))?;

        let mut output = format!(
            "Initialized postgate workspace at: {}\n\
             - Config: {}\n\
             - Drafts: {}\n\
             - Archive: {}\n\
             - Threads: {}\n\
             - Secrets: {} ({})",
            ws.root.display(),
            ws.config_path.display(),
            ws.drafts_dir.display(),
            ws.archive_dir.display(),
            ws.threads_dir.display(),
            ws.secrets_dir.display(),
            ws.config.secret_mode,
        );
        if ws.config.require_signing {
            output.push_str("\nSigned approvals are required. Run 'postgate key init' next.");
        } else {
            output.push_str("\nApprovals are unsigned until you run 'postgate key init'.");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::ScriptedPrompt;
    use crate::op::{Op, OpContext};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_init_writes_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = OpContext::new(
            dir.path().to_path_buf(),
            Arc::new(ScriptedPrompt::new(&[], true)),
        );
        let init = Init {
            require_signing: true,
            approver: Some("alice".into()),
            agent: "drafter".into(),
            insecure_secrets: false,
        };

        let output = init.execute(&ctx).await.unwrap();
        assert!(output.contains("postgate key init"));

        let ws = ctx.workspace().unwrap();
        assert!(ws.config.require_signing);
        assert_eq!(ws.config.agent, "drafter");

        assert!(matches!(
            init.execute(&ctx).await,
            Err(InitError::StateFailed(WorkspaceError::AlreadyInitialized(_)))
        ));
    }
}

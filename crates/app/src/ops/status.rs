use clap::Args;

use common::content::ContentStateMachine;
use common::notify::NoopNotifier;

use crate::op::ContentOpError;

/// List drafts and posted items
#[derive(Args, Debug, Clone)]
pub struct Status;

#[async_trait::async_trait]
impl crate::op::Op for Status {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let items = ContentStateMachine::new(&ws, &NoopNotifier).list()?;

        let signing = if ws.vault().is_enabled() {
            "signed approvals"
        } else if ws.config.require_signing {
            "signing required but no key; run 'postgate key init'"
        } else {
            "unsigned approvals"
        };
        let mut lines = vec![format!("Workspace {} ({})", ws.root.display(), signing)];
        if items.is_empty() {
            lines.push("No items.".to_string());
        }
        for item in items {
            let approver = item
                .approved_by
                .map(|name| format!(" by {}", name))
                .unwrap_or_default();
            lines.push(format!(
                "  {:<9} {:<10} {}{}",
                item.status.as_str(),
                item.platform,
                item.path
                    .strip_prefix(&ws.root)
                    .unwrap_or(&item.path)
                    .display(),
                approver
            ));
        }
        Ok(lines.join("\n"))
    }
}

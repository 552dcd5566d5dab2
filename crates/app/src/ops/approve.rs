use std::path::PathBuf;

use clap::Args;

use common::content::{ContentStateMachine, Status, Transition};
use common::notify::EventDispatcher;

use crate::op::ContentOpError;

/// Approve an item as a human, signing it when the workspace has a key
#[derive(Args, Debug, Clone)]
pub struct Approve {
    pub path: PathBuf,

    /// Approve without an interactive terminal. Recorded as a forced approval.
    #[arg(long)]
    pub force: bool,
}

#[async_trait::async_trait]
impl crate::op::Op for Approve {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);
        let approver = ctx.approver(&ws, self.force);

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);

        // missing, archived or posted items fail before any password prompt
        machine.load(&path)?;

        let may_approve = approver.interactive || approver.forced;
        let transition = if !may_approve || !ws.vault().is_enabled() {
            machine.approve(&path, &approver, None)?
        } else if machine.verify(&path).is_ok() {
            // still valid; no need to unlock anything
            Transition::Unchanged(Status::Approved)
        } else {
            ctx.with_password(&ws, "Signing key password: ", |password| {
                machine.approve(&path, &approver, Some(password))
            })?
        };
        ctx.deliver(&ws, &events);

        let mut output = super::describe(&path, &transition);
        if approver.forced && !approver.interactive {
            output.push_str(" [forced]");
        }
        Ok(output)
    }
}

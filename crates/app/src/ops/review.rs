use std::path::PathBuf;

use clap::Args;

use common::content::{Actor, ContentStateMachine};
use common::notify::EventDispatcher;

use crate::op::ContentOpError;

/// Record feedback and move the item to `reviewed`
#[derive(Args, Debug, Clone)]
pub struct Review {
    pub path: PathBuf,

    #[arg(long)]
    pub feedback: String,

    /// Who is reviewing (defaults to the configured approver)
    #[arg(long)]
    pub reviewer: Option<String>,
}

#[async_trait::async_trait]
impl crate::op::Op for Review {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);
        let reviewer = Actor::human(self.reviewer.clone().unwrap_or_else(|| ws.approver_name()));

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);
        let transition = machine.review(&path, &reviewer, &self.feedback)?;
        ctx.deliver(&ws, &events);

        Ok(super::describe(&path, &transition))
    }
}

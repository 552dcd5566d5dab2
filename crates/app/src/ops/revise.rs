use std::path::PathBuf;

use clap::Args;

use common::content::{Actor, ContentStateMachine};
use common::notify::EventDispatcher;

use crate::op::ContentOpError;

/// Mark feedback as addressed, optionally replacing the body
#[derive(Args, Debug, Clone)]
pub struct Revise {
    pub path: PathBuf,

    /// New body, read from this file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Note for the reviewer, appended to the thread
    #[arg(long)]
    pub note: Option<String>,
}

#[async_trait::async_trait]
impl crate::op::Op for Revise {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);
        let body = self.file.as_deref().map(super::read_input).transpose()?;

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);
        let transition = machine.revise(
            &path,
            &Actor::agent(ws.config.agent.clone()),
            body.as_deref(),
            self.note.as_deref(),
        )?;
        ctx.deliver(&ws, &events);

        Ok(super::describe(&path, &transition))
    }
}

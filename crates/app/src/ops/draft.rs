use std::path::PathBuf;

use clap::Args;

use common::content::{Actor, ContentStateMachine};
use common::notify::EventDispatcher;

use crate::op::ContentOpError;

#[derive(Args, Debug, Clone)]
#[command(group(clap::ArgGroup::new("content").required(true).args(["file", "body"])))]
pub struct Draft {
    /// Platform tag, e.g. reddit or x
    #[arg(long)]
    pub platform: String,

    /// Item name; becomes drafts/<name>.md
    #[arg(long)]
    pub name: String,

    /// Read the body from this file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// The body itself
    #[arg(long)]
    pub body: Option<String>,
}

#[async_trait::async_trait]
impl crate::op::Op for Draft {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let body = match (&self.file, &self.body) {
            (Some(file), _) => super::read_input(file)?,
            (None, Some(body)) => body.clone(),
            (None, None) => String::new(),
        };

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);
        let item = machine.create_draft(
            &self.name,
            &self.platform,
            &body,
            &Actor::agent(ws.config.agent.clone()),
        )?;
        ctx.deliver(&ws, &events);

        Ok(format!("{}: drafted for {}", item.path.display(), item.meta.platform))
    }
}

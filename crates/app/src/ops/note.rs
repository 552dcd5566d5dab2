use std::path::PathBuf;

use clap::Args;

use common::content::{Actor, ContentStateMachine};
use common::notify::EventDispatcher;

use crate::op::ContentOpError;

/// Append a note to an item's thread without changing its state
#[derive(Args, Debug, Clone)]
pub struct Note {
    pub path: PathBuf,

    #[arg(long, short = 'm')]
    pub message: String,

    /// Write the note as the agent rather than the human
    #[arg(long)]
    pub as_agent: bool,
}

#[async_trait::async_trait]
impl crate::op::Op for Note {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);
        let author = if self.as_agent {
            Actor::agent(ws.config.agent.clone())
        } else {
            Actor::human(ws.approver_name())
        };

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);
        let entry = machine.note(&path, &author, &self.message)?;
        ctx.deliver(&ws, &events);

        Ok(format!("{}: note added by {}", path.display(), entry.author))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;
    use crate::ops::{Draft, Thread};
    use common::content::{ContentError, ContentItem, Role, Status};

    #[tokio::test]
    async fn test_notes_show_up_in_thread() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], true));
        Draft {
            platform: "reddit".into(),
            name: "hello".into(),
            file: None,
            body: Some("Hello".into()),
        }
        .execute(&ctx)
        .await
        .unwrap();
        let path = PathBuf::from("drafts/hello.md");

        let empty = Thread { path: path.clone() }.execute(&ctx).await.unwrap();
        assert_eq!(empty, "No thread entries.");

        let output = Note {
            path: path.clone(),
            message: "tone it down".into(),
            as_agent: false,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(output.ends_with("note added by alice"));
        Note {
            path: path.clone(),
            message: "done".into(),
            as_agent: true,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let thread = Thread { path: path.clone() }.execute(&ctx).await.unwrap();
        let lines: Vec<&str> = thread.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("note") && lines[0].ends_with("alice (human): tone it down"));
        assert!(lines[1].ends_with("agent (agent): done"));

        // notes never move the item
        let item = ContentItem::load(&dir.path().join(&path)).unwrap();
        assert_eq!(item.status(), Status::Draft);
        let ws = ctx.workspace().unwrap();
        let entries = ContentStateMachine::new(&ws, &common::notify::NoopNotifier)
            .thread(&item.path)
            .unwrap();
        assert_eq!(entries[0].role, Role::Human);
        assert_eq!(entries[1].role, Role::Agent);
    }

    #[tokio::test]
    async fn test_note_on_missing_item() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], true));

        let result = Note {
            path: "drafts/nothing.md".into(),
            message: "hello?".into(),
            as_agent: false,
        }
        .execute(&ctx)
        .await;
        assert!(matches!(
            result,
            Err(ContentOpError::Content(ContentError::NotFound(_)))
        ));
    }
}

use std::path::PathBuf;

use clap::Args;

use common::content::ContentStateMachine;
use common::notify::NoopNotifier;

use crate::op::ContentOpError;

/// Print an item's feedback thread
#[derive(Args, Debug, Clone)]
pub struct Thread {
    pub path: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for Thread {
    type Error = ContentOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let machine = ContentStateMachine::new(&ws, &NoopNotifier);
        let entries = machine.thread(&ctx.item_path(&self.path))?;

        if entries.is_empty() {
            return Ok("No thread entries.".to_string());
        }
        let lines: Vec<String> = entries
            .iter()
            .map(|e| {
                format!(
                    "[{}] {:<8} {} ({}): {}",
                    e.timestamp.format("%Y-%m-%d %H:%M"),
                    e.kind.as_str(),
                    e.author,
                    e.role.as_str(),
                    e.message
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::testkit::{context, workspace, ScriptedPrompt};
    use crate::op::Op;
    use common::content::{Actor, EntryKind, FeedbackThread, ThreadEntry};

    #[tokio::test]
    async fn test_thread_formats_entries() {
        let dir = workspace();
        let (ctx, _) = context(&dir, ScriptedPrompt::new(&[], true));
        let ws = ctx.workspace().unwrap();

        let path = PathBuf::from("drafts/gone.md");
        let empty = Thread { path: path.clone() }.execute(&ctx).await.unwrap();
        assert_eq!(empty, "No thread entries.");

        // the thread outlives the item file itself
        FeedbackThread::for_item(&ws.threads_dir, "gone.md")
            .append(&ThreadEntry::new(
                &Actor::human("bob"),
                EntryKind::Feedback,
                "shorter please",
            ))
            .unwrap();
        let output = Thread { path }.execute(&ctx).await.unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("feedback"));
        assert!(output.ends_with("bob (human): shorter please"));
    }
}

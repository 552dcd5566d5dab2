//! Delivers queued content events to the configured `notify_command`
//!
//! Each event is passed as a single JSON argument to a detached child. The
//! child is never waited on, and a failure to start it is only logged.

use std::process::{Command, Stdio};

use common::notify::ContentEvent;

#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: Vec<String>,
}

impl CommandNotifier {
    pub fn new(command: Option<&Vec<String>>) -> Option<Self> {
        command.filter(|c| !c.is_empty()).map(|c| Self { command: c.clone() })
    }

    pub fn deliver(&self, events: Vec<ContentEvent>) {
        let Some((program, args)) = self.command.split_first() else {
            return;
        };
        for event in events {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("failed to encode content event: {}", e);
                    continue;
                }
            };
            match Command::new(program)
                .args(args)
                .arg(&json)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => {
                    tracing::debug!(pid = child.id(), item = %event.item, kind = ?event.kind, "notified");
                }
                Err(e) => {
                    tracing::warn!(program = %program, "failed to run notify command: {}", e);
                }
            }
        }
    }
}

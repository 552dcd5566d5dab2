use std::path::PathBuf;

use clap::Args;

use common::adapter::PostOptions;
use common::content::{Actor, ContentError, ContentStateMachine, PostReport};
use common::notify::EventDispatcher;
use common::secrets::{SecretId, SecretMode, SecretStoreError};
use common::workspace::WorkspaceError;

use crate::adapter::CommandAdapter;

/// Verify an approved item, hand it to its platform adapter and archive it
#[derive(Args, Debug, Clone)]
pub struct Post {
    pub path: PathBuf,

    /// Check the approval and run validation, but do not publish
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("no adapter configured for '{0}'; add [adapters.{0}] to postgate.toml")]
    NoAdapter(String),
    #[error("secret store: {0}")]
    Secret(#[from] SecretStoreError),
    #[error("failed to read password: {0}")]
    Prompt(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Post {
    type Error = PostError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ws = ctx.workspace()?;
        let path = ctx.item_path(&self.path);

        let (dispatcher, events) = EventDispatcher::new();
        let machine = ContentStateMachine::new(&ws, &dispatcher);

        // gate first, so nothing is decrypted for content that cannot be posted
        let platform = machine.verify(&path)?.platform().to_string();
        let config = ws
            .config
            .adapters
            .get(&platform)
            .cloned()
            .ok_or_else(|| PostError::NoAdapter(platform.clone()))?;

        let mut options = PostOptions {
            dry_run: self.dry_run,
            ..Default::default()
        };
        let store = ws.secret_store();
        let password = if !self.dry_run
            && (config.needs_credentials || config.needs_profile)
            && store.mode() == SecretMode::Sealed
        {
            Some(ctx.password(&ws, "Secret store password: ")?)
        } else {
            None
        };
        let password = password.as_deref().map(String::as_str);

        // the restored profile lives only as long as this command
        let mut profile = None;
        if !self.dry_run {
            if config.needs_credentials {
                options.credentials = Some(store.get_json(&SecretId::credentials(&platform)?, password)?);
            }
            if config.needs_profile {
                let staging = tempfile::Builder::new().prefix("postgate-profile-").tempdir()?;
                let target = staging.path().join("profile");
                store.get_dir(&SecretId::profile(&platform)?, &target, password)?;
                options.profile_dir = Some(target.clone());
                profile = Some((staging, target));
            }
        }

        let adapter = CommandAdapter::new(platform.clone(), config);
        let actor = Actor::human(ws.approver_name());
        let report = machine.post(&path, &adapter, &options, &actor)?;

        // browser sessions refresh their profile while posting; keep the new one
        if let Some((_staging, target)) = &profile {
            if let Err(e) = store.put_dir(&SecretId::profile(&platform)?, target, password) {
                tracing::warn!(%platform, "failed to re-seal updated profile: {}", e);
            }
        }
        ctx.deliver(&ws, &events);

        Ok(match report {
            PostReport::DryRun { report, warnings } => {
                let mut out = format!(
                    "{}: dry run ok for {} (hash {})",
                    path.display(),
                    report.platform,
                    report.content_hash
                );
                for warning in warnings {
                    out.push_str(&format!("\n  warning: {}", warning));
                }
                out
            }
            PostReport::Posted {
                archived,
                url,
                warnings,
                ..
            } => {
                let mut out = format!(
                    "Posted to {}{}\nArchived at {}",
                    platform,
                    url.map(|u| format!(": {}", u)).unwrap_or_default(),
                    archived.display()
                );
                for warning in warnings {
                    out.push_str(&format!("\n  warning: {}", warning));
                }
                out
            }
        })
    }
}

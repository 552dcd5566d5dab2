//! Shared fixtures for approval-gate integration tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use common::adapter::{PostOptions, PostOutcome, PostingAdapter};
use common::content::{Actor, Approver, ContentStateMachine, VerifiedContent};
use common::crypto::KdfParams;
use common::notify::NoopNotifier;
use common::workspace::{WorkspaceConfig, WorkspaceContext};
use tempfile::TempDir;

pub const PASSWORD: &str = "correctpw";

/// Argon2 at its floor, so each seal/open takes milliseconds
pub fn cheap_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn config(dir: &TempDir) -> WorkspaceConfig {
    WorkspaceConfig {
        secrets_dir: Some(dir.path().join("secrets")),
        kdf: cheap_kdf(),
        ..Default::default()
    }
}

/// A fresh workspace without a signing key
pub fn setup_workspace() -> (WorkspaceContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let ctx = WorkspaceContext::init(dir.path(), Some(config(&dir))).unwrap();
    (ctx, dir)
}

/// A fresh workspace whose signing key is sealed under [`PASSWORD`]
pub fn setup_signed_workspace() -> (WorkspaceContext, TempDir) {
    let (ctx, dir) = setup_workspace();
    ctx.vault().initialize(PASSWORD).unwrap();
    (ctx, dir)
}

pub fn machine(ctx: &WorkspaceContext) -> ContentStateMachine<'_> {
    ContentStateMachine::new(ctx, &NoopNotifier)
}

pub fn agent() -> Actor {
    Actor::agent("drafter")
}

pub fn alice() -> Approver {
    Approver {
        name: "alice".into(),
        interactive: true,
        forced: false,
    }
}

/// Draft `body` for `platform` and return its path
pub fn draft(ctx: &WorkspaceContext, name: &str, platform: &str, body: &str) -> PathBuf {
    machine(ctx)
        .create_draft(name, platform, body, &agent())
        .unwrap()
        .path
}

/// Adapter that records what it was asked to post
pub struct RecordingAdapter {
    pub platform: String,
    pub fail_with: Option<String>,
    pub posted: Mutex<Vec<String>>,
}

impl RecordingAdapter {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            fail_with: None,
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(platform: &str, error: &str) -> Self {
        Self {
            fail_with: Some(error.to_string()),
            ..Self::new(platform)
        }
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }
}

impl PostingAdapter for RecordingAdapter {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn post(&self, content: &VerifiedContent, _options: &PostOptions) -> anyhow::Result<PostOutcome> {
        if let Some(error) = &self.fail_with {
            anyhow::bail!("{}", error);
        }
        self.posted.lock().unwrap().push(content.body().to_string());
        Ok(PostOutcome {
            success: true,
            url: Some(format!("https://{}.example.invalid/1", self.platform)),
            error: None,
        })
    }
}

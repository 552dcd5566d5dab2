//! Port for the platform-specific code that actually publishes a post
//!
//! Adapters only ever see a [`VerifiedContent`], which the state machine
//! hands out after the approval gate has passed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::content::VerifiedContent;

/// Extra inputs for one post attempt
#[derive(Debug, Clone, Default)]
pub struct PostOptions {
    /// Run the gate and validation, but do not publish or archive.
    pub dry_run: bool,
    /// Decrypted credentials from the secret store, if the adapter needs them.
    pub credentials: Option<serde_json::Value>,
    /// Restored profile directory, if the adapter needs one.
    pub profile_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }
}

pub trait PostingAdapter {
    /// Platform tag this adapter posts to
    fn platform(&self) -> &str;

    /// Platform-specific checks (length limits, required fields, ...)
    fn validate(&self, _content: &VerifiedContent) -> Validation {
        Validation::ok()
    }

    fn post(
        &self,
        content: &VerifiedContent,
        options: &PostOptions,
    ) -> anyhow::Result<PostOutcome>;
}

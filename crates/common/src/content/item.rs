//! Content items on disk
//!
//! An item is a Markdown file with a YAML metadata block:
//!
//! ```text
//! ---
//! platform: reddit
//! status: approved
//! approved_by: alice
//! approved_at: 2026-01-01T12:00:00Z
//! content_hash: 185f8db3...
//! approval_signature: q2V0...
//! ---
//! The body, exactly as it will be posted.
//! ```
//!
//! The body is everything after the closing `---` line, byte for byte. That
//! is what gets hashed, signed and posted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ContentError;
use super::status::Status;
use crate::fs::{atomic_write, Access};

const DELIMITER: &str = "---";

/// How a human approval was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// Approved at an interactive terminal.
    Interactive,
    /// The interactive check was overridden with `--force`.
    Forced,
}

/// Typed metadata block of a content item
///
/// Keys this crate does not know about land in `extra` and are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub platform: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<ApprovalMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            status: Status::Draft,
            created_at: Some(Utc::now()),
            review_feedback: None,
            approved_by: None,
            approved_at: None,
            approval_mode: None,
            content_hash: None,
            approval_signature: None,
            posted_at: None,
            post_url: None,
            extra: BTreeMap::new(),
        }
    }

    /// Drop everything an approval recorded
    pub fn clear_approval(&mut self) {
        self.approved_by = None;
        self.approved_at = None;
        self.approval_mode = None;
        self.content_hash = None;
        self.approval_signature = None;
    }

    /// A string-valued extension key, e.g. `title`
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// A unit of text to be posted, loaded from its file
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub path: PathBuf,
    pub meta: Frontmatter,
    pub body: String,
}

impl ContentItem {
    pub fn new(path: impl Into<PathBuf>, meta: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            meta,
            body: body.into(),
        }
    }

    /// Item identity: the file name
    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    pub fn status(&self) -> Status {
        self.meta.status
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|e| ContentError::read(path, e))?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, ContentError> {
        let (yaml, body) =
            split_frontmatter(raw).ok_or_else(|| ContentError::Parse {
                path: path.to_path_buf(),
                reason: "missing '---' metadata block".into(),
            })?;
        let meta: Frontmatter = serde_yaml::from_str(yaml).map_err(|e| ContentError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(path, meta, body))
    }

    pub fn render(&self) -> Result<String, ContentError> {
        let yaml = serde_yaml::to_string(&self.meta).map_err(|e| ContentError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{}", self.body))
    }

    /// Atomically rewrite the item at its own path
    pub fn save(&self) -> Result<(), ContentError> {
        self.save_to(&self.path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ContentError> {
        let rendered = self.render()?;
        atomic_write(path, rendered.as_bytes(), Access::Default)
            .map_err(|e| ContentError::write(path, e))
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split `raw` into (yaml, body). The opening delimiter must be the first line.
fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

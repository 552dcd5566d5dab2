//! # Content State Machine
//!
//! Drives items through `draft -> reviewed <-> revised -> approved -> posted`
//! and owns the approval gate.
//!
//! # Security Model
//!
//! Signing is opt-in per workspace. Once a signing key exists:
//!
//! - entering `approved` stores `content_hash` and an Ed25519
//!   `approval_signature` over that hash, produced with the password-sealed
//!   key. No password, no approval.
//! - leaving `approved` for `posted` recomputes the hash and checks the
//!   signature. A body edited after approval is reported as
//!   [`ContentError::Tamper`]; a signature that does not check out is
//!   [`ContentError::Signature`]. Neither ever reaches an adapter.
//!
//! Without a key the gate is skipped, unless `require_signing` is set, in
//! which case approving and posting fail with [`ContentError::MissingKey`].
//!
//! Every write is a whole-file atomic replace. A failed approval or post
//! leaves the item exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::error::{ContentError, StateError};
use super::item::{file_name, ApprovalMode, ContentItem, Frontmatter};
use super::status::Status;
use super::thread::{Actor, EntryKind, FeedbackThread, ThreadEntry};
use crate::adapter::{PostOptions, PostingAdapter};
use crate::fs::{atomic_create, make_read_only, Access};
use crate::notify::{ContentEvent, EventKind, Notifier};
use crate::signer::{self, ContentHash};
use crate::workspace::WorkspaceContext;

const ITEM_EXTENSION: &str = "md";

/// What a state-changing call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The item was rewritten. `from` and `to` may be equal when only the
    /// payload changed (new feedback, a new revision, a re-approval).
    Applied { from: Status, to: Status },
    /// Nothing was written; the item already was in this state.
    Unchanged(Status),
}

/// The human behind an approval
#[derive(Debug, Clone)]
pub struct Approver {
    pub name: String,
    /// A human is at a terminal.
    pub interactive: bool,
    /// Skip the interactive check. Recorded on the item.
    pub forced: bool,
}

impl Approver {
    fn actor(&self) -> Actor {
        Actor::human(self.name.clone())
    }

    fn mode(&self) -> ApprovalMode {
        if self.interactive {
            ApprovalMode::Interactive
        } else {
            ApprovalMode::Forced
        }
    }
}

/// What the gate established about an approved item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub item: String,
    pub platform: String,
    pub content_hash: ContentHash,
    /// Fingerprint of the key the signature verified against, or `None`
    /// when the workspace has no signing key.
    pub signed_by: Option<String>,
    pub approved_by: Option<String>,
    pub approval_mode: Option<ApprovalMode>,
}

/// An approved item that passed the gate
///
/// Only [`ContentStateMachine`] can construct one, so holding a
/// `VerifiedContent` is proof the checks ran.
#[derive(Debug, Clone)]
pub struct VerifiedContent {
    item: ContentItem,
    report: GateReport,
}

impl VerifiedContent {
    pub fn item(&self) -> &ContentItem {
        &self.item
    }

    pub fn body(&self) -> &str {
        &self.item.body
    }

    pub fn platform(&self) -> &str {
        &self.item.meta.platform
    }

    pub fn meta(&self) -> &Frontmatter {
        &self.item.meta
    }

    pub fn hash(&self) -> ContentHash {
        self.report.content_hash
    }

    pub fn report(&self) -> &GateReport {
        &self.report
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostReport {
    /// Gate and validation passed; nothing was published.
    DryRun {
        report: GateReport,
        warnings: Vec<String>,
    },
    Posted {
        report: GateReport,
        archived: PathBuf,
        url: Option<String>,
        warnings: Vec<String>,
    },
}

/// One row of `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub name: String,
    pub path: PathBuf,
    pub platform: String,
    pub status: Status,
    pub archived: bool,
    pub approved_by: Option<String>,
}

pub struct ContentStateMachine<'a> {
    ctx: &'a WorkspaceContext,
    notifier: &'a dyn Notifier,
}

impl<'a> ContentStateMachine<'a> {
    pub fn new(ctx: &'a WorkspaceContext, notifier: &'a dyn Notifier) -> Self {
        Self { ctx, notifier }
    }

    /// Write a new `draft` item to `drafts/<name>.md`.
    pub fn create_draft(
        &self,
        name: &str,
        platform: &str,
        body: &str,
        author: &Actor,
    ) -> Result<ContentItem, ContentError> {
        let name = item_file_name(name)?;
        if platform.trim().is_empty() {
            return Err(StateError::InvalidName(platform.to_string()).into());
        }
        if self.ctx.archive_path(&name).exists() {
            return Err(StateError::AlreadyPosted(name).into());
        }

        let path = self.ctx.drafts_dir.join(&name);
        let item = ContentItem::new(&path, Frontmatter::new(platform.trim()), body);
        let rendered = item.render()?;
        atomic_create(&path, rendered.as_bytes(), Access::Default).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ContentError::State(StateError::AlreadyExists(path.clone()))
            } else {
                ContentError::write(&path, e)
            }
        })?;

        tracing::info!(item = %name, platform = %item.meta.platform, "drafted");
        self.emit(EventKind::Drafted, &item, author, None);
        Ok(item)
    }

    /// Load an item that is still allowed to change.
    ///
    /// Anything whose file name is already in the archive is rejected, even
    /// if a stray copy is still lying around under that name.
    pub fn load(&self, path: &Path) -> Result<ContentItem, ContentError> {
        let name = file_name(path);
        if name.is_empty() {
            return Err(StateError::InvalidName(path.display().to_string()).into());
        }
        if self.ctx.archive_path(&name).exists() {
            return Err(StateError::AlreadyPosted(name).into());
        }
        let item = ContentItem::load(path)?;
        if item.status() == Status::Posted {
            return Err(StateError::AlreadyPosted(name).into());
        }
        Ok(item)
    }

    /// Record reviewer feedback: `draft`/`revised` -> `reviewed`.
    pub fn review(
        &self,
        path: &Path,
        reviewer: &Actor,
        feedback: &str,
    ) -> Result<Transition, ContentError> {
        let mut item = self.load(path)?;
        let from = item.status();

        match from {
            Status::Reviewed if item.meta.review_feedback.as_deref() == Some(feedback) => {
                return Ok(Transition::Unchanged(from));
            }
            Status::Reviewed => {}
            _ if from.can_transition(Status::Reviewed) => {}
            _ => return Err(illegal(&item, Status::Reviewed)),
        }

        item.meta.status = Status::Reviewed;
        item.meta.review_feedback = Some(feedback.to_string());
        item.save()?;

        self.record(&item, reviewer, EntryKind::Feedback, feedback);
        tracing::info!(item = %item.name(), %from, reviewer = %reviewer.name, "reviewed");
        self.emit(EventKind::Reviewed, &item, reviewer, Some(feedback));
        Ok(Transition::Applied {
            from,
            to: Status::Reviewed,
        })
    }

    /// The agent addressed feedback: `reviewed` -> `revised`.
    ///
    /// `body` replaces the content when given. Revising an already revised
    /// item with a new body rewrites it in place.
    pub fn revise(
        &self,
        path: &Path,
        agent: &Actor,
        body: Option<&str>,
        note: Option<&str>,
    ) -> Result<Transition, ContentError> {
        let mut item = self.load(path)?;
        let from = item.status();
        let body_changes = body.is_some_and(|b| b != item.body);

        match from {
            Status::Revised if !body_changes => return Ok(Transition::Unchanged(from)),
            Status::Revised => {}
            _ if from.can_transition(Status::Revised) => {}
            _ => return Err(illegal(&item, Status::Revised)),
        }

        item.meta.status = Status::Revised;
        if let Some(body) = body {
            item.body = body.to_string();
        }
        item.save()?;

        if let Some(note) = note {
            self.record(&item, agent, EntryKind::Note, note);
        }
        tracing::info!(item = %item.name(), %from, "revised");
        self.emit(EventKind::Revised, &item, agent, note);
        Ok(Transition::Applied {
            from,
            to: Status::Revised,
        })
    }

    /// Human approval: `draft`/`reviewed`/`revised` -> `approved`.
    ///
    /// With a signing key, `password` unlocks it and the body is signed. An
    /// already approved item whose approval still holds is left alone; one
    /// whose body changed since is re-approved.
    pub fn approve(
        &self,
        path: &Path,
        approver: &Approver,
        password: Option<&str>,
    ) -> Result<Transition, ContentError> {
        let mut item = self.load(path)?;
        let from = item.status();

        if !approver.interactive && !approver.forced {
            return Err(StateError::RequiresHuman.into());
        }

        if from == Status::Approved {
            if self.approval_holds(&item)? {
                return Ok(Transition::Unchanged(from));
            }
            tracing::warn!(item = %item.name(), "approval no longer matches content; re-approving");
        } else if !from.can_transition(Status::Approved) {
            return Err(illegal(&item, Status::Approved));
        }

        let vault = self.ctx.vault();
        let signing = vault.is_enabled();
        if !signing && self.ctx.config.require_signing {
            return Err(ContentError::MissingKey);
        }

        let hash = signer::hash(item.body.as_bytes());
        let signature = if signing {
            let password = password.ok_or(ContentError::PasswordRequired)?;
            let key = vault.unlock(password)?;
            Some(signer::sign(item.body.as_bytes(), &key))
        } else {
            tracing::info!(item = %item.name(), "no signing key; approval is unsigned");
            None
        };

        let mode = approver.mode();
        if mode == ApprovalMode::Forced {
            tracing::warn!(
                item = %item.name(),
                approver = %approver.name,
                "approval forced without an interactive terminal"
            );
        }

        item.meta.status = Status::Approved;
        item.meta.approved_by = Some(approver.name.clone());
        item.meta.approved_at = Some(Utc::now());
        item.meta.approval_mode = Some(mode);
        item.meta.content_hash = Some(hash.to_string());
        item.meta.approval_signature = signature;
        item.save()?;

        let actor = approver.actor();
        let message = match mode {
            ApprovalMode::Interactive => format!("approved {}", hash),
            ApprovalMode::Forced => format!("approved {} (forced)", hash),
        };
        self.record(&item, &actor, EntryKind::Approved, &message);
        tracing::info!(item = %item.name(), %from, approver = %approver.name, signed = signing, "approved");
        self.emit(EventKind::Approved, &item, &actor, None);
        Ok(Transition::Applied {
            from,
            to: Status::Approved,
        })
    }

    fn approval_holds(&self, item: &ContentItem) -> Result<bool, ContentError> {
        match self.gate(item.clone()) {
            Ok(_) => Ok(true),
            Err(ContentError::Tamper { .. } | ContentError::Signature(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The pre-post gate, without posting.
    pub fn verify(&self, path: &Path) -> Result<VerifiedContent, ContentError> {
        let item = self.load(path)?;
        self.gate(item)
    }

    fn gate(&self, item: ContentItem) -> Result<VerifiedContent, ContentError> {
        let name = item.name();
        if item.status() != Status::Approved {
            return Err(StateError::NotApproved {
                name,
                status: item.status(),
            }
            .into());
        }

        let actual = signer::hash(item.body.as_bytes());
        let signed_by = match self.ctx.vault().load_public_key()? {
            None if self.ctx.config.require_signing => return Err(ContentError::MissingKey),
            None => {
                tracing::debug!(item = %name, "no signing key; gate skipped");
                None
            }
            Some(public_key) => {
                let recorded = item
                    .meta
                    .content_hash
                    .as_deref()
                    .ok_or_else(|| ContentError::Signature("no content hash recorded".into()))?;
                let expected: ContentHash = recorded.parse().map_err(|_| {
                    ContentError::Signature(format!("recorded content hash '{}' is malformed", recorded))
                })?;

                // hash first: an edited body is tamper, whatever the signature says
                if expected != actual {
                    tracing::warn!(item = %name, %expected, %actual, "content changed after approval");
                    return Err(ContentError::Tamper {
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }

                let signature = item
                    .meta
                    .approval_signature
                    .as_deref()
                    .ok_or_else(|| ContentError::Signature("no approval signature recorded".into()))?;
                if !signer::verify(item.body.as_bytes(), signature, &public_key) {
                    tracing::warn!(item = %name, "approval signature does not verify");
                    return Err(ContentError::Signature(
                        "it does not verify against this workspace's signing key".into(),
                    ));
                }
                Some(public_key.fingerprint())
            }
        };

        let report = GateReport {
            item: name,
            platform: item.meta.platform.clone(),
            content_hash: actual,
            signed_by,
            approved_by: item.meta.approved_by.clone(),
            approval_mode: item.meta.approval_mode,
        };
        Ok(VerifiedContent { item, report })
    }

    /// Gate, validate, publish, archive.
    ///
    /// Nothing on disk changes unless the adapter reports success. After
    /// that the working copy is marked posted first, so no later call can
    /// publish it again, then written read-only to `posted/` and removed.
    pub fn post(
        &self,
        path: &Path,
        adapter: &dyn PostingAdapter,
        options: &PostOptions,
        actor: &Actor,
    ) -> Result<PostReport, ContentError> {
        let verified = self.verify(path)?;
        let platform = verified.platform().to_string();

        if adapter.platform() != platform {
            return Err(ContentError::Rejected {
                platform,
                errors: vec![format!(
                    "adapter posts to '{}', item is for '{}'",
                    adapter.platform(),
                    verified.platform()
                )],
            });
        }

        let validation = adapter.validate(&verified);
        if !validation.valid {
            return Err(ContentError::Rejected {
                platform,
                errors: validation.errors,
            });
        }
        for warning in &validation.warnings {
            tracing::warn!(item = %verified.report.item, %platform, "{}", warning);
        }

        if options.dry_run {
            tracing::info!(item = %verified.report.item, "dry run; not posting");
            return Ok(PostReport::DryRun {
                report: verified.report,
                warnings: validation.warnings,
            });
        }

        let outcome = adapter
            .post(&verified, options)
            .map_err(|e| ContentError::PostFailed {
                platform: platform.clone(),
                reason: format!("{:#}", e),
            })?;
        if !outcome.success {
            return Err(ContentError::PostFailed {
                platform,
                reason: outcome
                    .error
                    .unwrap_or_else(|| "adapter reported failure".to_string()),
            });
        }

        let VerifiedContent { item, report } = verified;

        // the post is public now; the thread says so even if archiving fails
        let message = match &outcome.url {
            Some(url) => format!("posted to {} at {}", platform, url),
            None => format!("posted to {}", platform),
        };
        self.record(&item, actor, EntryKind::Posted, &message);

        let archived = self.archive(item, outcome.url.clone()).map_err(|reason| {
            tracing::error!(item = %report.item, %platform, "posted but not archived: {}", reason);
            ContentError::Archive {
                platform: platform.clone(),
                url: outcome.url.clone(),
                reason,
            }
        })?;
        tracing::info!(item = %report.item, %platform, url = ?outcome.url, "posted");
        self.emit(EventKind::Posted, &archived, actor, outcome.url.as_deref());

        Ok(PostReport::Posted {
            report,
            archived: archived.path,
            url: outcome.url,
            warnings: validation.warnings,
        })
    }

    /// Move a published item into the archive. Errors are plain reasons,
    /// since the post itself already happened.
    fn archive(&self, mut item: ContentItem, url: Option<String>) -> Result<ContentItem, String> {
        let name = item.name();
        let source = item.path.clone();
        let target = self.ctx.archive_path(&name);

        item.meta.status = Status::Posted;
        item.meta.posted_at = Some(Utc::now());
        item.meta.post_url = url;

        // a posted working copy is refused by `load`, whatever happens next
        if let Err(e) = item.save() {
            tracing::warn!(item = %name, "failed to mark working copy posted: {}", e);
        }

        item.path = target.clone();
        let rendered = item.render().map_err(|e| e.to_string())?;
        atomic_create(&target, rendered.as_bytes(), Access::Default)
            .map_err(|e| format!("{}: {}", target.display(), e))?;
        if let Err(e) = make_read_only(&target) {
            tracing::warn!(path = %target.display(), "failed to lock archived item: {}", e);
        }

        // the archive copy is authoritative from here on; a leftover working
        // copy is rejected by `load`
        if let Err(e) = fs::remove_file(&source) {
            tracing::warn!(path = %source.display(), "failed to remove posted working copy: {}", e);
        }
        Ok(item)
    }

    /// Append a note to the item's thread without changing its state.
    pub fn note(
        &self,
        path: &Path,
        author: &Actor,
        message: &str,
    ) -> Result<ThreadEntry, ContentError> {
        let item = self.load(path)?;
        let thread = FeedbackThread::for_item(&self.ctx.threads_dir, &item.name());
        let entry = ThreadEntry::new(author, EntryKind::Note, message);
        thread
            .append(&entry)
            .map_err(|e| ContentError::write(thread.path(), e))?;
        self.emit(EventKind::Noted, &item, author, Some(message));
        Ok(entry)
    }

    /// The feedback thread of an item, posted or not
    pub fn thread(&self, path: &Path) -> Result<Vec<ThreadEntry>, ContentError> {
        let name = file_name(path);
        let thread = FeedbackThread::for_item(&self.ctx.threads_dir, &name);
        thread
            .entries()
            .map_err(|e| ContentError::read(thread.path(), e))
    }

    /// Every item in `drafts/` and `posted/`, sorted by name.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn list(&self) -> Result<Vec<ItemSummary>, ContentError> {
        let mut items = Vec::new();
        for (dir, archived) in [(&self.ctx.drafts_dir, false), (&self.ctx.archive_dir, true)] {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ContentError::read(dir, e)),
            };
            for entry in entries {
                let path = entry.map_err(|e| ContentError::read(dir, e))?.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ITEM_EXTENSION) {
                    continue;
                }
                match ContentItem::load(&path) {
                    Ok(item) => items.push(ItemSummary {
                        name: item.name(),
                        platform: item.meta.platform.clone(),
                        status: item.status(),
                        approved_by: item.meta.approved_by.clone(),
                        path,
                        archived,
                    }),
                    Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable item: {}", e),
                }
            }
        }
        items.sort_by(|a, b| (a.archived, &a.name).cmp(&(b.archived, &b.name)));
        Ok(items)
    }

    /// Best-effort thread entry for a transition that already happened
    fn record(&self, item: &ContentItem, actor: &Actor, kind: EntryKind, message: &str) {
        let thread = FeedbackThread::for_item(&self.ctx.threads_dir, &item.name());
        if let Err(e) = thread.append(&ThreadEntry::new(actor, kind, message)) {
            tracing::warn!(thread = %thread.path().display(), "failed to append thread entry: {}", e);
        }
    }

    fn emit(&self, kind: EventKind, item: &ContentItem, actor: &Actor, message: Option<&str>) {
        self.notifier.notify(ContentEvent {
            kind,
            item: item.name(),
            path: item.path.clone(),
            status: item.status(),
            actor: actor.name.clone(),
            message: message.map(str::to_string),
            at: Utc::now(),
        });
    }
}

fn illegal(item: &ContentItem, to: Status) -> ContentError {
    if item.status() == Status::Posted {
        return StateError::AlreadyPosted(item.name()).into();
    }
    StateError::Illegal {
        name: item.name(),
        from: item.status(),
        to,
    }
    .into()
}

/// `name` as a plain `.md` file name
fn item_file_name(name: &str) -> Result<String, ContentError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\'])
        || trimmed.chars().any(char::is_control);
    if invalid {
        return Err(StateError::InvalidName(name.to_string()).into());
    }
    if Path::new(trimmed).extension().and_then(|e| e.to_str()) == Some(ITEM_EXTENSION) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}.{}", trimmed, ITEM_EXTENSION))
    }
}

//! Content items, their lifecycle and the approval gate
//!
//! - [`status`]: the five lifecycle states and which moves are legal
//! - [`item`]: Markdown + YAML frontmatter persistence
//! - [`thread`]: the append-only feedback log per item
//! - [`machine`]: transitions, signing on approve, verification before post

mod error;
mod item;
mod machine;
mod status;
mod thread;

pub use error::{ContentError, StateError};
pub use item::{ApprovalMode, ContentItem, Frontmatter};
pub use machine::{
    Approver, ContentStateMachine, GateReport, ItemSummary, PostReport, Transition,
    VerifiedContent,
};
pub use status::Status;
pub use thread::{Actor, EntryKind, FeedbackThread, Role, ThreadEntry};

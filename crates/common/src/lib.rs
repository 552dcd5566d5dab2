/**
 * Ports for the platform code that publishes
 *  a verified post.
 */
pub mod adapter;
/**
 * Content items and their lifecycle.
 *  The state machine and approval gate live here.
 */
pub mod content;
/**
 * Cryptographic types and operations.
 *  - Password sealed envelopes
 *  - Ed25519 signing keys
 */
pub mod crypto;
/**
 * Atomic, optionally owner-only, file writes.
 */
pub mod fs;
/**
 * Fire-and-forget event notification.
 */
pub mod notify;
/**
 * Capability for reading a password without echo,
 *  plus the per-invocation session that caches it.
 */
pub mod prompt;
/**
 * Encrypted-at-rest platform credentials and
 *  packed profile directories.
 */
pub mod secrets;
pub mod signer;
/**
 * The sealed workspace signing key.
 */
pub mod vault;
/**
 * Resolved workspace paths and configuration.
 */
pub mod workspace;

pub mod prelude {
    pub use crate::adapter::{PostOptions, PostOutcome, PostingAdapter, Validation};
    pub use crate::content::{
        Actor, Approver, ContentError, ContentItem, ContentStateMachine, StateError, Status,
        Transition, VerifiedContent,
    };
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::notify::{EventDispatcher, Notifier};
    pub use crate::prompt::{SecretPrompt, Session};
    pub use crate::secrets::{SecretId, SecretStore};
    pub use crate::vault::KeyVault;
    pub use crate::workspace::{WorkspaceConfig, WorkspaceContext};
}

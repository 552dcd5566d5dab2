//! Cryptographic primitives for postgate
//!
//! This module provides the cryptographic foundation for the approval gate:
//!
//! - **Sealing**: Argon2id password derivation + AES-256-GCM in [`Envelope`]s.
//!   Every secret the tool persists (the signing key, platform credentials,
//!   packed profile directories) lives inside one.
//! - **Identity**: one Ed25519 keypair per workspace (`SecretKey`/`PublicKey`).
//!   The public key is cleartext; the secret key is only ever sealed.
//!
//! # Security Model
//!
//! A password never touches disk. It is stretched with Argon2id under a fresh
//! random salt for each envelope, and the resulting key encrypts exactly one
//! payload under a fresh random IV. Authentication failure on open is
//! reported as a single [`EnvelopeError::Auth`] whether the password was
//! wrong or the bytes were modified.

mod envelope;
mod kdf;
mod keys;

pub(crate) use envelope::b64;
pub use ed25519_dalek::Signature;
pub use envelope::{Envelope, EnvelopeError, IV_SIZE, TAG_SIZE};
pub use kdf::{KdfError, KdfParams, DERIVED_KEY_SIZE, SALT_SIZE};
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

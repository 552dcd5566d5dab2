//! Password-based key derivation using Argon2id
//!
//! The parameters travel with every envelope so that a file sealed under one
//! work factor can still be opened after the workspace default changes.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Size of the derived symmetric key in bytes (256 bits)
pub const DERIVED_KEY_SIZE: usize = 32;
/// Size of the random salt fed to the KDF
pub const SALT_SIZE: usize = 16;

/// Argon2id memory cost in KiB (64 MB)
pub const DEFAULT_MEMORY_KIB: u32 = 65536;
/// Argon2id iteration count
pub const DEFAULT_ITERATIONS: u32 = 3;
/// Argon2id parallelism (lanes)
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Largest memory cost accepted from a file (1 GiB)
pub const MAX_MEMORY_KIB: u32 = 1024 * 1024;
/// Largest iteration count accepted from a file
pub const MAX_ITERATIONS: u32 = 64;
/// Largest lane count accepted from a file
pub const MAX_PARALLELISM: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum KdfError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("key derivation failed: {0}")]
    Derive(argon2::Error),
    #[error("argon2 cost {0:?} exceeds the accepted ceiling")]
    TooExpensive(KdfParams),
}

/// Argon2id work factor.
///
/// The default costs roughly a few hundred milliseconds on a laptop, which is
/// fine for an interactive prompt and expensive for offline guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    DEFAULT_MEMORY_KIB
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl KdfParams {
    pub fn within_ceiling(&self) -> bool {
        self.memory_kib <= MAX_MEMORY_KIB
            && self.iterations <= MAX_ITERATIONS
            && self.parallelism <= MAX_PARALLELISM
    }

    /// Derive a 256-bit key from `password` and `salt`.
    ///
    /// The returned buffer is wiped when dropped.
    pub fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; DERIVED_KEY_SIZE]>, KdfError> {
        // params come from files on disk; never let one pin the CPU or memory
        if !self.within_ceiling() {
            return Err(KdfError::TooExpensive(*self));
        }
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DERIVED_KEY_SIZE),
        )
        .map_err(KdfError::Params)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; DERIVED_KEY_SIZE]);
        argon2
            .hash_password_into(password, salt, &mut key[..])
            .map_err(KdfError::Derive)?;

        Ok(key)
    }
}

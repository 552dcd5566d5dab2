//! Capability for asking a human for a secret
//!
//! The core never touches terminal modes. Whoever drives it (the CLI, a
//! desktop shell, a test) supplies a [`SecretPrompt`].

use std::io;

use parking_lot::Mutex;
use zeroize::Zeroizing;

pub trait SecretPrompt: Send + Sync {
    /// Read a line without echoing it
    fn read_hidden(&self, prompt: &str) -> io::Result<Zeroizing<String>>;

    /// Whether a human is plausibly on the other end
    fn is_interactive(&self) -> bool;
}

/// Per-invocation password cache
///
/// Lets one command (approve, then post) ask for the password once. The
/// cached value is wiped when the session is dropped.
#[derive(Default)]
pub struct Session {
    password: Mutex<Option<Zeroizing<String>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("unlocked", &self.password.lock().is_some())
            .finish()
    }
}

impl Session {
    /// The cached password, prompting for it the first time
    pub fn password(
        &self,
        prompt: &dyn SecretPrompt,
        message: &str,
    ) -> io::Result<Zeroizing<String>> {
        let mut cached = self.password.lock();
        if let Some(password) = cached.as_ref() {
            return Ok(password.clone());
        }
        let password = prompt.read_hidden(message)?;
        *cached = Some(password.clone());
        Ok(password)
    }

    /// Forget the cached password, e.g. after it turned out to be wrong
    pub fn forget(&self) {
        *self.password.lock() = None;
    }
}

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zeroize::Zeroizing;

use common::content::{Approver, ContentError};
use common::notify::EventReceiver;
use common::prompt::SecretPrompt;
use common::workspace::{WorkspaceContext, WorkspaceError};

use crate::notify::CommandNotifier;

/// How many times a wrong password is asked for again
pub const PASSWORD_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct OpContext {
    /// Workspace root (the current directory unless `--workspace` is given)
    pub root: PathBuf,
    /// Where passwords come from
    pub prompt: Arc<dyn SecretPrompt>,
}

impl std::fmt::Debug for OpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpContext").field("root", &self.root).finish()
    }
}

impl OpContext {
    pub fn new(root: PathBuf, prompt: Arc<dyn SecretPrompt>) -> Self {
        Self { root, prompt }
    }

    pub fn workspace(&self) -> Result<WorkspaceContext, WorkspaceError> {
        WorkspaceContext::load(&self.root)
    }

    /// Resolve an item path given on the command line against the root
    pub fn item_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// The session password, prompting on first use
    pub fn password(&self, ws: &WorkspaceContext, message: &str) -> io::Result<Zeroizing<String>> {
        ws.session().password(self.prompt.as_ref(), message)
    }

    /// Read a new password twice and insist both match
    pub fn new_password(&self, message: &str) -> Result<Zeroizing<String>, PasswordError> {
        let first = self.prompt.read_hidden(message)?;
        if first.is_empty() {
            return Err(PasswordError::Empty);
        }
        let second = self.prompt.read_hidden("Repeat password: ")?;
        if first != second {
            return Err(PasswordError::Mismatch);
        }
        Ok(first)
    }

    pub fn approver(&self, ws: &WorkspaceContext, force: bool) -> Approver {
        Approver {
            name: ws.approver_name(),
            interactive: self.prompt.is_interactive(),
            forced: force,
        }
    }

    /// Run `f` with the session password, asking again after a wrong one
    pub fn with_password<T>(
        &self,
        ws: &WorkspaceContext,
        message: &str,
        mut f: impl FnMut(&str) -> Result<T, ContentError>,
    ) -> Result<T, ContentOpError> {
        let attempts = if self.prompt.is_interactive() {
            PASSWORD_ATTEMPTS
        } else {
            1
        };
        for attempt in 1..=attempts {
            let password = self.password(ws, message)?;
            match f(&password) {
                Err(ContentError::Auth) if attempt < attempts => {
                    ws.session().forget();
                    eprintln!("Wrong password, try again.");
                }
                result => return result.map_err(ContentOpError::from),
            }
        }
        Err(ContentOpError::Content(ContentError::Auth))
    }

    /// Hand whatever the state machine queued to the notify command
    pub fn deliver(&self, ws: &WorkspaceContext, events: &EventReceiver) {
        let events = events.drain();
        if let Some(notifier) = CommandNotifier::new(ws.config.notify_command.as_ref()) {
            notifier.deliver(events);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,
    #[error("passwords do not match")]
    Mismatch,
    #[error("failed to read password: {0}")]
    Io(#[from] io::Error),
}

/// Failure of a command that works on content items
#[derive(Debug, thiserror::Error)]
pub enum ContentOpError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("failed to read password: {0}")]
    Prompt(#[from] io::Error),
    #[error("failed to read {path}: {source}")]
    Input { path: PathBuf, source: io::Error },
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
pub mod testkit {
    //! Scripted prompt and workspace fixture for op tests

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use common::crypto::KdfParams;
    use common::workspace::WorkspaceConfig;
    use tempfile::TempDir;

    pub struct ScriptedPrompt {
        answers: Mutex<VecDeque<String>>,
        interactive: bool,
    }

    impl ScriptedPrompt {
        pub fn new(answers: &[&str], interactive: bool) -> Self {
            Self {
                answers: Mutex::new(answers.iter().map(|s| s.to_string()).collect()),
                interactive,
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.lock().unwrap().len()
        }
    }

    impl SecretPrompt for ScriptedPrompt {
        fn read_hidden(&self, _prompt: &str) -> io::Result<Zeroizing<String>> {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .map(Zeroizing::new)
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers"))
        }

        fn is_interactive(&self) -> bool {
            self.interactive
        }
    }

    /// An initialized workspace with cheap key derivation
    pub fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let config = WorkspaceConfig {
            approver: Some("alice".into()),
            secrets_dir: Some(dir.path().join("secrets")),
            kdf: KdfParams {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            ..Default::default()
        };
        WorkspaceContext::init(dir.path(), Some(config)).unwrap();
        dir
    }

    pub fn context(dir: &TempDir, prompt: ScriptedPrompt) -> (OpContext, Arc<ScriptedPrompt>) {
        let prompt = Arc::new(prompt);
        (OpContext::new(dir.path().to_path_buf(), prompt.clone()), prompt)
    }
}

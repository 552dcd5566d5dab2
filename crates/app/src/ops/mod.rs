pub mod approve;
pub mod draft;
pub mod init;
pub mod key;
pub mod note;
pub mod post;
pub mod review;
pub mod revise;
pub mod secret;
pub mod status;
pub mod thread;
pub mod verify;
pub mod version;

pub use approve::Approve;
pub use draft::Draft;
pub use init::Init;
pub use key::Key;
pub use note::Note;
pub use post::Post;
pub use review::Review;
pub use revise::Revise;
pub use secret::Secret;
pub use status::Status;
pub use thread::Thread;
pub use verify::Verify;
pub use version::Version;

use std::path::Path;

use common::content::Transition;

use crate::op::ContentOpError;

/// One-line summary of what a transition did to `path`
pub(crate) fn describe(path: &Path, transition: &Transition) -> String {
    match transition {
        Transition::Applied { from, to } if from == to => {
            format!("{}: updated ({})", path.display(), to)
        }
        Transition::Applied { from, to } => format!("{}: {} -> {}", path.display(), from, to),
        Transition::Unchanged(status) => format!("{}: already {}", path.display(), status),
    }
}

pub(crate) fn read_input(path: &Path) -> Result<String, ContentOpError> {
    std::fs::read_to_string(path).map_err(|source| ContentOpError::Input {
        path: path.to_path_buf(),
        source,
    })
}

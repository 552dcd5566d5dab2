//! Crash-safe file writes
//!
//! Everything the gate persists goes through here: write to a temporary file
//! in the destination directory, flush, then rename over the target. A reader
//! sees either the old file or the new one, never a torn write, and an
//! interrupted process leaves at most a stray temp file behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Who may read the written file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Mode 0600 on unix. Used for keys and secrets.
    OwnerOnly,
    /// Mode 0644 on unix: anyone may read, only the owner writes.
    Default,
}

fn temp_in(path: &Path) -> io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    NamedTempFile::new_in(parent)
}

fn fill(tmp: &mut NamedTempFile, contents: &[u8], access: Access) -> io::Result<()> {
    set_mode(tmp.path(), access)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()
}

/// Atomically replace `path` with `contents`.
pub fn atomic_write(path: &Path, contents: &[u8], access: Access) -> io::Result<()> {
    let mut tmp = temp_in(path)?;
    fill(&mut tmp, contents, access)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically create `path` with `contents`, failing with
/// [`io::ErrorKind::AlreadyExists`] if something is already there.
pub fn atomic_create(path: &Path, contents: &[u8], access: Access) -> io::Result<()> {
    let mut tmp = temp_in(path)?;
    fill(&mut tmp, contents, access)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

/// Drop write permission on `path`.
pub fn make_read_only(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
}

// temp files start out 0600, so both modes are set explicitly
#[cfg(unix)]
fn set_mode(path: &Path, access: Access) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = match access {
        Access::OwnerOnly => 0o600,
        Access::Default => 0o644,
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _access: Access) -> io::Result<()> {
    Ok(())
}

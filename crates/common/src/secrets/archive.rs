//! Packing a directory tree into a single byte stream and back
//!
//! Pure, reversible transform with no cryptographic role: the secret store
//! seals whatever bytes this produces.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("archive entry escapes target directory: {0}")]
    UnsafeEntry(String),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Pack every regular file and directory under `root`.
///
/// Entry names are relative to `root` and use `/` separators. Symlinks and
/// other special files are skipped.
pub fn pack_dir(root: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !root.is_dir() {
        return Err(ArchiveError::NotADirectory(root.to_path_buf()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = fs::read_dir(&dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let file_type = entry.file_type()?;
            let name = entry_name(root, &path);

            if file_type.is_dir() {
                writer.add_directory(format!("{}/", name), options)?;
                stack.push(path);
            } else if file_type.is_file() {
                writer.start_file(name, options)?;
                writer.write_all(&fs::read(&path)?)?;
            } else {
                tracing::debug!(path = %path.display(), "skipping special file while packing");
            }
        }
    }

    Ok(writer.finish()?.into_inner())
}

fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Unpack `bytes` into `target`, which must not exist yet.
///
/// Extraction happens in a temporary sibling directory that is renamed into
/// place only once every entry has been written, so a failure never leaves a
/// partially restored tree at `target`.
pub fn unpack_dir(bytes: &[u8], target: &Path) -> Result<(), ArchiveError> {
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        )
        .into());
    }

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".restore-")
        .tempdir_in(parent)?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut seen = BTreeSet::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let relative = file
            .enclosed_name()
            .filter(|p| p.components().all(|c| matches!(c, Component::Normal(_))))
            .ok_or_else(|| ArchiveError::UnsafeEntry(file.name().to_string()))?;
        if !seen.insert(relative.clone()) {
            continue;
        }

        let out = staging.path().join(&relative);
        if file.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(dir) = out.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)?;
        fs::write(&out, contents)?;
    }

    // on failure the staging dir is removed when it drops
    fs::rename(staging.path(), target)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("Default").join("Cache")).unwrap();
        fs::write(root.join("Local State"), b"{\"profile\":1}").unwrap();
        fs::write(root.join("Default").join("Cookies"), vec![0u8, 1, 2, 255]).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
    }

    #[test]
    fn test_pack_unpack_tree() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("profile");
        populate(&source);

        let bytes = pack_dir(&source).unwrap();
        let restored = dir.path().join("restored");
        unpack_dir(&bytes, &restored).unwrap();

        assert_eq!(
            fs::read(restored.join("Local State")).unwrap(),
            b"{\"profile\":1}"
        );
        assert_eq!(
            fs::read(restored.join("Default").join("Cookies")).unwrap(),
            vec![0u8, 1, 2, 255]
        );
        assert!(restored.join("Default").join("Cache").is_dir());
        assert!(restored.join("empty").is_dir());
    }

    #[test]
    fn test_pack_requires_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            pack_dir(&file),
            Err(ArchiveError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_unpack_refuses_existing_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("profile");
        populate(&source);
        let bytes = pack_dir(&source).unwrap();

        assert!(unpack_dir(&bytes, &source).is_err());
    }

    #[test]
    fn test_unpack_garbage_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("restored");

        assert!(unpack_dir(b"definitely not a zip", &target).is_err());
        assert!(!target.exists());
        // staging directory is cleaned up too
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unpack_rejects_traversal() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("../escape.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"boom").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("restored");
        assert!(matches!(
            unpack_dir(&bytes, &target),
            Err(ArchiveError::UnsafeEntry(_))
        ));
        assert!(!target.exists());
        assert!(!dir.path().join("escape.txt").exists());
    }
}

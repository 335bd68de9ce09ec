// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem operations for tool artifacts.
//!
//! Secret-bearing files are created with `create_new`, so an existing file
//! is never overwritten, and with mode `0600` on unix.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

/// Error type for artifact storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io { path: PathBuf, source: io::Error },
    /// JSON serialization/deserialization error
    Json { path: PathBuf, source: serde_json::Error },
    /// Target file already exists
    AlreadyExists(PathBuf),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io { path, source } => {
                write!(f, "I/O error on {}: {source}", path.display())
            }
            StorageError::Json { path, source } => {
                write!(f, "JSON error in {}: {source}", path.display())
            }
            StorageError::AlreadyExists(path) => {
                write!(f, "Refusing to overwrite existing file {}", path.display())
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io { source, .. } => Some(source),
            StorageError::Json { source, .. } => Some(source),
            StorageError::AlreadyExists(_) => None,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> StorageError + '_ {
    move |source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// Create a directory (including parents).
pub fn create_dir(path: impl AsRef<Path>) -> StorageResult<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(io_error(path))
}

/// Write a new text file. Fails if `path` exists.
pub fn write_new_text(path: impl AsRef<Path>, contents: &str) -> StorageResult<()> {
    let path = path.as_ref();

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            StorageError::AlreadyExists(path.to_path_buf())
        } else {
            io_error(path)(e)
        }
    })?;
    file.write_all(contents.as_bytes()).map_err(io_error(path))?;
    file.flush().map_err(io_error(path))?;
    Ok(())
}

/// Read a JSON file and deserialize it.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> StorageResult<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(json_error(path))
}

/// Write a pretty JSON file (atomic write via rename).
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
    let path = path.as_ref();

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            create_dir(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let temp = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(json_error(path))?;
        writer.write_all(b"\n").map_err(io_error(temp.path()))?;
        writer.flush().map_err(io_error(temp.path()))?;
    }

    temp.persist(path).map_err(|e| io_error(path)(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: String,
        value: i32,
    }

    #[test]
    fn write_and_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let data = TestData {
            id: "p-1".to_string(),
            value: 42,
        };

        write_json(&path, &data).unwrap();
        let read: TestData = read_json(&path).unwrap();

        assert_eq!(read, data);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn write_json_leaves_sibling_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payment.json");
        let sibling = dir.path().join("payment.tmp");
        fs::write(&sibling, "keep me").unwrap();

        write_json(&path, &TestData { id: "a".into(), value: 1 }).unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "keep me");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn write_json_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &TestData { id: "a".into(), value: 1 }).unwrap();
        write_json(&path, &TestData { id: "b".into(), value: 2 }).unwrap();

        let read: TestData = read_json(&path).unwrap();
        assert_eq!(read.id, "b");
    }

    #[test]
    fn write_new_text_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.mnemonic");

        write_new_text(&path, "first").unwrap();
        let result = write_new_text(&path, "second");

        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[cfg(unix)]
    #[test]
    fn new_text_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.mnemonic");
        write_new_text(&path, "words").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn read_json_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_json::<TestData>(&path).unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));

        let missing = read_json::<TestData>(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, StorageError::Io { .. }));
    }
}

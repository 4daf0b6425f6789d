//! File system utilities for FileTalk.
//!
//! Shared directories are drop points watched by other processes, so every
//! write here is published atomically: a scanner sees either nothing or the
//! complete file.

pub mod path;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use filetalk_common_core::{Error, ErrorCode, Result};
use tracing::trace;

/// Suffix of in-flight files written by [`write_atomic`].
pub const TEMP_SUFFIX: &str = ".tmp";

fn read_error(path: &Path, e: io::Error, what: &str) -> Error {
    let code = match e.kind() {
        io::ErrorKind::NotFound => ErrorCode::FILE_NOT_FOUND,
        _ => ErrorCode::FILE_READ_ERROR,
    };
    let message = match e.kind() {
        io::ErrorKind::NotFound => format!("file not found: {}", path.display()),
        io::ErrorKind::PermissionDenied => format!("permission denied: {}", path.display()),
        _ => format!("{what}: {}", path.display()),
    };
    Error::io(code, message, path, e)
}

/// Read a file to string with size limit.
pub fn read_to_string(path: impl AsRef<Path>, max_size: usize) -> Result<String> {
    let path = path.as_ref();

    let metadata = fs::metadata(path).map_err(|e| read_error(path, e, "failed to read metadata"))?;

    if metadata.len() > max_size as u64 {
        return Err(Error::FileSystem {
            code: ErrorCode::FILE_READ_ERROR,
            message: format!("file too large: {} bytes (max: {})", metadata.len(), max_size),
            path: Some(path.to_string_lossy().to_string()),
            source: None,
        });
    }

    fs::read_to_string(path).map_err(|e| read_error(path, e, "failed to read file"))
}

/// Path of the hidden temporary sibling used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.file_name() {
        Some(name) => {
            temp_path.set_file_name(format!(".{}{}", name.to_string_lossy(), TEMP_SUFFIX));
        }
        None => temp_path.push(TEMP_SUFFIX),
    }
    temp_path
}

/// Write to a file atomically (write to temp, then rename).
///
/// The parent directory is created if needed. The temporary file is a hidden
/// sibling in the same directory so the final rename never crosses devices.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    ensure_dir(parent)?;

    let temp_path = temp_path_for(path);

    {
        let mut file = File::create(&temp_path).map_err(|e| {
            Error::io(
                ErrorCode::FILE_WRITE_ERROR,
                format!("failed to create temporary file: {}", temp_path.display()),
                &temp_path,
                e,
            )
        })?;

        let written = file.write_all(contents).and_then(|_| file.sync_all());
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(
                ErrorCode::FILE_WRITE_ERROR,
                format!("failed to write temporary file: {}", temp_path.display()),
                &temp_path,
                e,
            ));
        }
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(
            ErrorCode::FILE_WRITE_ERROR,
            format!("failed to rename temporary file to target: {}", path.display()),
            path,
            e,
        )
    })?;

    trace!(path = %path.display(), bytes = contents.len(), "atomic write complete");
    Ok(())
}

/// Write string to file atomically.
pub fn write_string_atomic(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    write_atomic(path, contents.as_bytes())
}

/// Ensure a directory exists, creating parents as needed.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| {
            Error::io(
                ErrorCode::FILE_WRITE_ERROR,
                format!("failed to create directory: {}", path.display()),
                path,
                e,
            )
        })?;
    }
    Ok(())
}

/// Delete a file if it exists. Returns whether a file was removed.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(
            ErrorCode::FILE_WRITE_ERROR,
            format!("failed to remove file: {}", path.display()),
            path,
            e,
        )),
    }
}

/// Move a file into `dir` under `file_name`, creating `dir` if needed.
pub fn move_into(src: impl AsRef<Path>, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf> {
    let src = src.as_ref();
    let dir = dir.as_ref();
    ensure_dir(dir)?;
    let target = dir.join(file_name);
    fs::rename(src, &target).map_err(|e| {
        let code = match e.kind() {
            io::ErrorKind::NotFound => ErrorCode::FILE_NOT_FOUND,
            _ => ErrorCode::FILE_WRITE_ERROR,
        };
        Error::io(
            code,
            format!("failed to move {} to {}", src.display(), target.display()),
            src,
            e,
        )
    })?;
    Ok(target)
}

/// List regular files directly inside a directory, sorted by file name.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let dir_error = |e: io::Error| {
        Error::io(
            ErrorCode::FILE_READ_ERROR,
            format!("failed to read directory: {}", dir.display()),
            dir,
            e,
        )
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Check if a path exists and is a directory.
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.json");

        write_string_atomic(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        write_string_atomic(&path, "world").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "world");

        // No temporary sibling left behind
        assert!(!temp_path_for(&path).exists());
        assert_eq!(list_files(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_atomic_write_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c/out.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/box/abc.json"));
        assert_eq!(temp, PathBuf::from("/box/.abc.json.tmp"));
    }

    #[test]
    fn test_ensure_dir() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("a/b/c");

        ensure_dir(&nested_path).unwrap();
        assert!(nested_path.is_dir());

        ensure_dir(&nested_path).unwrap();
        assert!(nested_path.is_dir());
    }

    #[test]
    fn test_file_not_found() {
        let result = read_to_string("/nonexistent/path", 1024);
        match result.unwrap_err() {
            Error::FileSystem { code, .. } => assert_eq!(code, ErrorCode::FILE_NOT_FOUND),
            other => panic!("Expected FileSystem error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_with_size_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.txt");
        let large_content = "x".repeat(1000);
        fs::write(&path, &large_content).unwrap();

        let result = read_to_string(&path, 500);
        assert!(result.unwrap_err().to_string().contains("file too large"));

        let content = read_to_string(&path, 2000).unwrap();
        assert_eq!(content, large_content);
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        assert!(!remove_file_if_exists(&path).unwrap());

        fs::write(&path, "test").unwrap();
        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_move_into() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("in.json");
        fs::write(&src, "{}").unwrap();

        let target = move_into(&src, dir.path().join("processed"), "done.json").unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(target).unwrap(), "{}");

        let missing = move_into(&src, dir.path().join("processed"), "again.json");
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_files_sorted_and_skips_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("c.json"), "").unwrap();
        fs::write(dir.path().join("a.json"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();

        let names: Vec<_> = list_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.txt", "c.json"]);
    }
}

use filetalk_common_core::{ErrorCategory, ErrorCode, Result};
use filetalk_common_fs as fs;
use std::path::PathBuf;

#[test]
fn test_integration_with_core_types() {
    let result: Result<String> = fs::read_to_string("/nonexistent/file", 1024);
    let error = result.unwrap_err();
    assert_eq!(error.category(), ErrorCategory::FileSystem);
    assert_eq!(error.code(), ErrorCode::FILE_NOT_FOUND);
    assert_eq!(error.path(), Some("/nonexistent/file"));
}

#[test]
fn test_path_normalization_integration() {
    let test_cases = vec![
        ("./a/b/../c", "a/c"),
        ("a/./b", "a/b"),
        ("a/../b", "b"),
        ("../../a/b", "../../a/b"),
        ("a/b/c/../../d", "a/d"),
        ("", "."),
        (".", "."),
        ("..", ".."),
    ];

    for (input, expected) in test_cases {
        let normalized = fs::path::normalize(input);
        assert_eq!(normalized, PathBuf::from(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_write_into_unwritable_location_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let error = fs::write_atomic(blocker.join("msg.json"), b"{}").unwrap_err();
    assert_eq!(error.code(), ErrorCode::FILE_WRITE_ERROR);
}

#[test]
fn test_list_files_missing_dir_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = fs::list_files(dir.path().join("absent")).unwrap_err();
    assert_eq!(error.code(), ErrorCode::FILE_READ_ERROR);
}

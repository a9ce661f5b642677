// src/tools/write_file.rs

use crate::error::WriteFileError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Overwrite `path` with `content`, creating missing parent directories first.
///
/// Nothing is rolled back on failure; a partially written file stays behind
/// and the error is returned to the caller.
pub fn write_file(path: &Path, content: &str) -> Result<(), WriteFileError> {
    let wrap = |source| WriteFileError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, content.as_bytes()).map_err(wrap)?;

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a/b/c/hello.txt");

        write_file(&target, "hi").expect("write");

        assert_eq!(fs::read_to_string(&target).expect("read"), "hi");
    }

    #[test]
    fn overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("same.txt");

        write_file(&target, "first:value\n").expect("first write");
        write_file(&target, "first:value\n").expect("second write");

        assert_eq!(fs::read_to_string(&target).expect("read"), "first:value\n");
    }

    #[test]
    fn reports_failure_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a dir").expect("seed");

        let err = write_file(&blocker.join("child.txt"), "x").expect_err("parent is a file");

        assert_eq!(err.path, blocker.join("child.txt"));
        assert!(err.to_string().contains("child.txt"));
    }
}

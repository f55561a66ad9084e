//! Atomic fresh-file writes.
//!
//! Bodies are written to a uniquely-named temporary file inside the
//! destination directory and renamed into place, so readers only ever see
//! complete files. The rename is the sole visibility point.

use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use super::error::CacheError;

/// World-readable, owner-writable. The front-end server reads these files
/// directly.
const PUBLISHED_FILE_MODE: u32 = 0o644;

/// How a write attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    /// The body was renamed into place and is now visible.
    Committed,
    /// chmod or rename failed after the body was written; the temporary
    /// file was most likely removed by a concurrent invalidation.
    /// Non-fatal.
    LostRace,
}

/// Create `directory` and any missing parents. Already-existing
/// directories, including ones that appear concurrently, are fine.
pub(crate) async fn create_directory(directory: &Path) -> Result<(), CacheError> {
    match fs::create_dir_all(directory).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(CacheError::CreateDirFailed {
            directory: directory.to_path_buf(),
            source,
        }),
    }
}

/// Write `bytes` to `filename` atomically via a temporary file in
/// `directory`. The temporary file never leaves the directory, keeping the
/// final rename on one filesystem.
pub(crate) async fn write_atomic(
    directory: &Path,
    filename: &Path,
    bytes: &[u8],
) -> Result<WriteOutcome, CacheError> {
    create_directory(directory).await?;

    let tmp = directory.join(format!(".tmp-{}", Uuid::new_v4()));
    if let Err(source) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(CacheError::WriteFailed {
            directory: directory.to_path_buf(),
            source,
        });
    }

    match make_visible(&tmp, filename).await {
        Ok(()) => Ok(WriteOutcome::Committed),
        Err(err) => {
            warn!(
                filename = %filename.display(),
                error = %err,
                "could not chmod or rename fresh file; temporary file probably removed by invalidation"
            );
            let _ = fs::remove_file(&tmp).await;
            Ok(WriteOutcome::LostRace)
        }
    }
}

async fn make_visible(tmp: &Path, filename: &Path) -> std::io::Result<()> {
    fs::set_permissions(tmp, std::fs::Permissions::from_mode(PUBLISHED_FILE_MODE)).await?;
    fs::rename(tmp, filename).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_creates_parents_and_body() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("a/b");
        let file = dir.join("page");

        let outcome = write_atomic(&dir, &file, b"hello").await.expect("write");

        assert_eq!(outcome, WriteOutcome::Committed);
        assert_eq!(std::fs::read(&file).expect("read back"), b"hello");
    }

    #[tokio::test]
    async fn write_replaces_existing_content() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().to_path_buf();
        let file = dir.join("page");

        write_atomic(&dir, &file, b"first").await.expect("write");
        write_atomic(&dir, &file, b"second").await.expect("write");

        assert_eq!(std::fs::read(&file).expect("read back"), b"second");
    }

    #[tokio::test]
    async fn write_leaves_no_temporary_files() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().to_path_buf();
        let file = dir.join("page");

        write_atomic(&dir, &file, b"x").await.expect("write");

        let names: Vec<_> = std::fs::read_dir(&dir)
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("page")]);
    }

    #[tokio::test]
    async fn written_file_is_world_readable() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().to_path_buf();
        let file = dir.join("page");

        write_atomic(&dir, &file, b"x").await.expect("write");

        let mode = std::fs::metadata(&file)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn blocked_directory_reports_create_dir_failure() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").expect("write blocker");
        let dir = blocker.join("sub");
        let file = dir.join("page");

        let err = write_atomic(&dir, &file, b"x").await.expect_err("blocked");
        assert!(matches!(err, CacheError::CreateDirFailed { .. }));
    }
}

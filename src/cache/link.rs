//! Hard-link management for the fresh/stale hand-off.
//!
//! A link replaces nothing by itself: each directory entry can be removed
//! or renamed independently of the other, which is what lets the stale
//! tree keep a complete copy while the fresh entry churns.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use super::error::CacheError;
use super::write::create_directory;

/// Tolerances for a link attempt.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LinkOptions {
    /// Remove an existing destination before linking; its absence is fine.
    pub remove_dst: bool,
    /// Silently accept a missing source file.
    pub ignore_missing_src: bool,
    /// Silently accept an already-existing destination file.
    pub ignore_existing_dst: bool,
}

/// Hard-link `src` to `dst`, creating the destination's parent directory
/// first.
pub(crate) async fn hard_link(
    src: &Path,
    dst: &Path,
    options: LinkOptions,
) -> Result<(), CacheError> {
    if let Some(parent) = dst.parent() {
        create_directory(parent).await?;
    }

    if options.remove_dst {
        match fs::remove_file(dst).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::DeleteFailed {
                    path: dst.to_path_buf(),
                    source,
                });
            }
        }
    }

    match fs::hard_link(src, dst).await {
        Ok(()) => {
            debug!(src = %src.display(), dst = %dst.display(), "linked");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound && options.ignore_missing_src => {
            debug!(src = %src.display(), "source file not found, ignoring");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists && options.ignore_existing_dst => {
            debug!(dst = %dst.display(), "destination file already exists, ignoring");
            Ok(())
        }
        Err(source) => Err(CacheError::LinkFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::MetadataExt;

    use super::*;

    #[tokio::test]
    async fn link_shares_the_inode() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        std::fs::write(&src, b"body").expect("write src");

        hard_link(&src, &dst, LinkOptions::default())
            .await
            .expect("link");

        let src_ino = std::fs::metadata(&src).expect("src metadata").ino();
        let dst_ino = std::fs::metadata(&dst).expect("dst metadata").ino();
        assert_eq!(src_ino, dst_ino);
    }

    #[tokio::test]
    async fn link_creates_destination_parents() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("nested/deeply/dst");
        std::fs::write(&src, b"body").expect("write src");

        hard_link(&src, &dst, LinkOptions::default())
            .await
            .expect("link");

        assert_eq!(std::fs::read(&dst).expect("read dst"), b"body");
    }

    #[tokio::test]
    async fn missing_source_errors_by_default() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("absent");
        let dst = root.path().join("dst");

        let err = hard_link(&src, &dst, LinkOptions::default())
            .await
            .expect_err("missing source");
        assert!(matches!(err, CacheError::LinkFailed { .. }));
    }

    #[tokio::test]
    async fn missing_source_tolerated_on_request() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("absent");
        let dst = root.path().join("dst");

        let options = LinkOptions {
            ignore_missing_src: true,
            ..LinkOptions::default()
        };
        hard_link(&src, &dst, options).await.expect("tolerated");

        assert!(!dst.exists());
    }

    #[tokio::test]
    async fn existing_destination_errors_by_default() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        std::fs::write(&src, b"new").expect("write src");
        std::fs::write(&dst, b"old").expect("write dst");

        let err = hard_link(&src, &dst, LinkOptions::default())
            .await
            .expect_err("existing destination");
        assert!(matches!(err, CacheError::LinkFailed { .. }));
    }

    #[tokio::test]
    async fn existing_destination_tolerated_on_request() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        std::fs::write(&src, b"new").expect("write src");
        std::fs::write(&dst, b"old").expect("write dst");

        let options = LinkOptions {
            ignore_existing_dst: true,
            ..LinkOptions::default()
        };
        hard_link(&src, &dst, options).await.expect("tolerated");

        // The existing destination stays untouched.
        assert_eq!(std::fs::read(&dst).expect("read dst"), b"old");
    }

    #[tokio::test]
    async fn remove_dst_replaces_existing_destination() {
        let root = tempfile::tempdir().expect("tempdir");
        let src = root.path().join("src");
        let dst = root.path().join("dst");
        std::fs::write(&src, b"new").expect("write src");
        std::fs::write(&dst, b"old").expect("write dst");

        let options = LinkOptions {
            remove_dst: true,
            ignore_existing_dst: true,
            ..LinkOptions::default()
        };
        hard_link(&src, &dst, options).await.expect("replace");

        assert_eq!(std::fs::read(&dst).expect("read dst"), b"new");
        let src_ino = std::fs::metadata(&src).expect("src metadata").ino();
        let dst_ino = std::fs::metadata(&dst).expect("dst metadata").ino();
        assert_eq!(src_ino, dst_ino);
    }
}

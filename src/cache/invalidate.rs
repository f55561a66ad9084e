//! Invalidation: single-path deletes and recursive subtree removal.
//!
//! Deleting a path removes only its fresh copy; the stale copy keeps
//! serving until the next successful publish re-links it. Recursive
//! deletion clears both trees.

use std::io::ErrorKind;

use metrics::counter;
use tokio::fs;
use tracing::{debug, warn};

use crate::telemetry::METRIC_INVALIDATE_TOTAL;

use super::error::CacheError;
use super::keys::{KeyMapper, Tree};
use super::publisher::{PathOutcome, Publisher};
use super::resources::{Resource, resolve_resources};

impl Publisher {
    /// Remove the fresh copy of a path, then prune its directory if empty.
    pub async fn delete_path(&self, path: &str, is_ajax: bool) -> Result<(), CacheError> {
        let (path, query) = KeyMapper::split_query(path)?;
        let Some(filename) = self
            .keys()
            .filename(Tree::Fresh, path, query.unwrap_or(""), is_ajax)
        else {
            // Nothing this long was ever cached.
            return Ok(());
        };

        match fs::remove_file(&filename).await {
            Ok(()) => {
                counter!(METRIC_INVALIDATE_TOTAL).increment(1);
                debug!(filename = %filename.display(), "invalidated");
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::DeleteFailed {
                    path: filename,
                    source,
                });
            }
        }

        if let Some(parent) = filename.parent() {
            // Fails on non-empty directories, which is the desired outcome.
            let _ = fs::remove_dir(parent).await;
        }
        Ok(())
    }

    /// Remove everything cached under a path's directory, in both trees.
    /// Missing directories are fine.
    pub async fn recursive_delete_path(&self, path: &str) -> Result<(), CacheError> {
        for tree in [Tree::Fresh, Tree::Stale] {
            let Some(filename) = self.keys().filename(tree, path, "", false) else {
                continue;
            };
            let Some(parent) = filename.parent() else {
                continue;
            };
            match fs::remove_dir_all(parent).await {
                Ok(()) => {
                    debug!(directory = %parent.display(), "removed subtree");
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(
                        directory = %parent.display(),
                        error = %err,
                        "could not fully remove subtree"
                    );
                }
            }
        }
        counter!(METRIC_INVALIDATE_TOTAL).increment(1);
        Ok(())
    }

    /// Delete every resolved resource, reporting per-path outcomes.
    pub async fn delete_all(&self, resources: Vec<Resource>) -> Vec<PathOutcome> {
        let mut outcomes = Vec::new();
        for path in resolve_resources(resources) {
            let result = self.delete_path(&path, false).await;
            outcomes.push(PathOutcome { path, result });
        }
        outcomes
    }

    /// Recursively delete every resolved resource, reporting per-path
    /// outcomes.
    pub async fn recursive_delete_all(&self, resources: Vec<Resource>) -> Vec<PathOutcome> {
        let mut outcomes = Vec::new();
        for path in resolve_resources(resources) {
            let result = self.recursive_delete_path(&path).await;
            outcomes.push(PathOutcome { path, result });
        }
        outcomes
    }
}

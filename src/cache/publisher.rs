//! Publish engine: the fresh/stale hand-off protocol.
//!
//! A publish computes the fresh and stale filenames for a logical path,
//! optionally re-links the stale copy into the fresh tree so readers have
//! something to serve during a slow render, writes the new body atomically,
//! and finally hard-links the committed fresh file into the stale tree for
//! the next regeneration cycle.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::fs;
use tracing::{debug, warn};

use crate::render::Renderer;
use crate::telemetry::{
    METRIC_PUBLISH_FAILED_TOTAL, METRIC_PUBLISH_TOTAL, METRIC_STALE_FALLBACK_TOTAL,
    METRIC_UNCACHEABLE_TOTAL,
};

use super::config::CacheConfig;
use super::error::CacheError;
use super::keys::KeyMapper;
use super::link::{LinkOptions, hard_link};
use super::resources::{Resource, resolve_resources};
use super::write::{WriteOutcome, write_atomic};

/// Result of one path within a batch operation.
#[derive(Debug)]
pub struct PathOutcome {
    pub path: String,
    pub result: Result<(), CacheError>,
}

/// Filesystem-backed static-page publisher.
///
/// One instance per cache root; calls are independent and safe to issue
/// from any number of tasks or processes. Consistency relies on rename and
/// hard-link atomicity, not on in-process locking: concurrent publishers
/// of the same path race on the final rename and the last one wins.
pub struct Publisher {
    config: CacheConfig,
    keys: KeyMapper,
    renderer: Option<Arc<dyn Renderer>>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("config", &self.config)
            .field("keys", &self.keys)
            .field("renderer", &self.renderer.as_ref().map(|_| "<renderer>"))
            .finish()
    }
}

impl Publisher {
    /// Create a publisher rooted at `config.root_directory`, creating the
    /// directory if needed.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        if config.root_directory.as_os_str().is_empty() {
            return Err(CacheError::Config {
                path: config.root_directory.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "root directory is not configured",
                ),
            });
        }
        std::fs::create_dir_all(&config.root_directory).map_err(|source| CacheError::Config {
            path: config.root_directory.clone(),
            source,
        })?;
        let keys = KeyMapper::new(config.root_directory.clone(), config.max_path_bytes);
        Ok(Self {
            config,
            keys,
            renderer: None,
        })
    }

    /// Attach the render collaborator used when a publish has to compute
    /// content itself.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub(crate) fn keys(&self) -> &KeyMapper {
        &self.keys
    }

    /// Publish a path by rendering it through the attached collaborator.
    /// A query string embedded in `path` becomes part of the cache key.
    pub async fn publish_path(&self, path: &str) -> Result<(), CacheError> {
        self.publish_inner(path, None, None, false).await
    }

    /// Publish pre-rendered content for a path. No render happens, so
    /// there is no regeneration window and no stale fallback is seeded.
    pub async fn publish_content(&self, path: &str, content: Bytes) -> Result<(), CacheError> {
        self.publish_inner(path, None, Some(content), false).await
    }

    /// Publish a response body captured by request middleware, with the
    /// query string and AJAX variant supplied explicitly.
    pub async fn publish_response(
        &self,
        path: &str,
        query: &str,
        content: Bytes,
        is_ajax: bool,
    ) -> Result<(), CacheError> {
        self.publish_inner(path, Some(query), Some(content), is_ajax)
            .await
    }

    /// Re-link the stale copy of a path into the fresh tree if the fresh
    /// copy is missing. Request middleware calls this before a slow render
    /// so the front-end keeps serving the last good body meanwhile.
    pub async fn publish_stale_path(
        &self,
        path: &str,
        query: Option<&str>,
        is_ajax: bool,
    ) -> Result<(), CacheError> {
        let (path, query) = Self::resolve_query(path, query)?;
        let Some((fresh, stale)) = self.keys.entry_pair(path, query, is_ajax) else {
            counter!(METRIC_UNCACHEABLE_TOTAL).increment(1);
            return Ok(());
        };
        self.seed_stale_copy(&fresh, &stale).await;
        Ok(())
    }

    /// Publish every resolved resource, reporting per-path outcomes. One
    /// path's failure never aborts the batch.
    pub async fn publish_all(&self, resources: Vec<Resource>) -> Vec<PathOutcome> {
        let mut outcomes = Vec::new();
        for path in resolve_resources(resources) {
            let result = self.publish_path(&path).await;
            if result.is_err() {
                counter!(METRIC_PUBLISH_FAILED_TOTAL).increment(1);
            }
            outcomes.push(PathOutcome { path, result });
        }
        outcomes
    }

    async fn publish_inner(
        &self,
        raw_path: &str,
        query: Option<&str>,
        content: Option<Bytes>,
        is_ajax: bool,
    ) -> Result<(), CacheError> {
        let (path, query) = Self::resolve_query(raw_path, query)?;

        let Some((fresh, stale)) = self.keys.entry_pair(path, query, is_ajax) else {
            debug!(path = raw_path, "mapped filename exceeds length bound, not caching");
            counter!(METRIC_UNCACHEABLE_TOTAL).increment(1);
            return Ok(());
        };

        let body = match content {
            Some(body) => body,
            None => {
                // Rendering may be slow; keep the last good copy visible
                // for the duration.
                self.seed_stale_copy(&fresh, &stale).await;
                self.render(raw_path).await?
            }
        };

        let Some(fresh_dir) = fresh.parent() else {
            // Mapped filenames always sit below the tree roots.
            return Ok(());
        };
        match write_atomic(fresh_dir, &fresh, &body).await? {
            WriteOutcome::Committed => {
                // The new body becomes the stale fallback for the next
                // cycle.
                hard_link(
                    &fresh,
                    &stale,
                    LinkOptions {
                        remove_dst: true,
                        ignore_existing_dst: true,
                        ..LinkOptions::default()
                    },
                )
                .await?;
                counter!(METRIC_PUBLISH_TOTAL).increment(1);
                debug!(path = raw_path, fresh = %fresh.display(), "published");
                Ok(())
            }
            // Already logged by the writer; a concurrent invalidation won.
            WriteOutcome::LostRace => Ok(()),
        }
    }

    /// Middleware supplies the query string explicitly; standalone callers
    /// may embed it in the path instead.
    fn resolve_query<'a>(
        raw_path: &'a str,
        query: Option<&'a str>,
    ) -> Result<(&'a str, &'a str), CacheError> {
        match query {
            Some(query) => Ok((raw_path, query)),
            None => {
                let (path, query) = KeyMapper::split_query(raw_path)?;
                Ok((path, query.unwrap_or("")))
            }
        }
    }

    async fn seed_stale_copy(&self, fresh: &Path, stale: &Path) {
        if fs::try_exists(fresh).await.unwrap_or(false) {
            debug!(fresh = %fresh.display(), "fresh copy already present, not overwriting");
            return;
        }
        let options = LinkOptions {
            ignore_missing_src: true,
            ignore_existing_dst: true,
            ..LinkOptions::default()
        };
        // Fallback link failures are logged, never surfaced.
        match hard_link(stale, fresh, options).await {
            Ok(()) => counter!(METRIC_STALE_FALLBACK_TOTAL).increment(1),
            Err(err) => {
                warn!(stale = %stale.display(), error = %err, "could not seed stale copy");
            }
        }
    }

    async fn render(&self, path: &str) -> Result<Bytes, CacheError> {
        let Some(renderer) = self.renderer.as_deref() else {
            return Err(CacheError::render_unavailable(path));
        };
        let page = renderer
            .render(path)
            .await
            .map_err(|source| CacheError::render_fault(path, source))?;
        if page.status != 200 {
            return Err(CacheError::render_status(path, page.status));
        }
        Ok(page.body)
    }
}

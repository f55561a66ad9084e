//! Error taxonomy for the publishing engine.
//!
//! One structured kind per failure class, each carrying the offending
//! path(s). Which kinds are systemic (propagate) and which are
//! freshness-only (log and move on) is decided by the callers.

use std::path::PathBuf;

use thiserror::Error;

use crate::render::BoxError;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache root directory is missing or unusable. Fatal at
    /// construction.
    #[error("cache root {} cannot be used", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The logical path contains more than one `?` separator.
    #[error("path `{path}` has multiple query string separators")]
    MalformedPath { path: String },

    /// The render collaborator faulted, returned a non-200 status, or is
    /// not configured at all.
    #[error("could not render `{path}`")]
    RenderFailed {
        path: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    #[error("could not create directory {}", .directory.display())]
    CreateDirFailed {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the temporary fresh file failed before it became visible.
    #[error("could not write temporary file in {}", .directory.display())]
    WriteFailed {
        directory: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not link {} to {}", .src.display(), .dst.display())]
    LinkFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not delete {}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn render_status(path: impl Into<String>, status: u16) -> Self {
        Self::RenderFailed {
            path: path.into(),
            status: Some(status),
            source: None,
        }
    }

    pub(crate) fn render_fault(path: impl Into<String>, source: BoxError) -> Self {
        Self::RenderFailed {
            path: path.into(),
            status: None,
            source: Some(source),
        }
    }

    pub(crate) fn render_unavailable(path: impl Into<String>) -> Self {
        Self::RenderFailed {
            path: path.into(),
            status: None,
            source: None,
        }
    }
}

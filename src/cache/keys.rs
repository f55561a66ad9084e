//! Cache key derivation.
//!
//! Maps a logical request path (plus optional query string and AJAX
//! variant) onto filenames under the `fresh/` and `stale/` trees. Paths
//! whose mapped absolute filename exceeds the configured byte bound are
//! uncacheable and map to `None`.

use std::path::PathBuf;

use percent_encoding::{CONTROLS, utf8_percent_encode};

use super::error::CacheError;

/// Index marker appended to directory-style paths. The `%3F` tail is a
/// percent-encoded `?`, kept literal in the file name so front-end rewrite
/// rules can tell "no query string" apart from an empty one.
pub(crate) const INDEX_MARKER: &str = "index.html%3F";

/// Suffix distinguishing the AJAX rendering of a path from the normal one.
pub(crate) const AJAX_SUFFIX: &str = ",ajax";

/// The two on-disk trees derived from the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tree {
    /// Current, authoritative copies.
    Fresh,
    /// Last-known-good copies kept around for the regeneration window.
    Stale,
}

impl Tree {
    pub(crate) fn dir_name(self) -> &'static str {
        match self {
            Tree::Fresh => "fresh",
            Tree::Stale => "stale",
        }
    }
}

/// Derives absolute cache filenames from logical paths.
#[derive(Debug, Clone)]
pub struct KeyMapper {
    root: PathBuf,
    max_path_bytes: usize,
}

impl KeyMapper {
    pub fn new(root: PathBuf, max_path_bytes: usize) -> Self {
        Self {
            root,
            max_path_bytes,
        }
    }

    /// Split a raw path into path and query components on its first `?`.
    ///
    /// More than one `?` is ambiguous and rejected.
    pub fn split_query(raw: &str) -> Result<(&str, Option<&str>), CacheError> {
        if raw.matches('?').count() > 1 {
            return Err(CacheError::MalformedPath {
                path: raw.to_string(),
            });
        }
        Ok(match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        })
    }

    /// Absolute filename for `path` under `tree`, or `None` when the
    /// result would exceed the configured byte bound (the path is
    /// uncacheable).
    pub fn filename(&self, tree: Tree, path: &str, query: &str, is_ajax: bool) -> Option<PathBuf> {
        let mut key = if path.ends_with('/') {
            format!("{path}{INDEX_MARKER}")
        } else {
            path.to_string()
        };
        if !query.is_empty() {
            // Crawlers send broken non-ASCII query bytes; encode those and
            // control characters, but never re-encode `%` escapes.
            key.push_str(&utf8_percent_encode(query, CONTROLS).to_string());
        }
        if is_ajax {
            key.push_str(AJAX_SUFFIX);
        }

        let filename = self
            .root
            .join(tree.dir_name())
            .join(key.trim_start_matches('/'));
        (filename.as_os_str().len() <= self.max_path_bytes).then_some(filename)
    }

    /// Fresh and stale filenames for the same logical path. The two tree
    /// prefixes are equal in length, so either both fit the bound or
    /// neither does.
    pub fn entry_pair(&self, path: &str, query: &str, is_ajax: bool) -> Option<(PathBuf, PathBuf)> {
        let fresh = self.filename(Tree::Fresh, path, query, is_ajax)?;
        let stale = self.filename(Tree::Stale, path, query, is_ajax)?;
        Some((fresh, stale))
    }
}

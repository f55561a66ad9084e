//! Static-cache publishing engine.
//!
//! Maps logical request paths onto `fresh/` and `stale/` filenames under
//! the cache root, writes fresh bodies atomically, maintains the
//! fresh→stale hard-link hand-off, and removes entries on invalidation.
//!
//! ## Configuration
//!
//! Engine behavior is controlled via `staticpress.toml`:
//!
//! ```toml
//! [cache]
//! root_directory = "/var/cache/pages"
//! max_path_bytes = 255
//! urls = ["^/$", "^/blog"]
//! ```

mod config;
mod error;
mod filter;
mod invalidate;
mod keys;
mod link;
mod publisher;
mod resources;
mod write;

pub use config::CacheConfig;
pub use error::CacheError;
pub use filter::UrlFilter;
pub use keys::{KeyMapper, Tree};
pub use publisher::{PathOutcome, Publisher};
pub use resources::{CanonicalUrl, Resource, resolve_resources};

pub(crate) use config::{DEFAULT_MAX_PATH_BYTES, DEFAULT_SERVER_NAME, DEFAULT_URL_PATTERN};

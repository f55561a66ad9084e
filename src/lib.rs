//! staticpress: a filesystem static-cache publishing and invalidation engine.
//!
//! Publishes rendered page bodies as plain files under a cache root so a
//! front-end web server can serve them directly. Every committed publish is
//! hard-linked into a parallel `stale/` tree; the stale copy survives
//! invalidation and is re-linked into the `fresh/` tree while a page
//! regenerates, so readers always see either the previous complete body or
//! the new one, never a partial file.

pub mod cache;
pub mod config;
pub mod render;
pub mod telemetry;

//! Render collaborator boundary.
//!
//! The engine never renders pages itself. When a publish has no
//! pre-supplied body it asks this collaborator, which typically simulates a
//! request through the surrounding web framework and hands back the
//! response it produced.

use async_trait::async_trait;
use bytes::Bytes;

/// Transport or application fault raised by a renderer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A rendered page: the response status and the complete body bytes.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: u16,
    pub body: Bytes,
}

/// Produces page bodies for logical paths.
///
/// Anything other than a 200 status is treated as a failed render by the
/// publish engine.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, path: &str) -> Result<RenderedPage, BoxError>;
}

//! Resource expansion: turning heterogeneous references into logical paths.

/// Anything that knows the canonical URL path it is published under.
pub trait CanonicalUrl: Send + Sync {
    fn canonical_url(&self) -> String;
}

/// A reference to one or more cacheable resources.
pub enum Resource {
    /// An explicit URL path.
    Path(String),
    /// A single item exposing its canonical URL.
    Item(Box<dyn CanonicalUrl>),
    /// A homogeneous collection of such items.
    Collection(Vec<Box<dyn CanonicalUrl>>),
}

impl From<&str> for Resource {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Resource {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// Expand resources into logical paths, preserving input order; a
/// collection contributes its items in iteration order.
pub fn resolve_resources(resources: impl IntoIterator<Item = Resource>) -> Vec<String> {
    let mut paths = Vec::new();
    for resource in resources {
        match resource {
            Resource::Path(path) => paths.push(path),
            Resource::Item(item) => paths.push(item.canonical_url()),
            Resource::Collection(items) => {
                paths.extend(items.into_iter().map(|item| item.canonical_url()));
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        slug: &'static str,
    }

    impl CanonicalUrl for Post {
        fn canonical_url(&self) -> String {
            format!("/posts/{}", self.slug)
        }
    }

    #[test]
    fn explicit_paths_pass_through() {
        let paths = resolve_resources(vec![Resource::from("/a"), Resource::from("/b")]);
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn items_resolve_their_canonical_url() {
        let paths = resolve_resources(vec![Resource::Item(Box::new(Post { slug: "hello" }))]);
        assert_eq!(paths, vec!["/posts/hello"]);
    }

    #[test]
    fn collections_flatten_in_iteration_order() {
        let paths = resolve_resources(vec![
            Resource::from("/first"),
            Resource::Collection(vec![
                Box::new(Post { slug: "one" }),
                Box::new(Post { slug: "two" }),
            ]),
            Resource::from("/last"),
        ]);
        assert_eq!(paths, vec!["/first", "/posts/one", "/posts/two", "/last"]);
    }
}

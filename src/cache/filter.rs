//! Request-path filtering for middleware integrations.
//!
//! The include/exclude pattern lists are compiled once at startup into an
//! immutable matcher; per-request checks are pure lookups with no shared
//! mutable state.

use regex::Regex;

use super::config::CacheConfig;

/// Compiled URL pattern sets deciding which request paths are cacheable.
#[derive(Debug)]
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    /// Compile the pattern lists. Patterns are conventionally anchored
    /// (`^/blog`), matching how front-end rewrite rules are written.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Compile the pattern lists carried by the engine configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self, regex::Error> {
        Self::new(&config.urls, &config.exclude_urls)
    }

    /// Whether a request path should be published to the cache.
    /// Exclusions always win.
    pub fn is_cacheable(&self, path: &str) -> bool {
        if self.exclude.iter().any(|pattern| pattern.is_match(path)) {
            return false;
        }
        self.include.iter().any(|pattern| pattern.is_match(path))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|pattern| Regex::new(pattern)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> UrlFilter {
        let include: Vec<String> = include.iter().map(ToString::to_string).collect();
        let exclude: Vec<String> = exclude.iter().map(ToString::to_string).collect();
        UrlFilter::new(&include, &exclude).expect("valid patterns")
    }

    #[test]
    fn default_config_caches_only_the_root() {
        let filter = UrlFilter::from_config(&CacheConfig::default()).expect("valid config");
        assert!(filter.is_cacheable("/"));
        assert!(!filter.is_cacheable("/blog/"));
    }

    #[test]
    fn unmatched_paths_are_not_cacheable() {
        let filter = filter(&["^/blog"], &[]);
        assert!(filter.is_cacheable("/blog/post"));
        assert!(!filter.is_cacheable("/admin/"));
    }

    #[test]
    fn exclusions_win_over_inclusions() {
        let filter = filter(&["^/blog"], &["^/blog/drafts"]);
        assert!(filter.is_cacheable("/blog/post"));
        assert!(!filter.is_cacheable("/blog/drafts/wip"));
    }

    #[test]
    fn invalid_patterns_fail_compilation() {
        assert!(UrlFilter::new(&["(".to_string()], &[]).is_err());
    }
}

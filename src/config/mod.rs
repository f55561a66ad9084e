//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::{DEFAULT_MAX_PATH_BYTES, DEFAULT_SERVER_NAME, DEFAULT_URL_PATTERN};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "staticpress";

/// Command-line arguments for the staticpress binary.
#[derive(Debug, Parser)]
#[command(name = "staticpress", version, about = "Static page cache publisher")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "STATICPRESS_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    /// Emit per-path outcomes as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the cache root directory.
    #[arg(long = "cache-root", value_name = "PATH", global = true)]
    pub cache_root: Option<PathBuf>,

    /// Override the byte bound on cached filenames.
    #[arg(long = "cache-max-path-bytes", value_name = "BYTES", global = true)]
    pub cache_max_path_bytes: Option<usize>,

    /// Override the server name used by render collaborators.
    #[arg(long = "server-name", value_name = "NAME", global = true)]
    pub server_name: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Publish pre-rendered content for one or more paths.
    Publish(PublishArgs),
    /// Invalidate the fresh copy of one or more paths.
    Delete(DeleteArgs),
    /// Invalidate entire subtrees, fresh and stale copies both.
    #[command(name = "recursive-delete")]
    RecursiveDelete(RecursiveDeleteArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PublishArgs {
    /// Logical request paths to publish.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// File holding the rendered body; only valid with exactly one path.
    #[arg(long = "content-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    /// Logical request paths to invalidate.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RecursiveDeleteArgs {
    /// Logical request paths whose subtrees are invalidated.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub root_directory: PathBuf,
    pub max_path_bytes: usize,
    pub server_name: String,
    pub urls: Vec<String>,
    pub exclude_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("STATICPRESS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(root) = overrides.cache_root.as_ref() {
            self.cache.root_directory = Some(root.clone());
        }
        if let Some(bound) = overrides.cache_max_path_bytes {
            self.cache.max_path_bytes = Some(bound);
        }
        if let Some(name) = overrides.server_name.as_ref() {
            self.cache.server_name = Some(name.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { cache, logging } = raw;

        let cache = build_cache_settings(cache)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self { cache, logging })
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let root_directory = cache.root_directory.ok_or_else(|| {
        LoadError::invalid("cache.root_directory", "a cache root directory must be set")
    })?;
    if root_directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "cache.root_directory",
            "path must not be empty",
        ));
    }

    let max_path_bytes = cache.max_path_bytes.unwrap_or(DEFAULT_MAX_PATH_BYTES);
    if max_path_bytes == 0 {
        return Err(LoadError::invalid(
            "cache.max_path_bytes",
            "must be greater than zero",
        ));
    }

    let server_name = cache
        .server_name
        .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

    let urls = cache
        .urls
        .unwrap_or_else(|| vec![DEFAULT_URL_PATTERN.to_string()]);

    Ok(CacheSettings {
        root_directory,
        max_path_bytes,
        server_name,
        urls,
        exclude_urls: cache.exclude_urls.unwrap_or_default(),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    root_directory: Option<PathBuf>,
    max_path_bytes: Option<usize>,
    server_name: Option<String>,
    urls: Option<Vec<String>>,
    exclude_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

pub(crate) const METRIC_PUBLISH_TOTAL: &str = "staticpress_publish_total";
pub(crate) const METRIC_PUBLISH_FAILED_TOTAL: &str = "staticpress_publish_failed_total";
pub(crate) const METRIC_STALE_FALLBACK_TOTAL: &str = "staticpress_stale_fallback_total";
pub(crate) const METRIC_UNCACHEABLE_TOTAL: &str = "staticpress_uncacheable_total";
pub(crate) const METRIC_INVALIDATE_TOTAL: &str = "staticpress_invalidate_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("telemetry initialization failed: {0}")]
pub struct TelemetryError(String);

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError(format!("failed to install tracing subscriber: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_PUBLISH_TOTAL,
            Unit::Count,
            "Total number of committed fresh publishes."
        );
        describe_counter!(
            METRIC_PUBLISH_FAILED_TOTAL,
            Unit::Count,
            "Total number of publishes that failed."
        );
        describe_counter!(
            METRIC_STALE_FALLBACK_TOTAL,
            Unit::Count,
            "Total number of stale copies re-linked to cover a regeneration window."
        );
        describe_counter!(
            METRIC_UNCACHEABLE_TOTAL,
            Unit::Count,
            "Total number of paths skipped because the mapped filename was too long."
        );
        describe_counter!(
            METRIC_INVALIDATE_TOTAL,
            Unit::Count,
            "Total number of invalidations."
        );
    });
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    #[serial]
    fn subscriber_installs_once() {
        let logging = LoggingSettings {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        };

        let first = init(&logging);
        let second = init(&logging);

        assert!(first.is_ok());
        assert!(second.is_err());
    }
}

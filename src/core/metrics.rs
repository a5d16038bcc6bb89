use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Counts a committed structural change to a course aggregate.
pub(crate) fn record_course_mutation(operation: &'static str) {
    metrics::counter!("course_mutations_total", "operation" => operation).increment(1);
}

/// Counts an optimistic write that lost its race against a concurrent writer.
pub(crate) fn record_course_conflict(operation: &'static str) {
    metrics::counter!("course_conflicts_total", "operation" => operation).increment(1);
}

pub(crate) fn record_asset_cleanup_failure(resource_type: &'static str) {
    metrics::counter!("asset_cleanup_failures_total", "resource_type" => resource_type)
        .increment(1);
}

pub(crate) fn record_notification_job(outcome: &'static str) {
    metrics::counter!("notification_jobs_total", "outcome" => outcome).increment(1);
}

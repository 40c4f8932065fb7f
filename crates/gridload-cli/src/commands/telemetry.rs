use gridload_cli::manifest::{record_manifest, ManifestTelemetry};
use std::{env, path::Path, time::Instant};

fn correlation_id() -> Option<String> {
    env::var("GRIDLOAD_CORRELATION_ID")
        .or_else(|_| env::var("GITHUB_RUN_ID"))
        .ok()
}

/// Records a run manifest next to `out`. Failing to write it is reported
/// but never fails the run.
pub fn record_run_timed(
    out: &Path,
    command: &str,
    params: &[(&str, &str)],
    start: Instant,
    result: &anyhow::Result<()>,
) {
    let telemetry = ManifestTelemetry {
        status: if result.is_ok() { "success" } else { "failure" }.to_string(),
        duration_ms: Some(start.elapsed().as_millis()),
        correlation_id: correlation_id(),
    };
    if let Err(err) = record_manifest(out, command, params, telemetry) {
        eprintln!("Failed to record run manifest: {err}");
    }
}

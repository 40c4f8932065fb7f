use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON record of one CLI run, written next to the run's output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub run_id: String,
    pub command: String,
    pub version: String,
    pub timestamp: String,
    pub outputs: Vec<String>,
    pub params: Vec<Param>,
    #[serde(default)]
    pub telemetry: Option<ManifestTelemetry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestTelemetry {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Writes `run-<uuid>.json` into the directory of `output` and returns its
/// path.
pub fn record_manifest(
    output: &Path,
    command: &str,
    params: &[(&str, &str)],
    telemetry: ManifestTelemetry,
) -> Result<std::path::PathBuf> {
    let run_id = Uuid::new_v4().to_string();
    let dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    fs::create_dir_all(&dir)?;
    let manifest = ManifestEntry {
        run_id: run_id.clone(),
        command: command.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        outputs: vec![output.display().to_string()],
        params: params
            .iter()
            .map(|(k, v)| Param {
                name: k.to_string(),
                value: v.to_string(),
            })
            .collect(),
        telemetry: Some(telemetry),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    let path = dir.join(format!("run-{}.json", run_id));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Recorded run manifest {}", path.display());
    Ok(path)
}

pub fn read_manifest(path: &Path) -> Result<ManifestEntry> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let manifest = serde_json::from_str(&json).context("parsing run manifest")?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("lines.csv");
        let path = record_manifest(
            &out,
            "grid clean",
            &[("dedup", "true")],
            ManifestTelemetry {
                status: "success".into(),
                duration_ms: Some(12),
                correlation_id: None,
            },
        )
        .unwrap();

        let manifest = read_manifest(&path).unwrap();
        assert_eq!(manifest.command, "grid clean");
        assert_eq!(manifest.params[0].name, "dedup");
        assert_eq!(manifest.outputs, vec![out.display().to_string()]);
        let telemetry = manifest.telemetry.unwrap();
        assert_eq!(telemetry.status, "success");
        assert_eq!(telemetry.duration_ms, Some(12));
        assert!(Uuid::parse_str(&manifest.run_id).is_ok());
    }
}

//! # gridload-core: shared building blocks
//!
//! Types and infrastructure shared by the load and grid pipelines:
//!
//! - [`error`] - the workspace-wide [`GridLoadError`] and [`GridLoadResult`]
//! - [`units`] - newtype wrappers for MVA, kV, volts, ohms and metres
//! - [`diagnostics`] - non-fatal issues collected while a stage runs
//! - [`progress`] - the [`ProgressSink`] callback every stage reports through
//!
//! Region identifiers are plain strings wrapped in [`RegionId`] so that the
//! ordering used to canonicalize line endpoints is the lexicographic one.

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod progress;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridLoadError, GridLoadResult};
pub use progress::{NullProgress, ProgressSink, TracingProgress};
pub use units::{Kilovolts, MegavoltAmperes, Meters, Ohms, Volts};

/// Identifier of a model region (a line endpoint or a country code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        RegionId(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        RegionId(value.to_string())
    }
}

//! Transmission line cleaning: voltage/circuit disambiguation, merging of
//! duplicate lines, and loadability factors.
//!
//! The stages must run in order. [`resolve_lines`] turns every raw line
//! into single-voltage records, [`deduplicate`] folds records that connect
//! the same pair of regions, and [`assign_loadability`] tags the result.
//! [`clean_grid`] runs all three.

pub mod dedup;
pub mod error;
pub mod io;
pub mod loadability;
pub mod resolve;
pub mod types;

use std::collections::BTreeMap;

use gridload_core::{Diagnostics, ProgressSink};

pub use dedup::{canonicalize_endpoints, deduplicate};
pub use error::GridError;
pub use loadability::{assign_loadability, LoadabilityTable};
pub use resolve::{resolve_lines, LineCase, LineCounts, Resolution, SplitPolicy};
pub use types::{CleanGridLine, DeduplicatedGridLine, Lineage, RawGridLine};

#[derive(Debug, Clone)]
pub struct GridCleaning {
    pub lines: Vec<DeduplicatedGridLine>,
    /// Clean records before deduplication.
    pub resolved: usize,
    pub cases: BTreeMap<LineCase, usize>,
    pub skipped: usize,
    pub diagnostics: Diagnostics,
}

/// Resolves, optionally deduplicates, and tags `raw` with loadability.
pub fn clean_grid(
    raw: &[RawGridLine],
    policy: SplitPolicy,
    dedup: bool,
    loadability: &LoadabilityTable,
    progress: &dyn ProgressSink,
) -> Result<GridCleaning, GridError> {
    let Resolution {
        lines,
        cases,
        skipped,
        diagnostics,
    } = resolve_lines(raw, policy, progress)?;
    let resolved = lines.len();
    let mut lines = if dedup {
        deduplicate(lines, progress)
    } else {
        lines.into_iter().map(DeduplicatedGridLine::from).collect()
    };
    assign_loadability(&mut lines, loadability);
    Ok(GridCleaning {
        lines,
        resolved,
        cases,
        skipped,
        diagnostics,
    })
}

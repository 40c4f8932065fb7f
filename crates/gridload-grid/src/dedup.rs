//! Merging of parallel and bidirectional line records.
//!
//! Endpoints are first put in canonical order (`start <= end`), so a line
//! recorded once as A-B and once as B-A ends up under the same key. Records
//! are then sorted by endpoint pair and every run sharing a pair is folded
//! into one: capacity and length add up, resistances combine in parallel.

use gridload_core::ProgressSink;
use tracing::info;

use crate::types::{CleanGridLine, DeduplicatedGridLine};

const STAGE: &str = "line deduplication";

/// Swaps `start` and `end` wherever `start > end`. Returns how many lines
/// were reversed.
pub fn canonicalize_endpoints(lines: &mut [CleanGridLine]) -> usize {
    let mut reversed = 0;
    for line in lines.iter_mut() {
        if line.start > line.end {
            std::mem::swap(&mut line.start, &mut line.end);
            reversed += 1;
        }
    }
    reversed
}

/// Folds every group of lines sharing an endpoint pair into one record.
///
/// The first line of a group in input order supplies voltage, circuit
/// count and lineage. Output is ordered by endpoint pair.
pub fn deduplicate(
    mut lines: Vec<CleanGridLine>,
    progress: &dyn ProgressSink,
) -> Vec<DeduplicatedGridLine> {
    progress.stage_started(STAGE);
    let input = lines.len();
    let reversed = canonicalize_endpoints(&mut lines);
    lines.sort_by(|a, b| a.endpoints().cmp(&b.endpoints()));

    let mut out: Vec<DeduplicatedGridLine> = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        match out.last_mut() {
            Some(last) if last.start == line.start && last.end == line.end => {
                last.capacity = last.capacity + line.capacity;
                last.length_m = last.length_m + line.length_m;
                last.resistance = last.resistance.parallel(line.resistance);
                last.merged += 1;
            }
            _ => out.push(line.into()),
        }
        progress.advance(STAGE, i + 1, input);
    }

    info!(
        input = input,
        output = out.len(),
        reversed = reversed,
        "deduplicated lines"
    );
    progress.stage_finished(STAGE);
    out
}

//! Voltage/circuit disambiguation of raw grid lines.
//!
//! A raw line may list several voltage levels and several circuit counts,
//! and the two lists need not line up. Each line is classified once into a
//! [`LineCase`], normalized by that case's handler so both lists have the
//! same length, and then split into one [`CleanGridLine`] per voltage level.
//!
//! Splitting runs as a worklist: the pending (line, remaining levels) entry
//! at the front gives up its leftmost level as a new record and goes back to
//! the front until it has no levels left. Levels therefore come out in the
//! order the source lists them, and the lineage suffixes follow that order.

use std::collections::{BTreeMap, VecDeque};

use gridload_core::{Diagnostics, ProgressSink, Volts};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GridError;
use crate::types::{CleanGridLine, Lineage, RawGridLine};

pub(crate) const STAGE: &str = "voltage resolution";
const CATEGORY: &str = "voltage";

/// How a split record inherits length, capacity and resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitPolicy {
    /// Length and capacity are divided by circuit share. Resistance is
    /// scaled so the split records in parallel match the source line.
    #[default]
    Apportion,
    /// Every record carries the source attributes unchanged.
    Duplicate,
}

impl std::str::FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apportion" => Ok(Self::Apportion),
            "duplicate" => Ok(Self::Duplicate),
            other => Err(format!(
                "unknown split policy '{other}'; use apportion or duplicate"
            )),
        }
    }
}

/// Derived counts a line is classified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCounts {
    /// Nonzero voltage entries.
    pub voltage_count: usize,
    /// Entries in the wire list.
    pub circuit_count: usize,
    /// Sum of the wire entries.
    pub circuit_total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LineCase {
    /// A single voltage level carries every circuit.
    SingleVoltage,
    /// One wire entry per voltage level.
    MatchedCounts,
    /// Fewer wire entries than voltage levels, and no more levels than
    /// circuits in total.
    ExcessVoltages,
    /// Fewer voltage levels than wire entries.
    ExcessCircuits,
    /// Fewer wire entries than voltage levels, but more circuits in total
    /// than levels.
    BundledCircuits,
}

impl LineCase {
    /// Picks the case for `counts`, or `None` when the line has no usable
    /// voltage.
    pub fn classify(counts: LineCounts) -> Option<LineCase> {
        let LineCounts {
            voltage_count: v,
            circuit_count: c,
            circuit_total: t,
        } = counts;
        if v == 0 {
            None
        } else if v == 1 {
            Some(LineCase::SingleVoltage)
        } else if c == v {
            Some(LineCase::MatchedCounts)
        } else if c < v && v < t as usize {
            Some(LineCase::BundledCircuits)
        } else if c < v {
            Some(LineCase::ExcessVoltages)
        } else {
            Some(LineCase::ExcessCircuits)
        }
    }

    /// Position in the usual 1-5 numbering of the cases.
    pub fn number(self) -> u8 {
        match self {
            LineCase::SingleVoltage => 1,
            LineCase::MatchedCounts => 2,
            LineCase::ExcessVoltages => 3,
            LineCase::ExcessCircuits => 4,
            LineCase::BundledCircuits => 5,
        }
    }

    /// Brings `voltages` and `wires` to equal length.
    fn normalize(
        self,
        mut voltages: Vec<f64>,
        wires: Vec<u32>,
        total: u32,
    ) -> (Vec<f64>, Vec<u32>) {
        match self {
            LineCase::SingleVoltage => (voltages, vec![total]),
            LineCase::MatchedCounts => {
                let n = wires.len();
                (voltages, vec![1; n])
            }
            LineCase::ExcessVoltages => {
                let n = wires.len();
                voltages.truncate(n);
                (voltages, vec![1; n])
            }
            LineCase::ExcessCircuits => {
                let highest = voltages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                voltages.resize(wires.len(), highest);
                (voltages, wires)
            }
            LineCase::BundledCircuits => {
                voltages.truncate(wires.len());
                (voltages, wires)
            }
        }
    }
}

impl std::fmt::Display for LineCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "case {}", self.number())
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub lines: Vec<CleanGridLine>,
    /// Source lines per case.
    pub cases: BTreeMap<LineCase, usize>,
    /// Source lines that could not be classified.
    pub skipped: usize,
    pub diagnostics: Diagnostics,
}

struct Pending<'a> {
    source: usize,
    line: &'a RawGridLine,
    levels: VecDeque<(f64, u32)>,
    total_wires: u64,
    next_suffix: u32,
}

/// Resolves every raw line into single-voltage records.
///
/// A non-numeric voltage or wire entry fails the whole run with the index
/// of the offending record. Lines without a nonzero voltage or without
/// circuits are skipped and reported in the diagnostics.
pub fn resolve_lines(
    raw: &[RawGridLine],
    policy: SplitPolicy,
    progress: &dyn ProgressSink,
) -> Result<Resolution, GridError> {
    progress.stage_started(STAGE);
    let mut diagnostics = Diagnostics::new();
    let mut cases: BTreeMap<LineCase, usize> = BTreeMap::new();
    let mut worklist: VecDeque<Pending> = VecDeque::with_capacity(raw.len());
    let mut skipped = 0;

    for (record, line) in raw.iter().enumerate() {
        let voltages = parse_voltages(record, &line.voltage)?;
        let wires = parse_wires(record, &line.wires)?;
        let counts = LineCounts {
            voltage_count: voltages.len(),
            circuit_count: wires.len(),
            circuit_total: circuit_total(record, &wires)?,
        };

        let Some(case) = LineCase::classify(counts) else {
            diagnostics.add_error_at_record(
                CATEGORY,
                &format!("no nonzero voltage in '{}', line skipped", line.voltage),
                record,
            );
            skipped += 1;
            continue;
        };
        if counts.circuit_total == 0
            || (case != LineCase::SingleVoltage && wires.contains(&0))
        {
            diagnostics.add_error_at_record(
                CATEGORY,
                &format!("no usable circuit count in '{}', line skipped", line.wires),
                record,
            );
            skipped += 1;
            continue;
        }

        let (voltages, wires) = case.normalize(voltages, wires, counts.circuit_total);
        debug!(record = record, case = case.number(), levels = wires.len(), "classified line");
        *cases.entry(case).or_default() += 1;
        worklist.push_back(Pending {
            source: record,
            line,
            total_wires: wires.iter().map(|w| u64::from(*w)).sum(),
            levels: voltages.into_iter().zip(wires).collect(),
            next_suffix: 0,
        });
        progress.advance(STAGE, record + 1, raw.len());
    }

    let mut lines = Vec::with_capacity(worklist.len());
    while let Some(mut pending) = worklist.pop_front() {
        let Some((volts, wires)) = pending.levels.pop_front() else {
            continue;
        };
        let lineage = Lineage::new(pending.source, pending.next_suffix);
        let share = f64::from(wires) / pending.total_wires as f64;
        lines.push(split_record(pending.line, lineage, Volts(volts), wires, share, policy));
        if !pending.levels.is_empty() {
            pending.next_suffix += 1;
            worklist.push_front(pending);
        }
    }

    info!(
        input = raw.len(),
        output = lines.len(),
        skipped = skipped,
        "resolved line voltages"
    );
    progress.stage_finished(STAGE);
    Ok(Resolution {
        lines,
        cases,
        skipped,
        diagnostics,
    })
}

fn split_record(
    line: &RawGridLine,
    lineage: Lineage,
    voltage: Volts,
    wires: u32,
    share: f64,
    policy: SplitPolicy,
) -> CleanGridLine {
    let (length_m, capacity, resistance) = match policy {
        SplitPolicy::Apportion => (
            line.length_m * share,
            line.capacity * share,
            line.resistance / share,
        ),
        SplitPolicy::Duplicate => (line.length_m, line.capacity, line.resistance),
    };
    CleanGridLine {
        lineage,
        start: line.start.clone(),
        end: line.end.clone(),
        voltage: voltage.to_kilovolts(),
        wires,
        length_m,
        resistance,
        capacity,
    }
}

/// Splits a `;`-separated list. A blank field is an empty list, but a blank
/// entry inside a list is malformed.
fn entries<'a>(
    record: usize,
    field: &'static str,
    value: &'a str,
) -> Result<Vec<&'a str>, GridError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(';')
        .map(str::trim)
        .map(|entry| {
            if entry.is_empty() {
                Err(GridError::InvalidEntry {
                    record,
                    field,
                    value: String::new(),
                })
            } else {
                Ok(entry)
            }
        })
        .collect()
}

fn circuit_total(record: usize, wires: &[u32]) -> Result<u32, GridError> {
    wires
        .iter()
        .try_fold(0u32, |acc, w| acc.checked_add(*w))
        .ok_or_else(|| GridError::CircuitOverflow {
            record,
            wires: wires.iter().map(u32::to_string).collect::<Vec<_>>().join(";"),
        })
}

/// Nonzero voltages in list order; zero entries are placeholders.
fn parse_voltages(record: usize, field: &str) -> Result<Vec<f64>, GridError> {
    let mut voltages = Vec::new();
    for entry in entries(record, "voltage", field)? {
        let value = entry
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| GridError::InvalidEntry {
                record,
                field: "voltage",
                value: entry.to_string(),
            })?;
        if value > 0.0 {
            voltages.push(value);
        }
    }
    Ok(voltages)
}

fn parse_wires(record: usize, field: &str) -> Result<Vec<u32>, GridError> {
    entries(record, "wires", field)?
        .into_iter()
        .map(|entry| {
            entry.parse::<u32>().map_err(|_| GridError::InvalidEntry {
                record,
                field: "wires",
                value: entry.to_string(),
            })
        })
        .collect()
}

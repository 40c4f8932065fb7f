use std::fmt;
use std::str::FromStr;

use gridload_core::{Kilovolts, MegavoltAmperes, Meters, Ohms, RegionId};
use serde::{Deserialize, Serialize};

/// A transmission line as published: voltage and wire fields may list
/// several semicolon-separated values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGridLine {
    pub start: RegionId,
    pub end: RegionId,
    /// Voltages in volts, e.g. `"110000;220000"`. Zero entries are
    /// placeholders.
    pub voltage: String,
    /// Circuits per voltage level, e.g. `"2;1"`.
    pub wires: String,
    pub length_m: Meters,
    pub resistance: Ohms,
    pub capacity: MegavoltAmperes,
}

/// Which raw line a clean record came from.
///
/// The first record split off a source line keeps the bare source index;
/// later ones carry `_1`, `_2`, ... in the order they were split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lineage {
    pub source: usize,
    pub suffix: u32,
}

impl Lineage {
    pub fn new(source: usize, suffix: u32) -> Self {
        Self { source, suffix }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix == 0 {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}_{}", self.source, self.suffix)
        }
    }
}

impl FromStr for Lineage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid lineage key '{s}'");
        let (source, suffix) = match s.split_once('_') {
            Some((source, suffix)) => (source, suffix.parse().map_err(|_| invalid())?),
            None => (s, 0),
        };
        let source = source.parse().map_err(|_| invalid())?;
        Ok(Self { source, suffix })
    }
}

impl TryFrom<String> for Lineage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lineage> for String {
    fn from(value: Lineage) -> Self {
        value.to_string()
    }
}

/// A line carrying exactly one voltage level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanGridLine {
    pub lineage: Lineage,
    pub start: RegionId,
    pub end: RegionId,
    pub voltage: Kilovolts,
    /// Number of circuits at `voltage`.
    pub wires: u32,
    pub length_m: Meters,
    pub resistance: Ohms,
    pub capacity: MegavoltAmperes,
}

impl CleanGridLine {
    pub fn endpoints(&self) -> (&RegionId, &RegionId) {
        (&self.start, &self.end)
    }
}

/// A clean line after bidirectional and parallel duplicates were merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicatedGridLine {
    pub lineage: Lineage,
    pub start: RegionId,
    pub end: RegionId,
    pub voltage: Kilovolts,
    pub wires: u32,
    pub length_m: Meters,
    pub resistance: Ohms,
    pub capacity: MegavoltAmperes,
    /// Clean records folded into this one.
    pub merged: usize,
    /// Loadability factor for the line's length bracket, once assigned.
    pub loadability: Option<f64>,
}

impl From<CleanGridLine> for DeduplicatedGridLine {
    fn from(line: CleanGridLine) -> Self {
        Self {
            lineage: line.lineage,
            start: line.start,
            end: line.end,
            voltage: line.voltage,
            wires: line.wires,
            length_m: line.length_m,
            resistance: line.resistance,
            capacity: line.capacity,
            merged: 1,
            loadability: None,
        }
    }
}

impl From<DeduplicatedGridLine> for CleanGridLine {
    fn from(line: DeduplicatedGridLine) -> Self {
        Self {
            lineage: line.lineage,
            start: line.start,
            end: line.end,
            voltage: line.voltage,
            wires: line.wires,
            length_m: line.length_m,
            resistance: line.resistance,
            capacity: line.capacity,
        }
    }
}

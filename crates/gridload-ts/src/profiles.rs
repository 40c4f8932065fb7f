//! Normalized hourly load profiles per demand sector.
//!
//! Each sector is described by one of three source shapes:
//!
//! - [`ShapeSource::Seasonal`]: one daily shape per (season, day type),
//!   picked for every calendar day (residential, commercial, agricultural);
//! - [`ShapeSource::Flat`]: a single daily shape repeated all year
//!   (industrial);
//! - [`ShapeSource::Stamped`]: a year-long time-stamped series (street
//!   lighting).
//!
//! Daily shapes may be given hourly (24 values) or quarter-hourly (96
//! values, summed four at a time). The year-long result is divided by its
//! own total so every profile sums to one.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use gridload_core::{GridLoadError, ProgressSink};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calendar::{build_calendar, hours_in_year, CalendarLookup, HOURS_PER_DAY};

const STAGE: &str = "sector profiles";
const QUARTERS_PER_HOUR: usize = 4;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0} is not a valid year")]
    InvalidYear(i32),

    #[error("no day type configured for {0}")]
    UnknownDayName(String),

    #[error("no season configured for month {0}")]
    UnknownMonth(u32),

    #[error("sector {0} is required but has no source data")]
    MissingSource(Sector),

    #[error("sector {sector}: no shape for season '{season}' and day type '{day_type}'")]
    MissingShape {
        sector: Sector,
        season: String,
        day_type: String,
    },

    #[error("sector {sector}: daily shape has {found} values, expected 24 or 96")]
    ShapeLength { sector: Sector, found: usize },

    #[error("sector {sector}: stamped series covers {found} hours, expected {expected}")]
    SeriesLength {
        sector: Sector,
        found: usize,
        expected: usize,
    },

    #[error("sector {sector}: negative or non-finite weight {value} at position {index}")]
    InvalidWeight {
        sector: Sector,
        index: usize,
        value: f64,
    },

    #[error("sector {0}: profile total is zero, cannot normalize")]
    ZeroTotal(Sector),

    #[error("unknown sector code '{0}'; use RES, IND, COM, AGR or STR")]
    UnknownSector(String),
}

impl From<ProfileError> for GridLoadError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::InvalidWeight { index, .. } => {
                GridLoadError::stage(STAGE, index, err.to_string())
            }
            ProfileError::ShapeLength { .. }
            | ProfileError::SeriesLength { .. }
            | ProfileError::ZeroTotal(_) => GridLoadError::Validation(err.to_string()),
            _ => GridLoadError::Config(err.to_string()),
        }
    }
}

/// Demand sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "RES")]
    Residential,
    #[serde(rename = "IND")]
    Industrial,
    #[serde(rename = "COM")]
    Commercial,
    #[serde(rename = "AGR")]
    Agricultural,
    #[serde(rename = "STR")]
    StreetLighting,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::Residential,
        Sector::Industrial,
        Sector::Commercial,
        Sector::Agricultural,
        Sector::StreetLighting,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Sector::Residential => "RES",
            Sector::Industrial => "IND",
            Sector::Commercial => "COM",
            Sector::Agricultural => "AGR",
            Sector::StreetLighting => "STR",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sector {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .into_iter()
            .find(|sector| sector.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProfileError::UnknownSector(s.to_string()))
    }
}

/// Key of a daily shape: (season, day type).
pub type DayKey = (String, String);

/// One quarter-hour (or hour) reading of a stamped series.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedReading {
    pub date: NaiveDate,
    pub hour: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSource {
    Seasonal(BTreeMap<DayKey, Vec<f64>>),
    Flat(Vec<f64>),
    Stamped(Vec<StampedReading>),
}

/// Year-long normalized weights per sector.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorProfiles {
    pub year: i32,
    profiles: BTreeMap<Sector, Vec<f64>>,
}

impl SectorProfiles {
    pub fn get(&self, sector: Sector) -> Option<&[f64]> {
        self.profiles.get(&sector).map(Vec::as_slice)
    }

    pub fn sectors(&self) -> impl Iterator<Item = Sector> + '_ {
        self.profiles.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sector, &[f64])> {
        self.profiles.iter().map(|(s, v)| (*s, v.as_slice()))
    }

    pub fn hours(&self) -> usize {
        hours_in_year(self.year)
    }
}

/// Builds the profile of every sector in `sectors`.
///
/// A listed sector without an entry in `sources` is a configuration error,
/// reported before any shape is processed.
pub fn build_profiles(
    year: i32,
    sectors: &[Sector],
    sources: &BTreeMap<Sector, ShapeSource>,
    lookup: &CalendarLookup,
    progress: &dyn ProgressSink,
) -> Result<SectorProfiles, ProfileError> {
    if let Some(missing) = sectors.iter().find(|s| !sources.contains_key(s)) {
        return Err(ProfileError::MissingSource(*missing));
    }
    progress.stage_started(STAGE);
    let calendar = build_calendar(year, lookup)?;
    let hours = hours_in_year(year);

    let mut profiles = BTreeMap::new();
    for (i, sector) in sectors.iter().enumerate() {
        let raw = match &sources[sector] {
            ShapeSource::Seasonal(shapes) => {
                let hourly = shapes
                    .iter()
                    .map(|(key, shape)| Ok((key.clone(), to_hourly(*sector, shape)?)))
                    .collect::<Result<BTreeMap<_, _>, ProfileError>>()?;
                let mut series = Vec::with_capacity(hours);
                for day in &calendar {
                    let key = (day.season.clone(), day.day_type.clone());
                    let shape = hourly.get(&key).ok_or_else(|| ProfileError::MissingShape {
                        sector: *sector,
                        season: day.season.clone(),
                        day_type: day.day_type.clone(),
                    })?;
                    series.extend_from_slice(shape);
                }
                series
            }
            ShapeSource::Flat(shape) => to_hourly(*sector, shape)?.repeat(calendar.len()),
            ShapeSource::Stamped(readings) => stamped_to_hourly(*sector, readings, hours)?,
        };
        let normalized = normalize(*sector, raw)?;
        debug!(sector = sector.code(), hours = normalized.len(), "built sector profile");
        profiles.insert(*sector, normalized);
        progress.advance(STAGE, i + 1, sectors.len());
    }

    info!(year, sectors = profiles.len(), "sector profiles built");
    progress.stage_finished(STAGE);
    Ok(SectorProfiles { year, profiles })
}

/// Collapses a quarter-hourly daily shape to hourly values; hourly shapes
/// pass through.
fn to_hourly(sector: Sector, shape: &[f64]) -> Result<Vec<f64>, ProfileError> {
    match shape.len() {
        HOURS_PER_DAY => Ok(shape.to_vec()),
        n if n == HOURS_PER_DAY * QUARTERS_PER_HOUR => Ok(shape
            .chunks(QUARTERS_PER_HOUR)
            .map(|quarters| quarters.iter().sum())
            .collect()),
        found => Err(ProfileError::ShapeLength { sector, found }),
    }
}

/// Sums consecutive readings sharing a (date, hour) stamp.
///
/// Recorded years often start a quarter-hour past midnight and end at
/// midnight of the following day, which splits the first hour into a
/// bucket at each end of the series. When the result is exactly one hour
/// too long, the last bucket is folded into the first.
fn stamped_to_hourly(
    sector: Sector,
    readings: &[StampedReading],
    hours: usize,
) -> Result<Vec<f64>, ProfileError> {
    let mut buckets: Vec<((NaiveDate, u32), f64)> = Vec::with_capacity(hours + 1);
    for reading in readings {
        let stamp = (reading.date, reading.hour);
        match buckets.last_mut() {
            Some((last, sum)) if *last == stamp => *sum += reading.value,
            _ => buckets.push((stamp, reading.value)),
        }
    }
    let mut values: Vec<f64> = buckets.into_iter().map(|(_, v)| v).collect();
    if values.len() == hours + 1 {
        if let Some(tail) = values.pop() {
            values[0] += tail;
        }
    }
    if values.len() != hours {
        return Err(ProfileError::SeriesLength {
            sector,
            found: values.len(),
            expected: hours,
        });
    }
    Ok(values)
}

fn normalize(sector: Sector, raw: Vec<f64>) -> Result<Vec<f64>, ProfileError> {
    if let Some((index, &value)) = raw
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && **v >= 0.0))
    {
        return Err(ProfileError::InvalidWeight {
            sector,
            index,
            value,
        });
    }
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(ProfileError::ZeroTotal(sector));
    }
    Ok(raw.into_iter().map(|v| v / total).collect())
}

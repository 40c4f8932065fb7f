//! Reconstruction of a gap-free hourly load table from raw country readings.
//!
//! Raw data arrives as one row per (entity, time block), typically a day of
//! 24 hourly readings, together with the share of total demand the
//! readings cover. [`reconstruct`] turns that into one hourly column per
//! target country:
//!
//! 1. keep the rows of the configured year;
//! 2. rescale each reading to full coverage (`reading / coverage * 100`);
//! 3. concatenate each entity's blocks into a year-long hourly series;
//! 4. merge raw entities into target countries by summation;
//! 5. synthesize countries without data from a proxy country's shape;
//! 6. keep the requested countries;
//! 7. repair remaining gaps (see [`crate::gapfill`]).

use std::collections::BTreeMap;

use gridload_core::{Diagnostics, GridLoadError, ProgressSink};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::calendar::hours_in_year;
use crate::gapfill::{fill_series, BoundaryPolicy};

const STAGE: &str = "load reconstruction";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no load readings for year {0}")]
    NoRowsForYear(i32),

    #[error("row {index} ({entity}): coverage ratio {coverage} must be a positive number")]
    InvalidCoverage {
        index: usize,
        entity: String,
        coverage: f64,
    },

    #[error("row {index} ({entity}): expected {expected} readings, found {found}")]
    BlockWidth {
        index: usize,
        entity: String,
        expected: usize,
        found: usize,
    },

    #[error("{entity}: {found} hourly values for the year, expected {expected}")]
    HourCount {
        entity: String,
        found: usize,
        expected: usize,
    },

    #[error("missing country {0} has no proxy and no default proxy is configured")]
    NoProxy(String),

    #[error("proxy {proxy} for {country} is not in the load data")]
    UnknownProxy { country: String, proxy: String },

    #[error("proxy {0} has no positive load to derive a shape from")]
    EmptyProxy(String),

    #[error("country {0} is required but has no load series")]
    MissingCountry(String),

    #[error("{country}: gap at hour {hour} has no complete trend window")]
    InsufficientHistory { country: String, hour: usize },

    #[error("{0}: every hourly value is missing")]
    AllMissing(String),
}

impl From<LoadError> for GridLoadError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::InvalidCoverage { index, .. } | LoadError::BlockWidth { index, .. } => {
                GridLoadError::stage(STAGE, index, err.to_string())
            }
            LoadError::NoProxy(_) | LoadError::UnknownProxy { .. } => {
                GridLoadError::Config(err.to_string())
            }
            _ => GridLoadError::Validation(err.to_string()),
        }
    }
}

/// One raw reading block: consecutive hourly values for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLoadRow {
    pub entity: String,
    pub year: i32,
    /// Optional calendar position; when every row of an entity carries it,
    /// blocks are ordered by it instead of by input order.
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Percentage of total demand covered by the readings.
    pub coverage_ratio: f64,
    pub values: Vec<Option<f64>>,
}

/// A country without measured load, derived from a proxy's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCountry {
    /// Annual consumption the synthesized series must add up to.
    pub annual_total: f64,
    /// Country whose hourly shape is borrowed; falls back to
    /// [`ReconstructionConfig::default_proxy`].
    #[serde(default)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    pub year: i32,
    /// Raw entity name to target country; unmapped entities keep their name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_countries: BTreeMap<String, MissingCountry>,
    #[serde(default)]
    pub default_proxy: Option<String>,
    /// Countries in the output, in output order. Empty keeps every country.
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
}

/// Hourly load per country; one column per country, one row per hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyLoadTable {
    pub year: i32,
    countries: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl HourlyLoadTable {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            countries: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn hours(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn series(&self, country: &str) -> Option<&[Option<f64>]> {
        self.position(country).map(|i| self.columns[i].as_slice())
    }

    pub fn value(&self, country: &str, hour: usize) -> Option<f64> {
        self.series(country)?.get(hour).copied().flatten()
    }

    /// Sum of the known values of `country`.
    pub fn annual_total(&self, country: &str) -> Option<f64> {
        self.series(country)
            .map(|s| s.iter().flatten().copied().sum())
    }

    pub fn missing_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.countries
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Inserts or replaces the series for `country`.
    pub fn insert(&mut self, country: &str, series: Vec<Option<f64>>) {
        match self.position(country) {
            Some(i) => self.columns[i] = series,
            None => {
                self.countries.push(country.to_string());
                self.columns.push(series);
            }
        }
    }

    fn position(&self, country: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == country)
    }

    fn accumulate(&mut self, country: &str, series: Vec<Option<f64>>) {
        match self.position(country) {
            Some(i) => {
                for (acc, v) in self.columns[i].iter_mut().zip(series) {
                    *acc = match (*acc, v) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    };
                }
            }
            None => self.insert(country, series),
        }
    }
}

/// Output of [`reconstruct`].
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub table: HourlyLoadTable,
    pub filled: usize,
    pub diagnostics: Diagnostics,
}

pub fn reconstruct(
    rows: &[RawLoadRow],
    config: &ReconstructionConfig,
    progress: &dyn ProgressSink,
) -> Result<Reconstruction, LoadError> {
    progress.stage_started(STAGE);
    let expected_hours = hours_in_year(config.year);

    let entities = entity_series(rows, config.year)?;
    info!(
        year = config.year,
        entities = entities.len(),
        "assembled raw load series"
    );

    let mut merged = HourlyLoadTable::new(config.year);
    for (entity, series) in entities {
        if series.len() != expected_hours {
            return Err(LoadError::HourCount {
                entity,
                found: series.len(),
                expected: expected_hours,
            });
        }
        let country = config.rename.get(&entity).unwrap_or(&entity);
        merged.accumulate(country, series);
    }

    synthesize_missing(&mut merged, config)?;

    let mut table = select_countries(merged, &config.countries)?;

    let mut diagnostics = Diagnostics::new();
    let mut filled = 0;
    let total = table.columns.len();
    for (i, (country, column)) in table
        .countries
        .iter()
        .zip(table.columns.iter_mut())
        .enumerate()
    {
        let n = fill_series(column, country, config.boundary, &mut diagnostics)?;
        if n > 0 {
            debug!(country = country.as_str(), filled = n, "filled load gaps");
        }
        filled += n;
        progress.advance(STAGE, i + 1, total);
    }

    info!(
        countries = table.countries.len(),
        hours = table.hours(),
        filled = filled,
        "load reconstruction finished"
    );
    progress.stage_finished(STAGE);
    Ok(Reconstruction {
        table,
        filled,
        diagnostics,
    })
}

/// Rescaled, concatenated hourly series per raw entity, in first-seen order.
fn entity_series(rows: &[RawLoadRow], year: i32) -> Result<Vec<(String, Vec<Option<f64>>)>, LoadError> {
    let mut order: Vec<String> = Vec::new();
    let mut blocks: BTreeMap<&str, Vec<(usize, &RawLoadRow)>> = BTreeMap::new();
    let mut width = None;

    for (index, row) in rows.iter().enumerate().filter(|(_, r)| r.year == year) {
        if !(row.coverage_ratio.is_finite() && row.coverage_ratio > 0.0) {
            return Err(LoadError::InvalidCoverage {
                index,
                entity: row.entity.clone(),
                coverage: row.coverage_ratio,
            });
        }
        let expected = *width.get_or_insert(row.values.len());
        if row.values.len() != expected {
            return Err(LoadError::BlockWidth {
                index,
                entity: row.entity.clone(),
                expected,
                found: row.values.len(),
            });
        }
        let entry = blocks.entry(row.entity.as_str()).or_default();
        if entry.is_empty() {
            order.push(row.entity.clone());
        }
        entry.push((index, row));
    }

    if order.is_empty() {
        return Err(LoadError::NoRowsForYear(year));
    }

    let mut out = Vec::with_capacity(order.len());
    for entity in order {
        let mut entity_rows = blocks.remove(entity.as_str()).unwrap_or_default();
        if entity_rows
            .iter()
            .all(|(_, r)| r.month.is_some() && r.day.is_some())
        {
            entity_rows.sort_by_key(|(index, r)| (r.month, r.day, *index));
        }
        let series = entity_rows
            .iter()
            .flat_map(|(_, row)| {
                let scale = 100.0 / row.coverage_ratio;
                row.values.iter().map(move |v| v.map(|x| x * scale))
            })
            .collect();
        out.push((entity, series));
    }
    Ok(out)
}

fn synthesize_missing(table: &mut HourlyLoadTable, config: &ReconstructionConfig) -> Result<(), LoadError> {
    for (country, missing) in &config.missing_countries {
        let proxy = missing
            .proxy
            .as_ref()
            .or(config.default_proxy.as_ref())
            .ok_or_else(|| LoadError::NoProxy(country.clone()))?;
        let shape = table.series(proxy).ok_or_else(|| LoadError::UnknownProxy {
            country: country.clone(),
            proxy: proxy.clone(),
        })?;
        let proxy_total: f64 = shape.iter().flatten().copied().sum();
        if !(proxy_total.is_finite() && proxy_total > 0.0) {
            return Err(LoadError::EmptyProxy(proxy.clone()));
        }
        let factor = missing.annual_total / proxy_total;
        let series = shape.iter().map(|v| v.map(|x| x * factor)).collect();
        if table.series(country).is_some() {
            debug!(country = country.as_str(), "replacing measured series with proxy shape");
        }
        table.insert(country, series);
    }
    Ok(())
}

fn select_countries(
    mut table: HourlyLoadTable,
    countries: &[String],
) -> Result<HourlyLoadTable, LoadError> {
    if countries.is_empty() {
        return Ok(table);
    }
    let mut selected = HourlyLoadTable::new(table.year);
    for country in countries {
        let i = table
            .position(country)
            .ok_or_else(|| LoadError::MissingCountry(country.clone()))?;
        let series = std::mem::take(&mut table.columns[i]);
        selected.insert(country, series);
    }
    Ok(selected)
}

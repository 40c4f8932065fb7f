//! Pipeline configuration, read from a single TOML file.
//!
//! ```toml
//! year = 2015
//!
//! [load]
//! countries = ["DE", "FR"]
//! sectors = ["RES", "IND"]
//! boundary = "carry-forward"
//!
//! [load.day_types]
//! Monday = "Working day"
//!
//! [load.seasons]
//! 1 = "Winter"
//!
//! [load.profiles]
//! RES = "profiles/res.csv"
//!
//! [grid]
//! split_policy = "apportion"
//!
//! [grid.loadability]
//! 80 = 3.0
//! ```
//!
//! Relative profile paths are resolved against the directory holding the
//! configuration file. The file is validated when it is loaded, before any
//! data is read, but only for the stages the caller is about to run: `grid
//! clean` does not need a load section and `load profiles` does not need a
//! loadability table.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gridload_core::{GridLoadError, GridLoadResult};
use gridload_grid::{LoadabilityTable, SplitPolicy};
use gridload_ts::{BoundaryPolicy, CalendarLookup, MissingCountry, ReconstructionConfig, Sector};
use serde::{Deserialize, Serialize};

const YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub year: i32,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Output countries, in output order
    #[serde(default)]
    pub countries: Vec<String>,
    /// Sectors that need a profile
    #[serde(default)]
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
    /// Proxy for missing countries that do not name their own
    #[serde(default)]
    pub default_proxy: Option<String>,
    /// Raw entity name to target country
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    #[serde(default)]
    pub missing_countries: BTreeMap<String, MissingCountry>,
    /// Weekday name to day type
    #[serde(default)]
    pub day_types: BTreeMap<String, String>,
    /// Month number to season
    #[serde(default)]
    pub seasons: BTreeMap<String, String>,
    /// Sector code to shape source file
    #[serde(default)]
    pub profiles: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub split_policy: SplitPolicy,
    /// Bracket upper bound (m) to loadability factor
    #[serde(default)]
    pub loadability: BTreeMap<String, f64>,
}

/// Pipeline stage a configuration is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reconstruct,
    Profiles,
    Grid,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Reconstruct, Stage::Profiles, Stage::Grid];
}

/// Reads the configuration at `path` and validates what `stages` need.
pub fn load_config(path: &Path, stages: &[Stage]) -> GridLoadResult<PipelineConfig> {
    let contents = fs::read_to_string(path)?;
    let mut config = parse_config(&contents)
        .map_err(|err| GridLoadError::Config(format!("{}: {err}", path.display())))?;
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    config.validate(stages)?;
    Ok(config)
}

fn parse_config(contents: &str) -> GridLoadResult<PipelineConfig> {
    toml::from_str(contents).map_err(|err| GridLoadError::Config(err.to_string()))
}

impl PipelineConfig {
    pub fn validate(&self, stages: &[Stage]) -> GridLoadResult<()> {
        if !YEARS.contains(&self.year) {
            return Err(GridLoadError::Config(format!(
                "year {} is outside {}..={}",
                self.year,
                YEARS.start(),
                YEARS.end()
            )));
        }
        for stage in stages {
            match stage {
                Stage::Reconstruct => self.validate_reconstruction()?,
                Stage::Profiles => self.validate_profiles()?,
                Stage::Grid => {
                    self.loadability()?;
                }
            }
        }
        Ok(())
    }

    fn validate_reconstruction(&self) -> GridLoadResult<()> {
        if self.load.countries.is_empty() {
            return Err(GridLoadError::Config(
                "load.countries must list at least one country".into(),
            ));
        }
        let default_proxy = self.load.default_proxy.as_ref();
        for (country, missing) in &self.load.missing_countries {
            if missing.proxy.is_none() && default_proxy.is_none() {
                return Err(GridLoadError::Config(format!(
                    "missing country {country} has no proxy and load.default_proxy is not set"
                )));
            }
            if !(missing.annual_total.is_finite() && missing.annual_total >= 0.0) {
                return Err(GridLoadError::Config(format!(
                    "missing country {country}: annual_total {} must be a non-negative number",
                    missing.annual_total
                )));
            }
        }
        Ok(())
    }

    fn validate_profiles(&self) -> GridLoadResult<()> {
        let sources = self.profile_sources()?;
        if let Some(sector) = self.load.sectors.iter().find(|s| !sources.contains_key(s)) {
            return Err(GridLoadError::Config(format!(
                "sector {sector} is required but load.profiles has no source for it"
            )));
        }
        self.calendar()?.validate()?;
        Ok(())
    }

    pub fn reconstruction(&self) -> ReconstructionConfig {
        ReconstructionConfig {
            year: self.year,
            rename: self.load.rename.clone(),
            missing_countries: self.load.missing_countries.clone(),
            default_proxy: self.load.default_proxy.clone(),
            countries: self.load.countries.clone(),
            boundary: self.load.boundary,
        }
    }

    pub fn calendar(&self) -> GridLoadResult<CalendarLookup> {
        let mut seasons = BTreeMap::new();
        for (month, season) in &self.load.seasons {
            let month = month
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|m| (1..=12).contains(m))
                .ok_or_else(|| {
                    GridLoadError::Config(format!("load.seasons: '{month}' is not a month number"))
                })?;
            seasons.insert(month, season.clone());
        }
        Ok(CalendarLookup {
            day_types: self.load.day_types.clone(),
            seasons,
        })
    }

    /// Shape source per sector, with relative paths resolved.
    pub fn profile_sources(&self) -> GridLoadResult<BTreeMap<Sector, PathBuf>> {
        self.load
            .profiles
            .iter()
            .map(|(code, path)| {
                let sector = code
                    .parse::<Sector>()
                    .map_err(|err| GridLoadError::Config(format!("load.profiles: {err}")))?;
                Ok((sector, self.base_dir.join(path)))
            })
            .collect()
    }

    pub fn loadability(&self) -> GridLoadResult<LoadabilityTable> {
        Ok(LoadabilityTable::from_config(&self.grid.loadability)?)
    }
}

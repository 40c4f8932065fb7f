//! Table I/O for raw load readings, sector shape sources, and the hourly
//! outputs.
//!
//! Everything goes through a polars `DataFrame`. Outputs are first written
//! to `<parent>/<stage>/<file>` and then copied to the requested path, so a
//! failed run never leaves a half-written file at the destination.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
#[cfg(feature = "parquet")]
use polars::prelude::{ParquetReader, ParquetWriter};

use crate::load::{HourlyLoadTable, RawLoadRow};
use crate::profiles::{SectorProfiles, ShapeSource, StampedReading};

/// Reads a `.csv` (or, with the `parquet` feature, `.parquet`) file.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let extension = extension_of(path);
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match extension.as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => {
            let reader = ParquetReader::new(&mut file);
            reader.finish().context("reading Parquet file")
        }
        #[cfg(not(feature = "parquet"))]
        "parquet" => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
        "csv" => {
            let reader = CsvReader::new(&mut file);
            reader.has_header(true).finish().context("reading CSV file")
        }
        _ => Err(anyhow!(
            "unsupported file extension '{}'; use .csv or .parquet",
            extension
        )),
    }
}

/// Reads raw load blocks: `entity`, `year`, `coverage_ratio`, optional
/// `month` and `day`, then hour columns named `0`, `1`, ... or `hour_0`,
/// `hour_1`, ...
pub fn read_raw_load(path: &Path) -> Result<Vec<RawLoadRow>> {
    let df = read_frame(path)?;
    let entities = str_column(&df, "entity")?;
    let years = int_column(&df, "year")?;
    let coverage = float_column(&df, "coverage_ratio")?;
    let months = optional_int_column(&df, "month")?;
    let days = optional_int_column(&df, "day")?;

    let hour_names = hour_columns(&df);
    if hour_names.is_empty() {
        bail!(
            "{} has no hour columns; expected '0', '1', ... or 'hour_0', 'hour_1', ...",
            path.display()
        );
    }
    let hours = hour_names
        .iter()
        .map(|name| float_column(&df, name))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let entity = entities[i]
            .clone()
            .ok_or_else(|| anyhow!("row {i}: missing entity"))?;
        let year = years[i].ok_or_else(|| anyhow!("row {i}: missing year"))?;
        let coverage_ratio = coverage[i].ok_or_else(|| anyhow!("row {i}: missing coverage_ratio"))?;
        rows.push(RawLoadRow {
            entity,
            year: i32::try_from(year).with_context(|| format!("row {i}: year {year} out of range"))?,
            month: month_day(&months, i)?,
            day: month_day(&days, i)?,
            coverage_ratio,
            values: hours.iter().map(|column| column[i]).collect(),
        });
    }
    Ok(rows)
}

/// Reads a sector shape source, picking the layout from the columns:
/// `date`/`time`/`value` is a stamped series, a single `load` column is a
/// flat daily shape, and `season|day_type` columns are seasonal shapes.
pub fn read_shape_source(path: &Path) -> Result<ShapeSource> {
    let df = read_frame(path)?;
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let has = |name: &str| names.iter().any(|n| n == name);

    if has("date") && has("time") && has("value") {
        return read_stamped(&df).with_context(|| format!("reading stamped series {}", path.display()));
    }
    if has("load") {
        let shape = dense(float_column(&df, "load")?, "load")?;
        return Ok(ShapeSource::Flat(shape));
    }

    let mut shapes = BTreeMap::new();
    for name in &names {
        let Some((season, day_type)) = name.split_once('|') else {
            continue;
        };
        let shape = dense(float_column(&df, name)?, name)?;
        shapes.insert((season.trim().to_string(), day_type.trim().to_string()), shape);
    }
    if shapes.is_empty() {
        bail!(
            "{}: no 'season|day_type' columns, no 'load' column, and no date/time/value columns",
            path.display()
        );
    }
    Ok(ShapeSource::Seasonal(shapes))
}

fn read_stamped(df: &DataFrame) -> Result<ShapeSource> {
    let dates = str_column(df, "date")?;
    let times = str_column(df, "time")?;
    let values = float_column(df, "value")?;
    let mut readings = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date = dates[i]
            .as_deref()
            .ok_or_else(|| anyhow!("row {i}: missing date"))?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .with_context(|| format!("row {i}: invalid date '{date}'"))?;
        let time = times[i]
            .as_deref()
            .ok_or_else(|| anyhow!("row {i}: missing time"))?;
        let hour = time
            .trim()
            .split(':')
            .next()
            .and_then(|h| h.parse::<u32>().ok())
            .filter(|h| *h < 24)
            .ok_or_else(|| anyhow!("row {i}: invalid time '{time}'"))?;
        let value = values[i].ok_or_else(|| anyhow!("row {i}: missing value"))?;
        readings.push(StampedReading { date, hour, value });
    }
    Ok(ShapeSource::Stamped(readings))
}

/// Writes the reconstructed table as `hour` plus one column per country.
pub fn write_load_table(table: &HourlyLoadTable, path: &Path) -> Result<()> {
    let mut columns = vec![hour_series(table.hours())];
    for (country, series) in table.iter() {
        columns.push(Series::new(country, series.to_vec()));
    }
    let mut df = DataFrame::new(columns).context("assembling load table")?;
    write_frame_staged(&mut df, path, "load-reconstruct")
}

/// Writes normalized profiles as `hour` plus one column per sector code.
pub fn write_profiles(profiles: &SectorProfiles, path: &Path) -> Result<()> {
    let mut columns = vec![hour_series(profiles.hours())];
    for (sector, weights) in profiles.iter() {
        columns.push(Series::new(sector.code(), weights.to_vec()));
    }
    let mut df = DataFrame::new(columns).context("assembling profile table")?;
    write_frame_staged(&mut df, path, "load-profiles")
}

fn hour_series(hours: usize) -> Series {
    Series::new("hour", (0..hours as i64).collect::<Vec<i64>>())
}

fn write_frame_staged(df: &mut DataFrame, path: &Path, stage: &str) -> Result<()> {
    let staged = staged_output_path(path, stage);
    if let Some(parent) = staged.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(&staged).with_context(|| format!("creating {}", staged.display()))?;
    match extension_of(&staged).as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => ParquetWriter::new(&mut file)
            .finish(df)
            .map(|_| ())
            .context("writing Parquet file")?,
        #[cfg(not(feature = "parquet"))]
        "parquet" => bail!("parquet support is disabled; rebuild with the 'parquet' feature"),
        "csv" => CsvWriter::new(&mut file)
            .finish(df)
            .context("writing CSV file")?,
        _ => bail!(
            "unsupported output extension for {}; use .csv or .parquet",
            staged.display()
        ),
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&staged, path)
        .with_context(|| format!("copying {} to {}", staged.display(), path.display()))?;
    Ok(())
}

/// Where `write_frame_staged` puts its intermediate copy of `output`.
pub fn staged_output_path(output: &Path, stage: &str) -> PathBuf {
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    let file_name = output.file_name().unwrap_or_else(|| OsStr::new("output"));
    parent.join(stage).join(file_name)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

fn hour_columns(df: &DataFrame) -> Vec<String> {
    let mut names = Vec::new();
    for hour in 0.. {
        let bare = hour.to_string();
        let prefixed = format!("hour_{hour}");
        if df.column(&bare).is_ok() {
            names.push(bare);
        } else if df.column(&prefixed).is_ok() {
            names.push(prefixed);
        } else {
            break;
        }
    }
    names
}

/// Casts a column without turning unparsable cells into nulls. Empty cells
/// stay null; anything else that does not convert names its row.
fn strict_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let column = df
        .column(name)
        .with_context(|| format!("missing column '{name}'"))?;
    match column.strict_cast(dtype) {
        Ok(series) => Ok(series),
        Err(err) => {
            let lenient = column.cast(dtype)?;
            for row in 0..column.len() {
                let raw = column.get(row)?;
                if !matches!(raw, AnyValue::Null) && matches!(lenient.get(row)?, AnyValue::Null) {
                    bail!("row {row}: column '{name}' value {raw} is not a valid {dtype}");
                }
            }
            Err(err).with_context(|| format!("casting column '{name}' to {dtype}"))
        }
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = strict_column(df, name, &DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = strict_column(df, name, &DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

fn optional_int_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<i64>>>> {
    if df.column(name).is_err() {
        return Ok(None);
    }
    int_column(df, name).map(Some)
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .with_context(|| format!("missing column '{name}'"))?
        .cast(&DataType::Utf8)
        .with_context(|| format!("casting column '{name}' to text"))?;
    Ok(series
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn month_day(column: &Option<Vec<Option<i64>>>, row: usize) -> Result<Option<u32>> {
    match column.as_ref().and_then(|c| c[row]) {
        Some(v) => u32::try_from(v)
            .map(Some)
            .with_context(|| format!("row {row}: negative month/day {v}")),
        None => Ok(None),
    }
}

fn dense(values: Vec<Option<f64>>, column: &str) -> Result<Vec<f64>> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| anyhow!("column '{column}' has an empty cell at row {i}")))
        .collect()
}

use std::collections::BTreeMap;
use std::fs;

use gridload_core::NullProgress;
use gridload_ts::{
    build_profiles, hours_in_year, io, reconstruct, BoundaryPolicy, CalendarLookup, MissingCountry,
    RawLoadRow, ReconstructionConfig, Sector, ShapeSource,
};
use tempfile::tempdir;

fn lookup() -> CalendarLookup {
    let mut lookup = CalendarLookup::default();
    for day in ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"] {
        lookup.day_types.insert(day.into(), "Working day".into());
    }
    lookup.day_types.insert("Saturday".into(), "Saturday".into());
    lookup.day_types.insert("Sunday".into(), "Sunday".into());
    for month in 1..=12u32 {
        let season = if (4..=9).contains(&month) { "Summer" } else { "Winter" };
        lookup.seasons.insert(month, season.into());
    }
    lookup
}

const DAILY_CYCLE_TOTAL: f64 = 5160.0;
/// Sum of the readings `raw_rows` leaves out when `gaps` is set.
const GAP_TOTAL: f64 = 7.0 * (180.0 + 190.0 + 200.0 + 210.0);

/// Daily rows with a daily cycle, optionally with hours 8-11 missing on
/// every 50th day.
fn raw_rows(entity: &str, year: i32, coverage: f64, gaps: bool) -> Vec<RawLoadRow> {
    let days = hours_in_year(year) / 24;
    (0..days)
        .map(|d| RawLoadRow {
            entity: entity.to_string(),
            year,
            month: None,
            day: None,
            coverage_ratio: coverage,
            values: (0..24)
                .map(|h| {
                    if gaps && d > 1 && d % 50 == 0 && (8..12).contains(&h) {
                        None
                    } else {
                        Some(100.0 + 10.0 * h as f64)
                    }
                })
                .collect(),
        })
        .collect()
}

fn albania_from_luxembourg() -> ReconstructionConfig {
    ReconstructionConfig {
        year: 2015,
        rename: BTreeMap::from([("Deutschland".into(), "DE".into())]),
        missing_countries: BTreeMap::from([(
            "AL".into(),
            MissingCountry {
                annual_total: 6_500_000.0,
                proxy: None,
            },
        )]),
        default_proxy: Some("Luxembourg".into()),
        countries: vec!["DE".into(), "AL".into()],
        boundary: BoundaryPolicy::Error,
    }
}

#[test]
fn reconstructed_table_is_complete_after_history_window() {
    let mut rows = raw_rows("Deutschland", 2015, 90.0, true);
    rows.extend(raw_rows("Luxembourg", 2015, 100.0, false));
    rows.extend(raw_rows("France", 2014, 100.0, true));

    let out = reconstruct(&rows, &albania_from_luxembourg(), &NullProgress).unwrap();

    assert_eq!(out.table.countries(), ["DE".to_string(), "AL".to_string()]);
    assert_eq!(out.table.hours(), 8760);
    for (_, series) in out.table.iter() {
        assert!(series[29..].iter().all(Option::is_some));
    }
    assert_eq!(out.filled, 28);

    let al = out.table.annual_total("AL").unwrap();
    assert!((al / 6_500_000.0 - 1.0).abs() < 1e-9, "AL total {al}");
}

#[test]
fn proxy_gaps_raise_the_synthesized_total_once_filled() {
    let mut rows = raw_rows("Deutschland", 2015, 90.0, false);
    rows.extend(raw_rows("Luxembourg", 2015, 100.0, true));

    let out = reconstruct(&rows, &albania_from_luxembourg(), &NullProgress).unwrap();
    assert_eq!(out.filled, 28);

    // the shape is scaled on the observed proxy hours, then the copied gaps
    // are filled on top of the target total
    let observed = 365.0 * DAILY_CYCLE_TOTAL - GAP_TOTAL;
    let expected = 6_500_000.0 * (observed + GAP_TOTAL) / observed;
    let al = out.table.annual_total("AL").unwrap();
    assert!(al > 6_500_000.0);
    assert!((al / expected - 1.0).abs() < 1e-9, "AL total {al}, expected {expected}");
}

#[test]
fn every_profile_sums_to_one() {
    let mut seasonal = BTreeMap::new();
    for season in ["Summer", "Winter"] {
        for day in ["Working day", "Saturday", "Sunday"] {
            let shape = (0..96).map(|q| 1.0 + (q % 7) as f64).collect();
            seasonal.insert((season.to_string(), day.to_string()), shape);
        }
    }
    let sources = BTreeMap::from([
        (Sector::Residential, ShapeSource::Seasonal(seasonal.clone())),
        (Sector::Commercial, ShapeSource::Seasonal(seasonal)),
        (
            Sector::Industrial,
            ShapeSource::Flat((0..24).map(|h| 50.0 + h as f64).collect()),
        ),
    ]);
    let sectors = [Sector::Residential, Sector::Industrial, Sector::Commercial];
    let profiles = build_profiles(2016, &sectors, &sources, &lookup(), &NullProgress).unwrap();

    for (sector, weights) in profiles.iter() {
        assert_eq!(weights.len(), 8784, "{sector}");
        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "{sector} sums to {sum}");
    }
}

#[test]
fn csv_round_trip_through_reconstruction() {
    let dir = tempdir().unwrap();
    let raw = dir.path().join("raw.csv");
    let mut text = String::from("entity,year,coverage_ratio");
    for h in 0..24 {
        text.push_str(&format!(",{h}"));
    }
    text.push('\n');
    for _ in 0..365 {
        text.push_str("DE,2015,50");
        for h in 0..24 {
            text.push_str(&format!(",{}", 10 + h));
        }
        text.push('\n');
    }
    fs::write(&raw, text).unwrap();

    let rows = io::read_raw_load(&raw).unwrap();
    let config = ReconstructionConfig {
        year: 2015,
        ..Default::default()
    };
    let out = reconstruct(&rows, &config, &NullProgress).unwrap();
    assert_eq!(out.table.value("DE", 25), Some(22.0));

    let dest = dir.path().join("load.csv");
    io::write_load_table(&out.table, &dest).unwrap();
    let written = fs::read_to_string(&dest).unwrap();
    assert_eq!(written.lines().next(), Some("hour,DE"));
    assert_eq!(written.lines().count(), 8761);
}

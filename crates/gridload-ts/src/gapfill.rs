//! Trend-based repair of missing hourly load values.
//!
//! A missing value at hour `i` is estimated from the same hour of the
//! previous day, scaled by how the last five hours compare with the same
//! five hours one day earlier:
//!
//! ```text
//! v[i] = sum(v[i-5..i]) / sum(v[i-29..i-24]) * v[i-24]
//! ```
//!
//! Gaps are resolved in ascending hour order, so a filled value can feed the
//! window of a later gap. The first [`MIN_HISTORY`] hours do not have a full
//! window; what happens there is chosen by [`BoundaryPolicy`]. Past that
//! point a window can still be incomplete when [`BoundaryPolicy::Skip`] left
//! an early gap open; such gaps take the nearest observed value so every
//! hour from [`MIN_HISTORY`] on ends up filled.

use gridload_core::Diagnostics;
use serde::{Deserialize, Serialize};

use crate::load::LoadError;

/// Hours in the trailing trend window.
pub const TREND_WINDOW: usize = 5;
/// Offset of the reference day.
pub const DAY_OFFSET: usize = 24;
/// First hour for which the trend rule has a complete window.
pub const MIN_HISTORY: usize = TREND_WINDOW + DAY_OFFSET;

const CATEGORY: &str = "gap-fill";

/// What to do with a gap the trend rule cannot handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Fail with [`LoadError::InsufficientHistory`].
    Error,
    /// Leave the value missing and record a diagnostic.
    Skip,
    /// Copy the nearest earlier value, or the nearest later one at the very
    /// start of the series.
    #[default]
    CarryForward,
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "skip" => Ok(Self::Skip),
            "carry-forward" | "carry_forward" => Ok(Self::CarryForward),
            other => Err(format!(
                "unknown boundary policy '{other}'; use error, skip, or carry-forward"
            )),
        }
    }
}

/// Fills the gaps of one country's series in place.
///
/// Returns the number of values that were filled.
pub fn fill_series(
    values: &mut [Option<f64>],
    country: &str,
    policy: BoundaryPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<usize, LoadError> {
    let mut filled = 0;
    for hour in 0..values.len() {
        if values[hour].is_some() {
            continue;
        }
        let estimate = match trend_estimate(values, hour) {
            Some(Trend { value, flat }) => {
                if flat {
                    diagnostics.add_warning_with_entity(
                        CATEGORY,
                        &format!("hour {hour}: reference window sums to zero, repeated previous day"),
                        country,
                    );
                }
                Some(value)
            }
            None if hour >= MIN_HISTORY => {
                let value = nearest_value(values, hour, country)?;
                diagnostics.add_warning_with_entity(
                    CATEGORY,
                    &format!("hour {hour}: trend window has an unfilled gap, carried nearest value"),
                    country,
                );
                Some(value)
            }
            None => boundary_fill(values, hour, country, policy, diagnostics)?,
        };
        if let Some(value) = estimate {
            values[hour] = Some(value);
            filled += 1;
        }
    }
    Ok(filled)
}

struct Trend {
    value: f64,
    /// The reference window summed to zero and the ratio was taken as 1.
    flat: bool,
}

fn trend_estimate(values: &[Option<f64>], hour: usize) -> Option<Trend> {
    if hour < MIN_HISTORY {
        return None;
    }
    let recent = window_sum(&values[hour - TREND_WINDOW..hour])?;
    let reference = window_sum(&values[hour - MIN_HISTORY..hour - DAY_OFFSET])?;
    let previous_day = values[hour - DAY_OFFSET]?;
    if reference == 0.0 {
        return Some(Trend {
            value: previous_day,
            flat: true,
        });
    }
    Some(Trend {
        value: recent / reference * previous_day,
        flat: false,
    })
}

fn window_sum(window: &[Option<f64>]) -> Option<f64> {
    window.iter().copied().sum()
}

fn boundary_fill(
    values: &[Option<f64>],
    hour: usize,
    country: &str,
    policy: BoundaryPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<Option<f64>, LoadError> {
    match policy {
        BoundaryPolicy::Error => Err(LoadError::InsufficientHistory {
            country: country.to_string(),
            hour,
        }),
        BoundaryPolicy::Skip => {
            diagnostics.add_warning_with_entity(
                CATEGORY,
                &format!("hour {hour}: not enough history, left missing"),
                country,
            );
            Ok(None)
        }
        BoundaryPolicy::CarryForward => {
            let value = nearest_value(values, hour, country)?;
            diagnostics.add_warning_with_entity(
                CATEGORY,
                &format!("hour {hour}: not enough history, carried nearest value"),
                country,
            );
            Ok(Some(value))
        }
    }
}

/// Nearest earlier observed value, or the nearest later one when nothing
/// precedes `hour`.
fn nearest_value(values: &[Option<f64>], hour: usize, country: &str) -> Result<f64, LoadError> {
    values[..hour]
        .iter()
        .rev()
        .find_map(|v| *v)
        .or_else(|| values[hour + 1..].iter().find_map(|v| *v))
        .ok_or_else(|| LoadError::AllMissing(country.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_series(len: usize, value: f64) -> Vec<Option<f64>> {
        vec![Some(value); len]
    }

    #[test]
    fn trend_rule_scales_previous_day() {
        let mut values = flat_series(72, 10.0);
        // the five hours before hour 50 ran 20% hot
        for v in &mut values[45..50] {
            *v = Some(12.0);
        }
        values[50] = None;
        let mut diag = Diagnostics::new();
        let filled = fill_series(&mut values, "DE", BoundaryPolicy::Error, &mut diag).unwrap();
        assert_eq!(filled, 1);
        let v = values[50].unwrap();
        assert!((v - 12.0).abs() < 1e-12, "got {v}");
        assert!(!diag.has_issues());
    }

    #[test]
    fn consecutive_gaps_feed_each_other() {
        let mut values: Vec<Option<f64>> = (0..96).map(|h| Some(1.0 + (h % 24) as f64)).collect();
        for v in &mut values[60..64] {
            *v = None;
        }
        let mut diag = Diagnostics::new();
        let filled = fill_series(&mut values, "FR", BoundaryPolicy::Error, &mut diag).unwrap();
        assert_eq!(filled, 4);
        assert!(values.iter().all(Option::is_some));
        // a perfectly periodic series is reproduced exactly
        for h in 60..64 {
            let expected = 1.0 + (h % 24) as f64;
            assert!((values[h].unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_reference_window_repeats_previous_day() {
        let mut values = flat_series(48, 0.0);
        values[30] = Some(0.0);
        values[40] = None;
        values[16] = Some(7.0);
        let mut diag = Diagnostics::new();
        fill_series(&mut values, "NO", BoundaryPolicy::Error, &mut diag).unwrap();
        assert_eq!(values[40], Some(7.0));
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn early_gap_with_error_policy_fails() {
        let mut values = flat_series(48, 5.0);
        values[10] = None;
        let err = fill_series(&mut values, "IT", BoundaryPolicy::Error, &mut Diagnostics::new())
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::InsufficientHistory { ref country, hour: 10 } if country == "IT"
        ));
    }

    #[test]
    fn early_gap_with_skip_policy_stays_missing() {
        let mut values = flat_series(48, 5.0);
        values[3] = None;
        let mut diag = Diagnostics::new();
        let filled = fill_series(&mut values, "IT", BoundaryPolicy::Skip, &mut diag).unwrap();
        assert_eq!(filled, 0);
        assert!(values[3].is_none());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn skipped_early_gap_does_not_leave_later_gaps_open() {
        let mut values = flat_series(72, 5.0);
        values[29] = Some(6.0);
        values[3] = None;
        values[30] = None;
        let mut diag = Diagnostics::new();
        let filled = fill_series(&mut values, "IT", BoundaryPolicy::Skip, &mut diag).unwrap();
        assert_eq!(filled, 1);
        assert!(values[3].is_none());
        assert_eq!(values[30], Some(6.0));
        assert!(values[MIN_HISTORY..].iter().all(Option::is_some));
        let messages: Vec<&str> = diag.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("hour 30: trend window has an unfilled gap"));
    }

    #[test]
    fn carry_forward_uses_nearest_neighbour() {
        let mut values = flat_series(48, 5.0);
        values[0] = None;
        values[1] = None;
        values[2] = Some(9.0);
        values[7] = None;
        values[6] = Some(4.0);
        let mut diag = Diagnostics::new();
        let filled =
            fill_series(&mut values, "AT", BoundaryPolicy::CarryForward, &mut diag).unwrap();
        assert_eq!(filled, 3);
        // nothing earlier than hour 0, so the first later value is used
        assert_eq!(values[0], Some(9.0));
        // hour 1 now has the filled hour 0 before it
        assert_eq!(values[1], Some(9.0));
        assert_eq!(values[7], Some(4.0));
    }

    #[test]
    fn empty_series_cannot_be_carried() {
        let mut values = vec![None; 30];
        let err = fill_series(
            &mut values,
            "LU",
            BoundaryPolicy::CarryForward,
            &mut Diagnostics::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::AllMissing(ref c) if c == "LU"));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("skip".parse::<BoundaryPolicy>(), Ok(BoundaryPolicy::Skip));
        assert_eq!(
            "carry_forward".parse::<BoundaryPolicy>(),
            Ok(BoundaryPolicy::CarryForward)
        );
        assert!("zero".parse::<BoundaryPolicy>().is_err());
    }
}

//! Calendar skeleton for a model year.
//!
//! Every date of the year is tagged with a day type (looked up by weekday
//! name, e.g. `"Sunday" -> "Sunday/Holiday"`) and a season (looked up by
//! month number). The sector profile builder picks one daily shape per
//! calendar day from these two tags.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::profiles::ProfileError;

pub const HOURS_PER_DAY: usize = 24;

/// Number of days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> usize {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Number of hours in `year` (8760 or 8784).
pub fn hours_in_year(year: i32) -> usize {
    days_in_year(year) * HOURS_PER_DAY
}

/// Lookup tables mapping calendar facts onto profile keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarLookup {
    /// Full English weekday name (`"Monday"`) to day type.
    pub day_types: BTreeMap<String, String>,
    /// Month number (1-12) to season.
    pub seasons: BTreeMap<u32, String>,
}

impl CalendarLookup {
    /// Checks that every weekday and every month has an entry.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for day in WEEKDAY_NAMES {
            if !self.day_types.contains_key(day) {
                return Err(ProfileError::UnknownDayName(day.to_string()));
            }
        }
        for month in 1..=12 {
            if !self.seasons.contains_key(&month) {
                return Err(ProfileError::UnknownMonth(month));
            }
        }
        Ok(())
    }
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_type: String,
    pub season: String,
}

/// Builds one [`CalendarDay`] per date of `year`, in calendar order.
pub fn build_calendar(year: i32, lookup: &CalendarLookup) -> Result<Vec<CalendarDay>, ProfileError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ProfileError::InvalidYear(year))?;
    let mut days = Vec::with_capacity(days_in_year(year));
    for date in first.iter_days().take_while(|d| d.year() == year) {
        let name = date.format("%A").to_string();
        let day_type = lookup
            .day_types
            .get(&name)
            .cloned()
            .ok_or(ProfileError::UnknownDayName(name))?;
        let season = lookup
            .seasons
            .get(&date.month())
            .cloned()
            .ok_or(ProfileError::UnknownMonth(date.month()))?;
        days.push(CalendarDay {
            date,
            day_type,
            season,
        });
    }
    Ok(days)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn german_lookup() -> CalendarLookup {
        let mut day_types = BTreeMap::new();
        for day in ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"] {
            day_types.insert(day.to_string(), "Working day".to_string());
        }
        day_types.insert("Saturday".to_string(), "Saturday".to_string());
        day_types.insert("Sunday".to_string(), "Sunday".to_string());
        let mut seasons = BTreeMap::new();
        for month in 1..=12u32 {
            let season = match month {
                5..=9 => "Summer",
                11 | 12 | 1 | 2 => "Winter",
                _ => "Spring/Fall",
            };
            seasons.insert(month, season.to_string());
        }
        CalendarLookup { day_types, seasons }
    }

    #[test]
    fn leap_years_have_an_extra_day() {
        assert_eq!(hours_in_year(2015), 8760);
        assert_eq!(hours_in_year(2016), 8784);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn calendar_tags_known_dates() {
        let days = build_calendar(2015, &german_lookup()).unwrap();
        assert_eq!(days.len(), 365);
        // 2015-01-01 was a Thursday
        assert_eq!(days[0].day_type, "Working day");
        assert_eq!(days[0].season, "Winter");
        // 2015-01-03 was a Saturday
        assert_eq!(days[2].day_type, "Saturday");
        // 2015-07-05 was a Sunday
        let july_fifth = days
            .iter()
            .find(|d| d.date == NaiveDate::from_ymd_opt(2015, 7, 5).unwrap())
            .unwrap();
        assert_eq!(july_fifth.day_type, "Sunday");
        assert_eq!(july_fifth.season, "Summer");
    }

    #[test]
    fn incomplete_lookup_is_rejected() {
        let mut lookup = german_lookup();
        lookup.seasons.remove(&4);
        assert!(matches!(lookup.validate(), Err(ProfileError::UnknownMonth(4))));
        assert!(matches!(
            build_calendar(2015, &lookup),
            Err(ProfileError::UnknownMonth(4))
        ));

        let mut lookup = german_lookup();
        lookup.day_types.remove("Saturday");
        assert!(matches!(
            lookup.validate(),
            Err(ProfileError::UnknownDayName(ref d)) if d == "Saturday"
        ));
    }
}

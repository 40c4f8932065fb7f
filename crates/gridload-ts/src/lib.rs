//! Hourly time series for the load side of the model: per-country demand
//! reconstructed from raw readings, and normalized per-sector profiles.

pub mod calendar;
pub mod gapfill;
pub mod io;
pub mod load;
pub mod profiles;

pub use calendar::{build_calendar, days_in_year, hours_in_year, CalendarDay, CalendarLookup};
pub use gapfill::{fill_series, BoundaryPolicy};
pub use load::{
    reconstruct, HourlyLoadTable, LoadError, MissingCountry, RawLoadRow, Reconstruction,
    ReconstructionConfig,
};
pub use profiles::{
    build_profiles, ProfileError, Sector, SectorProfiles, ShapeSource, StampedReading,
};

use gridload_core::GridLoadError;
use thiserror::Error;

use crate::resolve::STAGE;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("record {record}: {field} entry '{value}' is not a valid number")]
    InvalidEntry {
        record: usize,
        field: &'static str,
        value: String,
    },

    #[error("record {record}: circuit total of wires '{wires}' does not fit in 32 bits")]
    CircuitOverflow { record: usize, wires: String },

    #[error("loadability table is empty")]
    EmptyLoadability,

    #[error("loadability bracket '{0}' is not a positive length")]
    InvalidBracket(String),

    #[error("loadability factor for bracket {bracket} must be positive, got {factor}")]
    InvalidFactor { bracket: f64, factor: f64 },
}

impl From<GridError> for GridLoadError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidEntry { record, .. }
            | GridError::CircuitOverflow { record, .. } => {
                GridLoadError::stage(STAGE, record, err.to_string())
            }
            _ => GridLoadError::Config(err.to_string()),
        }
    }
}

use std::collections::BTreeMap;

use gridload_core::Meters;

use crate::error::GridError;
use crate::types::DeduplicatedGridLine;

/// Piecewise-constant loadability factor by line length.
///
/// Brackets are sorted by upper bound. A line falls into the first bracket
/// whose bound it does not exceed; the last bracket catches everything
/// longer than the one before it, whatever its own bound says.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadabilityTable {
    brackets: Vec<(f64, f64)>,
}

impl LoadabilityTable {
    pub fn new(brackets: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, GridError> {
        let mut brackets: Vec<(f64, f64)> = brackets.into_iter().collect();
        if brackets.is_empty() {
            return Err(GridError::EmptyLoadability);
        }
        for &(bound, factor) in &brackets {
            if !(bound.is_finite() && bound > 0.0) {
                return Err(GridError::InvalidBracket(bound.to_string()));
            }
            if !(factor.is_finite() && factor > 0.0) {
                return Err(GridError::InvalidFactor {
                    bracket: bound,
                    factor,
                });
            }
        }
        brackets.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { brackets })
    }

    /// Builds the table from config keys such as `"80"` or `"750"`.
    pub fn from_config(table: &BTreeMap<String, f64>) -> Result<Self, GridError> {
        let brackets = table
            .iter()
            .map(|(key, factor)| {
                key.trim()
                    .parse::<f64>()
                    .map(|bound| (bound, *factor))
                    .map_err(|_| GridError::InvalidBracket(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(brackets)
    }

    pub fn brackets(&self) -> &[(f64, f64)] {
        &self.brackets
    }

    pub fn factor(&self, length: Meters) -> f64 {
        let (last, bounded) = match self.brackets.split_last() {
            Some(split) => split,
            None => return 1.0,
        };
        bounded
            .iter()
            .find(|(bound, _)| length.value() <= *bound)
            .map_or(last.1, |(_, factor)| *factor)
    }
}

/// Sets `loadability` on every line from its (merged) length.
pub fn assign_loadability(lines: &mut [DeduplicatedGridLine], table: &LoadabilityTable) {
    for line in lines {
        line.loadability = Some(table.factor(line.length_m));
    }
}

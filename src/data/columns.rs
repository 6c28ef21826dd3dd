use serde::Serialize;

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Header matching
// ---------------------------------------------------------------------------

/// A column located in a table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

/// A named header matcher: the column matches when its lowercased name
/// contains any of `patterns`, tried in priority order.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMatcher {
    pub role: &'static str,
    pub patterns: &'static [&'static str],
}

pub const SAMPLE_TEMPERATURE: ColumnMatcher = ColumnMatcher {
    role: "sample temperature",
    patterns: &["sample temperature"],
};

pub const PROGRAM_TEMPERATURE: ColumnMatcher = ColumnMatcher {
    role: "program temperature",
    patterns: &["program temperature"],
};

pub const MASS: ColumnMatcher = ColumnMatcher {
    role: "mass",
    patterns: &["unsubtracted weight", "weight", "tg", "mass"],
};

pub const TIME: ColumnMatcher = ColumnMatcher {
    role: "time",
    patterns: &["time"],
};

/// Any temperature column, used when neither specific one is present.
pub const TEMPERATURE: ColumnMatcher = ColumnMatcher {
    role: "temperature",
    patterns: &["temperature"],
};

impl ColumnMatcher {
    /// First column matching the highest-priority pattern.
    pub fn find(&self, headers: &[String]) -> Option<ColumnRef> {
        let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        self.patterns.iter().find_map(|pattern| {
            lowered
                .iter()
                .position(|h| h.contains(pattern))
                .map(|index| ColumnRef {
                    index,
                    name: headers[index].clone(),
                })
        })
    }
}

// ---------------------------------------------------------------------------
// TG column selection
// ---------------------------------------------------------------------------

/// Outcome of the TG header heuristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TgColumnSelection {
    /// At least one role was found by name.
    Named {
        sample_temperature: Option<ColumnRef>,
        program_temperature: Option<ColumnRef>,
        mass: Option<ColumnRef>,
    },
    /// Nothing matched; the first two columns relabeled `X_Value` / `Mass`.
    Fallback { x: ColumnRef, mass: ColumnRef },
}

impl TgColumnSelection {
    /// Column holding the mass trace, whichever branch was taken.
    pub fn mass(&self) -> Option<&ColumnRef> {
        match self {
            TgColumnSelection::Named { mass, .. } => mass.as_ref(),
            TgColumnSelection::Fallback { mass, .. } => Some(mass),
        }
    }

    /// Column used as temperature axis: sample temperature, else program
    /// temperature, else the fallback x column.
    pub fn temperature_axis(&self) -> Option<&ColumnRef> {
        match self {
            TgColumnSelection::Named {
                sample_temperature,
                program_temperature,
                ..
            } => sample_temperature.as_ref().or(program_temperature.as_ref()),
            TgColumnSelection::Fallback { x, .. } => Some(x),
        }
    }

    /// Column holding the programmed furnace temperature, if distinct.
    pub fn program_temperature(&self) -> Option<&ColumnRef> {
        match self {
            TgColumnSelection::Named {
                program_temperature,
                ..
            } => program_temperature.as_ref(),
            TgColumnSelection::Fallback { .. } => None,
        }
    }
}

/// Pick sample temperature, program temperature and mass columns from an
/// arbitrary header, tolerating vendor header drift.
pub fn select_thermogravimetric_columns(headers: &[String]) -> Result<TgColumnSelection> {
    let sample_temperature = SAMPLE_TEMPERATURE.find(headers);
    let program_temperature = PROGRAM_TEMPERATURE.find(headers);
    let mass = MASS.find(headers);

    if sample_temperature.is_some() || program_temperature.is_some() || mass.is_some() {
        log::debug!(
            "TG columns: sample={:?} program={:?} mass={:?}",
            sample_temperature.as_ref().map(|c| &c.name),
            program_temperature.as_ref().map(|c| &c.name),
            mass.as_ref().map(|c| &c.name)
        );
        return Ok(TgColumnSelection::Named {
            sample_temperature,
            program_temperature,
            mass,
        });
    }

    if headers.len() < 2 {
        return Err(DataError::MissingColumn(
            "mass (no recognizable header and fewer than two columns)".to_string(),
        ));
    }
    log::warn!("No TG header matched; using the first two columns as X_Value / Mass");
    Ok(TgColumnSelection::Fallback {
        x: ColumnRef {
            index: 0,
            name: "X_Value".to_string(),
        },
        mass: ColumnRef {
            index: 1,
            name: "Mass".to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_named_columns() {
        let h = headers(&[
            "Time (min)",
            "Unsubtracted Weight (mg)",
            "Baseline Weight (mg)",
            "Program Temperature (C)",
            "Sample Temperature (C)",
        ]);
        let sel = select_thermogravimetric_columns(&h).unwrap();
        assert_eq!(sel.mass().unwrap().index, 1);
        assert_eq!(sel.temperature_axis().unwrap().index, 4);
        assert_eq!(sel.program_temperature().unwrap().index, 3);
    }

    #[test]
    fn unsubtracted_weight_beats_earlier_weight() {
        let h = headers(&["Weight (mg)", "Unsubtracted Weight (mg)"]);
        let sel = select_thermogravimetric_columns(&h).unwrap();
        assert_eq!(sel.mass().unwrap().index, 1);
    }

    #[test]
    fn tg_header_counts_as_mass() {
        let h = headers(&["Sample Temperature", "TG /%"]);
        let sel = select_thermogravimetric_columns(&h).unwrap();
        assert_eq!(sel.mass().unwrap().name, "TG /%");
    }

    #[test]
    fn falls_back_to_first_two_columns() {
        let h = headers(&["A", "B", "C"]);
        let sel = select_thermogravimetric_columns(&h).unwrap();
        match sel {
            TgColumnSelection::Fallback { x, mass } => {
                assert_eq!((x.index, x.name.as_str()), (0, "X_Value"));
                assert_eq!((mass.index, mass.name.as_str()), (1, "Mass"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn single_unknown_column_is_an_error() {
        let h = headers(&["A"]);
        assert!(matches!(
            select_thermogravimetric_columns(&h),
            Err(DataError::MissingColumn(_))
        ));
    }
}

use serde::Serialize;

use crate::analysis::thermo::{dtg_from_columns, normalize_mass_curve};
use crate::color::{Palette, PinColor};
use crate::config::SmoothingParams;
use crate::data::columns::{self, select_thermogravimetric_columns};
use crate::data::table::{CellValue, RawTable, parse_cell};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// ComparisonRun – one TG file in a multi-run comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRun {
    /// File name as uploaded; also the identity of the run.
    pub name: String,
    /// Sample temperature, or the best available temperature axis.
    pub temperature: Vec<f64>,
    pub program_temperature: Option<Vec<f64>>,
    pub mass: Vec<f64>,
    pub visible: bool,
}

impl ComparisonRun {
    /// Parse a TG table with the header heuristic. Rows with an empty
    /// required cell are skipped.
    pub fn from_table(name: impl Into<String>, table: &RawTable) -> Result<Self> {
        let headers = table
            .rows
            .first()
            .ok_or(DataError::EmptySeries("comparison"))?;
        let selection = select_thermogravimetric_columns(headers)?;
        let mass_col = selection
            .mass()
            .cloned()
            .ok_or_else(|| DataError::MissingColumn(columns::MASS.role.to_string()))?;
        let temp_col = selection
            .temperature_axis()
            .cloned()
            .or_else(|| columns::TEMPERATURE.find(headers))
            .ok_or_else(|| DataError::MissingColumn(columns::TEMPERATURE.role.to_string()))?;
        let program_col = selection
            .program_temperature()
            .filter(|c| c.index != temp_col.index)
            .cloned();

        let mut temperature = Vec::new();
        let mut mass = Vec::new();
        let mut program = Vec::new();

        'rows: for row in 1..table.len() {
            let mut cells = [f64::NAN; 3];
            let wanted = [Some(&temp_col), Some(&mass_col), program_col.as_ref()];
            for (slot, col) in wanted.iter().enumerate() {
                let Some(col) = col else { continue };
                match parse_cell(table.cell(row, col.index)) {
                    CellValue::Number(v) => cells[slot] = v,
                    CellValue::Empty => continue 'rows,
                    CellValue::Invalid => {
                        return Err(DataError::InvalidNumber {
                            column: col.name.clone(),
                            row,
                            value: table.cell(row, col.index).to_string(),
                        });
                    }
                }
            }
            temperature.push(cells[0]);
            mass.push(cells[1]);
            program.push(cells[2]);
        }

        if mass.is_empty() {
            return Err(DataError::EmptySeries("comparison"));
        }
        Ok(ComparisonRun {
            name: name.into(),
            temperature,
            program_temperature: program_col.map(|_| program),
            mass,
            visible: true,
        })
    }

    /// File name without its extension, as shown in legends.
    pub fn display_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(stem, _)| stem)
    }
}

// ---------------------------------------------------------------------------
// ComparisonSet – ordered, de-duplicated collection of runs
// ---------------------------------------------------------------------------

/// A legend badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub name: String,
    pub color: PinColor,
    pub visible: bool,
}

/// One plotted curve of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunCurve {
    pub name: String,
    pub color: PinColor,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonSet {
    runs: Vec<ComparisonRun>,
    palette: Palette,
    smoothing: SmoothingParams,
}

impl ComparisonSet {
    pub fn new(palette: Palette, smoothing: SmoothingParams) -> Self {
        Self {
            runs: Vec::new(),
            palette,
            smoothing,
        }
    }

    /// Add a run parsed from `table`. A run whose name is already present is
    /// skipped and `false` returned.
    pub fn add_run(&mut self, name: &str, table: &RawTable) -> Result<bool> {
        if self.contains(name) {
            log::debug!("Comparison run '{name}' already loaded; skipping");
            return Ok(false);
        }
        let run = ComparisonRun::from_table(name, table)?;
        log::info!("Added comparison run '{name}' ({} samples)", run.mass.len());
        self.runs.push(run);
        Ok(true)
    }

    /// Decode, sniff and add an uploaded file.
    pub fn add_run_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<bool> {
        if self.contains(name) {
            return Ok(false);
        }
        let table = RawTable::from_bytes(bytes)?;
        self.add_run(name, &table)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.runs.iter().any(|r| r.name == name)
    }

    /// Flip a run's visibility; returns the new state, `None` if unknown.
    pub fn toggle_visibility(&mut self, name: &str) -> Option<bool> {
        let run = self.runs.iter_mut().find(|r| r.name == name)?;
        run.visible = !run.visible;
        Some(run.visible)
    }

    pub fn runs(&self) -> &[ComparisonRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Legend entries for every run; colours follow load order.
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.runs
            .iter()
            .enumerate()
            .map(|(i, r)| LegendEntry {
                name: r.display_name().to_string(),
                color: self.palette.color_at(i),
                visible: r.visible,
            })
            .collect()
    }

    fn visible(&self) -> impl Iterator<Item = (PinColor, &ComparisonRun)> {
        self.runs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visible)
            .map(move |(i, r)| (self.palette.color_at(i), r))
    }

    /// Normalized TG (0–100) against temperature for every visible run.
    pub fn normalized_curves(&self) -> Vec<RunCurve> {
        self.visible()
            .map(|(color, r)| RunCurve {
                name: r.display_name().to_string(),
                color,
                x: r.temperature.clone(),
                y: normalize_mass_curve(&r.mass),
            })
            .collect()
    }

    /// Rescaled DTG (0–100) against temperature for every visible run.
    pub fn dtg_curves(&self) -> Result<Vec<RunCurve>> {
        self.visible()
            .map(|(color, r)| {
                let curves = dtg_from_columns(&r.temperature, &r.mass, self.smoothing)?;
                Ok(RunCurve {
                    name: r.display_name().to_string(),
                    color,
                    x: curves.temperature,
                    y: curves.dtg,
                })
            })
            .collect()
    }

    /// Program temperature (sample temperature when absent) against sample index.
    pub fn temperature_programs(&self) -> Vec<RunCurve> {
        self.visible()
            .map(|(color, r)| {
                let y = r
                    .program_temperature
                    .clone()
                    .unwrap_or_else(|| r.temperature.clone());
                RunCurve {
                    name: r.display_name().to_string(),
                    color,
                    x: (0..y.len()).map(|i| i as f64).collect(),
                    y,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(mass: &[f64]) -> RawTable {
        let mut rows = vec![vec![
            "Sample Temperature".to_string(),
            "Program Temperature".to_string(),
            "Weight (mg)".to_string(),
        ]];
        for (i, m) in mass.iter().enumerate() {
            rows.push(vec![format!("{}", 100 + 10 * i), format!("{}", 100 + 10 * i), m.to_string()]);
        }
        RawTable { rows }
    }

    #[test]
    fn duplicate_names_are_skipped() {
        let mut set = ComparisonSet::default();
        assert!(set.add_run("run_a.csv", &table(&[10.0, 8.0, 6.0])).unwrap());
        assert!(!set.add_run("run_a.csv", &table(&[1.0, 1.0, 1.0])).unwrap());
        assert_eq!(set.len(), 1);
        assert_eq!(set.runs()[0].mass, vec![10.0, 8.0, 6.0]);
    }

    #[test]
    fn legend_colors_follow_load_order() {
        let mut set = ComparisonSet::default();
        for i in 0..12 {
            set.add_run(&format!("run{i}.csv"), &table(&[3.0, 2.0, 1.0])).unwrap();
        }
        let legend = set.legend();
        assert_eq!(legend[0].name, "run0");
        assert_eq!(legend[0].color, legend[10].color);
        assert_eq!(legend[1].color, legend[11].color);
    }

    #[test]
    fn hidden_runs_are_not_plotted() {
        let mut set = ComparisonSet::default();
        set.add_run("a.csv", &table(&[10.0, 8.0, 6.0, 4.0, 2.0])).unwrap();
        set.add_run("b.csv", &table(&[5.0, 4.0, 3.0, 2.0, 1.0])).unwrap();
        assert_eq!(set.toggle_visibility("a.csv"), Some(false));
        assert_eq!(set.toggle_visibility("missing.csv"), None);

        let curves = set.normalized_curves();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].name, "b");
        assert_eq!(curves[0].color, Palette::plotly().color_at(1));
        assert_eq!(curves[0].y, vec![100.0, 75.0, 50.0, 25.0, 0.0]);

        let dtg = set.dtg_curves().unwrap();
        assert!(dtg[0].y.iter().all(|v| (0.0..=100.0).contains(v)));
        assert!(!set.legend()[0].visible);
    }

    #[test]
    fn temperature_program_uses_index_axis() {
        let mut set = ComparisonSet::default();
        set.add_run("a.csv", &table(&[3.0, 2.0, 1.0])).unwrap();
        let programs = set.temperature_programs();
        assert_eq!(programs[0].x, vec![0.0, 1.0, 2.0]);
        assert_eq!(programs[0].y, vec![100.0, 110.0, 120.0]);
    }

    #[test]
    fn fallback_columns_are_accepted() {
        let t = RawTable::from_rows(vec![vec!["a", "b"], vec!["1", "5"], vec!["2", "4"]]);
        let run = ComparisonRun::from_table("plain.txt", &t).unwrap();
        assert_eq!(run.temperature, vec![1.0, 2.0]);
        assert_eq!(run.mass, vec![5.0, 4.0]);
        assert!(run.program_temperature.is_none());
    }
}

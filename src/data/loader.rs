use std::path::Path;

use anyhow::{Context, bail};

use super::columns::{self, select_thermogravimetric_columns};
use super::model::{GasSignalSeries, SpectralMatrix, TgSample, ThermogravimetricSeries};
use super::table::{CellValue, RawTable, parse_cell};
use crate::config::EngineConfig;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Public entry-points (files)
// ---------------------------------------------------------------------------

/// Read a delimited table from disk.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimiter sniffed from the first line (`;`, `,` or tab)
/// * `.tsv`          – tab separated
pub fn read_table_file(path: &Path) -> anyhow::Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let table = match ext.as_str() {
        "csv" | "txt" | "dat" => RawTable::from_bytes(&bytes),
        "tsv" => RawTable::from_bytes_with_delimiter(&bytes, b'\t'),
        "xls" | "xlsx" => bail!("Excel workbooks are not supported; export {} as CSV", path.display()),
        other => bail!("Unsupported file extension: .{other}"),
    };
    table.with_context(|| format!("parsing {}", path.display()))
}

/// Load a TG export (balance + temperatures + elapsed time) from disk.
pub fn load_thermogravimetric_file(
    path: &Path,
    config: &EngineConfig,
) -> anyhow::Result<ThermogravimetricSeries> {
    let table = read_table_file(path)?;
    let series = load_thermogravimetric(&table, config)
        .with_context(|| format!("loading TG data from {}", path.display()))?;
    log::info!("Loaded {} TG samples from {}", series.len(), path.display());
    Ok(series)
}

/// Load a gas-signal trace from disk.
pub fn load_gas_signal_file(path: &Path) -> anyhow::Result<GasSignalSeries> {
    let table = read_table_file(path)?;
    let series = load_gas_signal(&table)
        .with_context(|| format!("loading gas-signal data from {}", path.display()))?;
    log::info!("Loaded {} gas-signal points from {}", series.len(), path.display());
    Ok(series)
}

/// Load an FTIR export (semicolon separated, decimal comma) from disk.
pub fn load_spectra_file(path: &Path) -> anyhow::Result<SpectralMatrix> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let table = RawTable::from_bytes_with_delimiter(&bytes, b';')
        .with_context(|| format!("parsing {}", path.display()))?;
    let matrix = build_spectral_matrix(table)
        .with_context(|| format!("loading FTIR data from {}", path.display()))?;
    log::info!(
        "Loaded {} FTIR spectra x {} wavenumbers from {}",
        matrix.len(),
        matrix.wavenumbers.len(),
        path.display()
    );
    Ok(matrix)
}

// ---------------------------------------------------------------------------
// TG loader
// ---------------------------------------------------------------------------

/// Header row followed by numeric rows. Column roles come from
/// [`select_thermogravimetric_columns`]; the time column is the first
/// header containing "time" (column 0 otherwise) and is scaled by
/// `config.tg_time_scale` to seconds.
///
/// Rows with an empty required cell are skipped; a non-numeric cell is an
/// error.
pub fn load_thermogravimetric(
    table: &RawTable,
    config: &EngineConfig,
) -> Result<ThermogravimetricSeries> {
    let headers = table
        .rows
        .first()
        .ok_or(DataError::EmptySeries("thermogravimetric"))?;

    let selection = select_thermogravimetric_columns(headers)?;
    let mass = selection
        .mass()
        .cloned()
        .ok_or_else(|| DataError::MissingColumn(columns::MASS.role.to_string()))?;
    let temperature = selection
        .temperature_axis()
        .cloned()
        .or_else(|| columns::TEMPERATURE.find(headers))
        .ok_or_else(|| DataError::MissingColumn(columns::SAMPLE_TEMPERATURE.role.to_string()))?;
    let program = selection
        .program_temperature()
        .cloned()
        .unwrap_or_else(|| temperature.clone());
    let time_idx = columns::TIME.find(headers).map_or(0, |c| c.index);
    let time_name = headers.get(time_idx).cloned().unwrap_or_default();

    let wanted = [
        (time_idx, time_name.as_str()),
        (program.index, program.name.as_str()),
        (temperature.index, temperature.name.as_str()),
        (mass.index, mass.name.as_str()),
    ];

    let mut samples = Vec::with_capacity(table.len().saturating_sub(1));
    'rows: for row in 1..table.len() {
        let mut values = [0.0f64; 4];
        for (slot, &(col, name)) in wanted.iter().enumerate() {
            match parse_cell(table.cell(row, col)) {
                CellValue::Number(v) => values[slot] = v,
                CellValue::Empty => continue 'rows,
                CellValue::Invalid => {
                    return Err(DataError::InvalidNumber {
                        column: name.to_string(),
                        row,
                        value: table.cell(row, col).to_string(),
                    });
                }
            }
        }
        samples.push(TgSample {
            time: values[0] * config.tg_time_scale,
            program_temperature: values[1],
            sample_temperature: values[2],
            mass: values[3],
        });
    }

    ThermogravimetricSeries::from_rows(samples)
}

// ---------------------------------------------------------------------------
// Gas-signal loader
// ---------------------------------------------------------------------------

/// Columns 0 (time, s) and 1 (intensity). Leading rows that are not two
/// numbers (instrument preamble, header) are skipped; once data has
/// started, a non-numeric cell is an error.
pub fn load_gas_signal(table: &RawTable) -> Result<GasSignalSeries> {
    let mut time = Vec::new();
    let mut signal = Vec::new();
    let mut preamble = 0usize;

    for row in 0..table.len() {
        let t = parse_cell(table.cell(row, 0));
        let s = parse_cell(table.cell(row, 1));
        match (t, s) {
            (CellValue::Number(t), CellValue::Number(s)) => {
                time.push(t);
                signal.push(s);
            }
            _ if time.is_empty() => preamble += 1,
            (CellValue::Empty, _) | (_, CellValue::Empty) => {}
            (CellValue::Invalid, _) => {
                return Err(DataError::InvalidNumber {
                    column: "time".to_string(),
                    row,
                    value: table.cell(row, 0).to_string(),
                });
            }
            (_, CellValue::Invalid) => {
                return Err(DataError::InvalidNumber {
                    column: "signal".to_string(),
                    row,
                    value: table.cell(row, 1).to_string(),
                });
            }
        }
    }

    if preamble > 0 {
        log::debug!("Skipped {preamble} gas-signal preamble rows");
    }
    GasSignalSeries::new(time, signal)
}

// ---------------------------------------------------------------------------
// FTIR loader
// ---------------------------------------------------------------------------

/// Transpose an FTIR export into one row per acquisition time.
///
/// Expected layout (before transposition):
///
/// ```text
/// cm-1    ; 0,5  ; 12,5 ; 24,5   <- timestamps (s)
/// 4000,0  ; 98,1 ; 97,9 ; 96,2
/// 3998,1  ; 98,0 ; 97,7 ; 96,0
/// ```
///
/// Non-numeric wavenumber rows are dropped; when none survive, a 0-based
/// index stands in for the wavenumber axis.
pub fn build_spectral_matrix(mut table: RawTable) -> Result<SpectralMatrix> {
    table.drop_empty();
    // A timestamp with no readings (e.g. an aborted last acquisition).
    let unread = table.drop_empty_columns(1);
    if unread > 0 {
        log::debug!("Dropped {unread} FTIR timestamps without readings");
    }
    if table.len() < 2 || table.width() < 2 {
        return Err(DataError::EmptySpectralMatrix);
    }

    let header = &table.rows[0];
    let times = header[1..]
        .iter()
        .map(|cell| match parse_cell(cell) {
            CellValue::Number(t) => Ok(t),
            _ => Err(DataError::InvalidNumber {
                column: "time".to_string(),
                row: 0,
                value: cell.clone(),
            }),
        })
        .collect::<Result<Vec<f64>>>()?;

    let body = 1..table.len();
    let numeric: Vec<(usize, f64)> = body
        .clone()
        .filter_map(|row| match parse_cell(table.cell(row, 0)) {
            CellValue::Number(w) => Some((row, w)),
            _ => None,
        })
        .collect();

    let channels: Vec<(usize, f64)> = if numeric.is_empty() {
        log::warn!("No numeric wavenumbers in FTIR header column; using a channel index");
        body.enumerate().map(|(i, row)| (row, i as f64)).collect()
    } else {
        let dropped = table.len() - 1 - numeric.len();
        if dropped > 0 {
            log::debug!("Dropped {dropped} non-numeric FTIR wavenumber rows");
        }
        numeric
    };

    let mut transmittance = vec![Vec::with_capacity(channels.len()); times.len()];
    for &(row, _) in &channels {
        for (i, spectrum) in transmittance.iter_mut().enumerate() {
            let col = i + 1;
            match parse_cell(table.cell(row, col)) {
                CellValue::Number(v) => spectrum.push(v),
                _ => {
                    return Err(DataError::InvalidNumber {
                        column: table.cell(0, col).to_string(),
                        row,
                        value: table.cell(row, col).to_string(),
                    });
                }
            }
        }
    }

    let wavenumbers = channels.into_iter().map(|(_, w)| w).collect();
    SpectralMatrix::new(times, wavenumbers, transmittance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tg_table() -> RawTable {
        RawTable::from_rows(vec![
            vec!["Time (min)", "Unsubtracted Weight (mg)", "Baseline", "Program Temperature", "Sample Temperature"],
            vec!["0,0", "10", "0", "30", "29"],
            vec!["0.5", "8", "0", "35", "34"],
            vec!["1.0", "", "0", "40", "39"],
            vec!["1.5", "6", "0", "45", "44"],
            vec!["1.5", "5", "0", "45", "44"],
        ])
    }

    #[test]
    fn tg_rows_are_scaled_and_cleaned() {
        let series = load_thermogravimetric(&tg_table(), &EngineConfig::default()).unwrap();
        assert_eq!(series.time, vec![0.0, 30.0, 90.0]);
        assert_eq!(series.mass, vec![10.0, 8.0, 6.0]);
        assert_eq!(series.program_temperature, vec![30.0, 35.0, 45.0]);
        assert_eq!(series.sample_temperature, vec![29.0, 34.0, 44.0]);
    }

    #[test]
    fn tg_non_numeric_cell_is_reported() {
        let mut table = tg_table();
        table.rows[2][1] = "n/a".to_string();
        let err = load_thermogravimetric(&table, &EngineConfig::default()).unwrap_err();
        match err {
            DataError::InvalidNumber { column, row, value } => {
                assert_eq!(column, "Unsubtracted Weight (mg)");
                assert_eq!(row, 2);
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn gas_signal_skips_preamble() {
        let table = RawTable::from_rows(vec![
            vec!["Instrument", "GS-1"],
            vec!["Operator", ""],
            vec![""],
            vec!["Time (s)", "Signal"],
            vec!["0", "0.1"],
            vec!["60", "0,4"],
            vec!["120", "0.2"],
        ]);
        let gs = load_gas_signal(&table).unwrap();
        assert_eq!(gs.time, vec![0.0, 60.0, 120.0]);
        assert_eq!(gs.signal, vec![0.1, 0.4, 0.2]);
        assert_eq!(gs.domain().max, 120.0);
    }

    #[test]
    fn gas_signal_without_data_is_empty() {
        let table = RawTable::from_rows(vec![vec!["Time", "Signal"]]);
        assert!(matches!(load_gas_signal(&table), Err(DataError::EmptySeries(_))));
    }

    #[test]
    fn spectral_matrix_is_transposed() {
        let text = "cm-1;0,5;12,5;\n4000,0;98,1;97,9;\n3998,1;98,0;97,7;\n";
        let table = RawTable::parse(text, b';').unwrap();
        let m = build_spectral_matrix(table).unwrap();
        assert_eq!(m.times, vec![0.5, 12.5]);
        assert_eq!(m.wavenumbers, vec![4000.0, 3998.1]);
        assert_eq!(m.transmittance, vec![vec![98.1, 98.0], vec![97.9, 97.7]]);
    }

    #[test]
    fn spectral_matrix_drops_non_numeric_channels() {
        let text = "cm-1;0;10\nunits;%;%\n4000;1;2\n";
        let m = build_spectral_matrix(RawTable::parse(text, b';').unwrap()).unwrap();
        assert_eq!(m.wavenumbers, vec![4000.0]);
        assert_eq!(m.transmittance, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn spectral_matrix_index_fallback() {
        let text = "label;0;10\na;1;2\nb;3;4\n";
        let m = build_spectral_matrix(RawTable::parse(text, b';').unwrap()).unwrap();
        assert_eq!(m.wavenumbers, vec![0.0, 1.0]);
        assert_eq!(m.transmittance[1], vec![2.0, 4.0]);
    }

    #[test]
    fn spectral_matrix_ignores_timestamps_without_readings() {
        let text = "cm-1;0;10;20\n4000;1;2;\n3000;3;4;\n";
        let m = build_spectral_matrix(RawTable::parse(text, b';').unwrap()).unwrap();
        assert_eq!(m.times, vec![0.0, 10.0]);
        assert_eq!(m.transmittance, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn spectral_matrix_rejects_nan_timestamp() {
        let text = "cm-1;NaN;10\n4000;1;2\n";
        assert!(matches!(
            build_spectral_matrix(RawTable::parse(text, b';').unwrap()),
            Err(DataError::InvalidNumber { row: 0, .. })
        ));
    }

    #[test]
    fn spectral_matrix_bad_timestamp() {
        let text = "cm-1;zero;10\n4000;1;2\n";
        assert!(matches!(
            build_spectral_matrix(RawTable::parse(text, b';').unwrap()),
            Err(DataError::InvalidNumber { .. })
        ));
    }
}

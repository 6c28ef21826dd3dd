use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// ThermogravimetricSeries – the balance stream
// ---------------------------------------------------------------------------

/// TG samples in column form. Time is in seconds and strictly increasing;
/// every value is finite (enforced by [`ThermogravimetricSeries::from_rows`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermogravimetricSeries {
    pub time: Vec<f64>,
    pub program_temperature: Vec<f64>,
    pub sample_temperature: Vec<f64>,
    pub mass: Vec<f64>,
}

/// One TG sample before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TgSample {
    pub time: f64,
    pub program_temperature: f64,
    pub sample_temperature: f64,
    pub mass: f64,
}

impl TgSample {
    fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.program_temperature.is_finite()
            && self.sample_temperature.is_finite()
            && self.mass.is_finite()
    }
}

impl ThermogravimetricSeries {
    /// Build a series, dropping non-finite samples and samples whose time
    /// does not advance past the previous kept sample.
    pub fn from_rows(rows: impl IntoIterator<Item = TgSample>) -> Result<Self> {
        let mut series = ThermogravimetricSeries {
            time: Vec::new(),
            program_temperature: Vec::new(),
            sample_temperature: Vec::new(),
            mass: Vec::new(),
        };
        let mut dropped = 0usize;

        for row in rows {
            let advances = series.time.last().map_or(true, |&last| row.time > last);
            if !row.is_finite() || !advances {
                dropped += 1;
                continue;
            }
            series.time.push(row.time);
            series.program_temperature.push(row.program_temperature);
            series.sample_temperature.push(row.sample_temperature);
            series.mass.push(row.mass);
        }

        if dropped > 0 {
            log::debug!("TG ingestion dropped {dropped} non-finite or non-increasing samples");
        }
        if series.is_empty() {
            return Err(DataError::EmptySeries("thermogravimetric"));
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GasSignalSeries – the independently clocked auxiliary trace
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSignalSeries {
    pub time: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Closed time interval `[min, max]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDomain {
    pub min: f64,
    pub max: f64,
}

impl TimeDomain {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            TimeDomain { min, max }
        } else {
            TimeDomain { min: max, max: min }
        }
    }

    /// Clamp `t` into the domain; NaN or inverted bounds do not panic.
    pub fn clamp(&self, t: f64) -> f64 {
        t.max(self.min).min(self.max)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }
}

impl GasSignalSeries {
    pub fn new(time: Vec<f64>, signal: Vec<f64>) -> Result<Self> {
        if time.len() != signal.len() {
            return Err(DataError::LengthMismatch {
                left: "gas-signal time",
                left_len: time.len(),
                right: "gas-signal intensity",
                right_len: signal.len(),
            });
        }
        if time.is_empty() {
            return Err(DataError::EmptySeries("gas-signal"));
        }
        Ok(GasSignalSeries { time, signal })
    }

    /// Time range covered by the trace; the selected timestamp lives here.
    pub fn domain(&self) -> TimeDomain {
        let min = self.time.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.time.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        TimeDomain::new(min, max)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpectralMatrix – one FTIR spectrum per acquisition time
// ---------------------------------------------------------------------------

/// FTIR data after transposition: row `i` is the spectrum acquired at
/// `times[i]`, sampled on the shared `wavenumbers` axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralMatrix {
    pub times: Vec<f64>,
    pub wavenumbers: Vec<f64>,
    pub transmittance: Vec<Vec<f64>>,
}

/// A single resolved spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub time: f64,
    pub wavenumbers: Vec<f64>,
    pub transmittance: Vec<f64>,
}

impl SpectralMatrix {
    pub fn new(times: Vec<f64>, wavenumbers: Vec<f64>, transmittance: Vec<Vec<f64>>) -> Result<Self> {
        if times.len() != transmittance.len() {
            return Err(DataError::LengthMismatch {
                left: "FTIR times",
                left_len: times.len(),
                right: "FTIR rows",
                right_len: transmittance.len(),
            });
        }
        if let Some(row) = transmittance.iter().find(|r| r.len() != wavenumbers.len()) {
            return Err(DataError::LengthMismatch {
                left: "wavenumbers",
                left_len: wavenumbers.len(),
                right: "FTIR row",
                right_len: row.len(),
            });
        }
        Ok(SpectralMatrix {
            times,
            wavenumbers,
            transmittance,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spectrum at row `index`, if present.
    pub fn row(&self, index: usize) -> Option<Spectrum> {
        let transmittance = self.transmittance.get(index)?;
        Some(Spectrum {
            time: self.times[index],
            wavenumbers: self.wavenumbers.clone(),
            transmittance: transmittance.clone(),
        })
    }
}

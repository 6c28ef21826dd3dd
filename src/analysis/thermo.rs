use serde::Serialize;

use super::savgol::SavitzkyGolay;
use crate::config::SmoothingParams;
use crate::data::model::ThermogravimetricSeries;
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map a mass trace onto 0–100 using its extrema:
/// `100 * (m - min) / (max - min)`.
///
/// The extrema (not the first / last sample) are used so that noisy,
/// non-monotonic balance readings still land in range. A flat trace has no
/// scale and yields all zeros.
pub fn normalize_mass_curve(mass: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = extrema(mass) else {
        return Vec::new();
    };
    let span = hi - lo;
    if span == 0.0 || !span.is_finite() {
        log::warn!("Flat mass curve ({} samples); normalized TG set to zero", mass.len());
        return vec![0.0; mass.len()];
    }
    mass.iter().map(|m| 100.0 * (m - lo) / span).collect()
}

/// Min–max rescale to `[0, 100]`; all zeros when the values are flat.
pub fn min_max_rescale(values: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = extrema(values) else {
        return Vec::new();
    };
    let span = hi - lo;
    if span == 0.0 || !span.is_finite() {
        log::warn!("Flat derivative ({} samples); rescaled DTG set to zero", values.len());
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| 100.0 * (v - lo) / span).collect()
}

fn extrema(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    }))
}

// ---------------------------------------------------------------------------
// Smoothed derivative
// ---------------------------------------------------------------------------

/// Fit the requested window / order to a series of `len` samples
/// (`len >= 3`): the window becomes odd and no longer than the series, and
/// the order stays below the window.
pub fn clamp_smoothing(len: usize, params: SmoothingParams) -> SmoothingParams {
    let mut window = params.window_length;
    if window >= len {
        window = if len.saturating_sub(1) % 2 == 1 { len - 1 } else { len };
    }
    if window < 3 {
        window = 3;
    }
    if window % 2 == 0 {
        window += 1;
    }
    SmoothingParams {
        window_length: window,
        poly_order: params.poly_order.min(window - 1),
    }
}

/// Mean spacing of `x`, or 1.0 when it is undefined or zero.
fn mean_spacing(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 1.0;
    }
    let delta = x.windows(2).map(|w| w[1] - w[0]).sum::<f64>() / (x.len() - 1) as f64;
    if delta == 0.0 || !delta.is_finite() {
        log::warn!("Degenerate x-axis spacing ({delta}); differentiating per sample");
        return 1.0;
    }
    delta
}

/// Savitzky–Golay smoothing of `series` and its first derivative with
/// respect to `x_axis` (sample spacing = mean step of `x_axis`).
///
/// Fewer than 3 samples cannot be fitted: the series comes back unchanged
/// with an all-zero derivative.
pub fn normalize_and_differentiate(
    series: &[f64],
    x_axis: &[f64],
    params: SmoothingParams,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if series.len() != x_axis.len() {
        return Err(DataError::LengthMismatch {
            left: "series",
            left_len: series.len(),
            right: "x axis",
            right_len: x_axis.len(),
        });
    }
    if series.len() < 3 {
        return Ok((series.to_vec(), vec![0.0; series.len()]));
    }

    let params = clamp_smoothing(series.len(), params);
    let filter = SavitzkyGolay::new(params.window_length, params.poly_order)?;
    let delta = mean_spacing(x_axis);

    let smoothed = filter.smooth(series)?;
    let derivative = filter.derivative(series, delta)?;
    Ok((smoothed, derivative))
}

// ---------------------------------------------------------------------------
// DTG curves for one TG run
// ---------------------------------------------------------------------------

/// The TG / DTG pair plotted against sample temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DtgCurves {
    pub temperature: Vec<f64>,
    /// Normalized mass, 0–100.
    pub normalized_mass: Vec<f64>,
    /// Smoothed dTG/dT, min–max rescaled to 0–100.
    pub dtg: Vec<f64>,
    pub initial_mass: f64,
}

impl DtgCurves {
    /// Badge text for the initial mass.
    pub fn initial_mass_label(&self) -> String {
        format!("Initial mass: {:.2} mg", self.initial_mass)
    }
}

/// Normalized TG and rescaled DTG against an arbitrary temperature axis.
pub fn dtg_from_columns(
    temperature: &[f64],
    mass: &[f64],
    params: SmoothingParams,
) -> Result<DtgCurves> {
    let normalized_mass = normalize_mass_curve(mass);
    let (_, derivative) = normalize_and_differentiate(&normalized_mass, temperature, params)?;
    Ok(DtgCurves {
        temperature: temperature.to_vec(),
        normalized_mass,
        dtg: min_max_rescale(&derivative),
        initial_mass: extrema(mass).map_or(0.0, |(_, hi)| hi),
    })
}

/// Normalized TG and rescaled DTG against sample temperature.
pub fn dtg_curves(tg: &ThermogravimetricSeries, params: SmoothingParams) -> Result<DtgCurves> {
    dtg_from_columns(&tg.sample_temperature, &tg.mass, params)
}

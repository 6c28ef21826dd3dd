use serde::{Deserialize, Serialize};

use crate::data::model::{SpectralMatrix, Spectrum, ThermogravimetricSeries, TimeDomain};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Time selection
// ---------------------------------------------------------------------------

/// The interaction that triggered a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum TimeEvent {
    /// The numeric time input changed; `None` when it was cleared.
    ManualInput(Option<f64>),
    /// The selection line on the time/temperature chart was dragged.
    DragShape { x0: Option<f64>, x1: Option<f64> },
    /// Anything else (upload, toggle, pin).
    #[default]
    None,
}

/// A resolved selection: `value` drives the spectrum lookup, `display` is
/// written back into the manual input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectedTime {
    pub value: f64,
    pub display: f64,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Resolve the selected time with 2-decimal display rounding.
pub fn resolve_selected_time(
    event: &TimeEvent,
    manual_value: Option<f64>,
    domain: TimeDomain,
) -> SelectedTime {
    resolve_selected_time_with(event, manual_value, domain, 2)
}

/// Precedence, highest first: the manual input that fired this event; a
/// dragged line boundary (`x0`, else `x1`); a manual value left over from
/// an earlier interaction; the start of `domain`. The result is clamped
/// into `domain`, never rejected.
pub fn resolve_selected_time_with(
    event: &TimeEvent,
    manual_value: Option<f64>,
    domain: TimeDomain,
    decimals: u32,
) -> SelectedTime {
    let candidate = match *event {
        TimeEvent::ManualInput(v) => finite(v),
        TimeEvent::DragShape { x0, x1 } => finite(x0).or(finite(x1)),
        TimeEvent::None => None,
    }
    .or(finite(manual_value))
    .unwrap_or(domain.min);

    let value = domain.clamp(candidate);
    if value != candidate {
        log::debug!("Selected time {candidate} clamped to {value} ([{}, {}])", domain.min, domain.max);
    }
    SelectedTime {
        value,
        display: round_to(value, decimals),
    }
}

// ---------------------------------------------------------------------------
// Cross-instrument lookups
// ---------------------------------------------------------------------------

/// Sample temperature of the TG run at `time`, linearly interpolated and
/// held at the end values outside the TG time range.
pub fn interpolate_temperature(tg: &ThermogravimetricSeries, time: f64) -> f64 {
    let (xs, ys) = (&tg.time, &tg.sample_temperature);
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return f64::NAN;
    };
    if time <= first {
        return ys[0];
    }
    if time >= last {
        return ys[ys.len() - 1];
    }
    // Time is strictly increasing, so the partition point is the right neighbour.
    let hi = xs.partition_point(|&t| t < time);
    let lo = hi - 1;
    let frac = (time - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + frac * (ys[hi] - ys[lo])
}

/// Index of the FTIR row acquired closest to `time`; the lowest index wins
/// ties. Rows with a non-finite timestamp are never selected.
pub fn closest_spectrum_index(matrix: &SpectralMatrix, time: f64) -> Result<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &t) in matrix.times.iter().enumerate() {
        let d = (t - time).abs();
        if !d.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i).ok_or(DataError::EmptySpectralMatrix)
}

/// The FTIR spectrum acquired closest to `time`.
pub fn find_closest_spectrum(matrix: &SpectralMatrix, time: f64) -> Result<Spectrum> {
    let index = closest_spectrum_index(matrix, time)?;
    matrix.row(index).ok_or(DataError::EmptySpectralMatrix)
}

/// Status line shown above the spectrum; also used as default pin label.
pub fn selection_info(selected: f64, spectrum_time: f64, temperature: f64) -> String {
    format!(
        "Selected time (GS): {selected:.1}s | Closest FTIR time: {spectrum_time:.1}s | Interpolated temperature (TG): {temperature:.1}°C"
    )
}

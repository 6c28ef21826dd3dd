use std::sync::Arc;

use serde::Serialize;

use crate::color::{Palette, PinColor};
use crate::data::model::Spectrum;

// ---------------------------------------------------------------------------
// Pinned spectra
// ---------------------------------------------------------------------------

/// A spectrum frozen for overlay comparison. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixedSpectrumSnapshot {
    pub wavenumbers: Vec<f64>,
    pub transmittance: Vec<f64>,
    pub label: String,
    pub color: PinColor,
}

/// Pins in insertion order. Entries are shared, so copying the list
/// copies handles only.
pub type PinList = Vec<Arc<FixedSpectrumSnapshot>>;

/// Return `existing` with `current` appended. The new pin's colour is
/// `palette[existing.len() mod palette.len()]`.
pub fn pin_spectrum(
    current: &Spectrum,
    label: impl Into<String>,
    existing: &[Arc<FixedSpectrumSnapshot>],
    palette: &Palette,
) -> PinList {
    let snapshot = FixedSpectrumSnapshot {
        wavenumbers: current.wavenumbers.clone(),
        transmittance: current.transmittance.clone(),
        label: label.into(),
        color: palette.color_at(existing.len()),
    };
    log::debug!("Pinned spectrum #{} ({})", existing.len() + 1, snapshot.color);

    let mut pins = existing.to_vec();
    pins.push(Arc::new(snapshot));
    pins
}

/// Return `existing` without the entry at `index`. Remaining pins keep
/// their colours. An out-of-range index leaves the list as is.
pub fn unpin_spectrum(existing: &[Arc<FixedSpectrumSnapshot>], index: usize) -> PinList {
    if index >= existing.len() {
        log::warn!("Ignoring unpin of #{index}: only {} pins", existing.len());
        return existing.to_vec();
    }
    existing
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != index)
        .map(|(_, pin)| Arc::clone(pin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(t: f64) -> Spectrum {
        Spectrum {
            time: t,
            wavenumbers: vec![4000.0, 3000.0],
            transmittance: vec![99.0, t],
        }
    }

    #[test]
    fn colors_cycle_through_palette() {
        let palette = Palette::plotly();
        let mut pins = PinList::new();
        for i in 0..11 {
            pins = pin_spectrum(&spectrum(i as f64), format!("pin {}", i + 1), &pins, &palette);
        }
        assert_eq!(pins.len(), 11);
        assert_eq!(pins[0].color, pins[10].color);
        assert_ne!(pins[0].color, pins[1].color);
        assert_eq!(pins[10].label, "pin 11");
    }

    #[test]
    fn pinning_leaves_previous_list_untouched() {
        let palette = Palette::plotly();
        let first = pin_spectrum(&spectrum(1.0), "a", &[], &palette);
        let second = pin_spectrum(&spectrum(2.0), "b", &first, &palette);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn unpin_keeps_colors() {
        let palette = Palette::plotly();
        let mut pins = PinList::new();
        for i in 0..5 {
            pins = pin_spectrum(&spectrum(i as f64), format!("{i}"), &pins, &palette);
        }
        let before: Vec<PinColor> = pins.iter().map(|p| p.color).collect();
        let after = unpin_spectrum(&pins, 2);

        let expected: Vec<PinColor> = before
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 2)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(after.iter().map(|p| p.color).collect::<Vec<_>>(), expected);
        assert_eq!(pins.len(), 5);
    }

    #[test]
    fn unpin_out_of_range_is_a_no_op() {
        let palette = Palette::plotly();
        let pins = pin_spectrum(&spectrum(1.0), "a", &[], &palette);
        assert_eq!(unpin_spectrum(&pins, 7), pins);
    }
}

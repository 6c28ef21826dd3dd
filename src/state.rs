use serde::Serialize;

use crate::analysis::thermo::{DtgCurves, dtg_curves};
use crate::analysis::timeline::{
    SelectedTime, TimeEvent, find_closest_spectrum, interpolate_temperature,
    resolve_selected_time_with, selection_info,
};
use crate::color::Palette;
use crate::comparison::ComparisonSet;
use crate::config::EngineConfig;
use crate::data::loader::{build_spectral_matrix, load_gas_signal, load_thermogravimetric};
use crate::data::model::{GasSignalSeries, SpectralMatrix, Spectrum, ThermogravimetricSeries};
use crate::data::table::RawTable;
use crate::error::{DataError, Result};
use crate::pins::{PinList, pin_spectrum, unpin_spectrum};

// ---------------------------------------------------------------------------
// Upload status per stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StreamStatus {
    #[default]
    Missing,
    Loaded { name: String },
    Failed { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UploadStatus {
    pub thermogravimetric: StreamStatus,
    pub gas_signal: StreamStatus,
    pub spectra: StreamStatus,
}

// ---------------------------------------------------------------------------
// Synchronized view
// ---------------------------------------------------------------------------

/// An x/y trace handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Everything derived from one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncView {
    /// Normalized TG and rescaled DTG against sample temperature.
    pub dtg: DtgCurves,
    pub initial_mass_label: String,
    /// Program temperature against TG time (s).
    pub temperature_program: Trace,
    /// Gas-signal trace, when enabled.
    pub gas_signal: Option<Trace>,
    pub selected_time: SelectedTime,
    pub spectrum: Spectrum,
    pub interpolated_temperature: f64,
    pub info: String,
    pub pins: PinList,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything one user session holds between interactions. Each session
/// owns its own instance; nothing is shared between sessions.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub config: EngineConfig,
    palette: Palette,

    /// Most recently uploaded dataset per stream (None until loaded).
    pub thermogravimetric: Option<ThermogravimetricSeries>,
    pub gas_signal: Option<GasSignalSeries>,
    pub spectra: Option<SpectralMatrix>,
    pub status: UploadStatus,

    /// Value of the manual time input, echoed back after each resolution.
    pub manual_time: Option<f64>,
    /// Whether the gas-signal trace is overlaid on the temperature chart.
    pub show_gas_signal: bool,

    pins: PinList,
    /// Spectrum and info line of the last view, used when pinning.
    current: Option<(Spectrum, String)>,

    /// Multi-run TG comparison, independent of the three streams above.
    pub comparison: ComparisonSet,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SessionState {
    pub fn new(config: EngineConfig) -> Self {
        let palette = config.palette.build();
        Self {
            comparison: ComparisonSet::new(palette.clone(), config.smoothing),
            palette,
            config,
            thermogravimetric: None,
            gas_signal: None,
            spectra: None,
            status: UploadStatus::default(),
            manual_time: None,
            show_gas_signal: false,
            pins: PinList::new(),
            current: None,
        }
    }

    /// Back to the state of a freshly opened page; configuration is kept.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    // ---- Uploads ----

    pub fn set_thermogravimetric(&mut self, name: &str, series: ThermogravimetricSeries) {
        log::info!("TG dataset '{name}': {} samples", series.len());
        self.thermogravimetric = Some(series);
        self.status.thermogravimetric = StreamStatus::Loaded { name: name.to_string() };
        self.current = None;
    }

    pub fn set_gas_signal(&mut self, name: &str, series: GasSignalSeries) {
        log::info!("Gas-signal dataset '{name}': {} points", series.len());
        self.gas_signal = Some(series);
        self.status.gas_signal = StreamStatus::Loaded { name: name.to_string() };
        self.current = None;
    }

    pub fn set_spectra(&mut self, name: &str, matrix: SpectralMatrix) {
        log::info!(
            "FTIR dataset '{name}': {} spectra x {} wavenumbers",
            matrix.len(),
            matrix.wavenumbers.len()
        );
        self.spectra = Some(matrix);
        self.status.spectra = StreamStatus::Loaded { name: name.to_string() };
        self.current = None;
    }

    /// Parse an uploaded TG file. On failure the previous dataset stays.
    pub fn load_thermogravimetric_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let parsed = RawTable::from_bytes(bytes)
            .and_then(|table| load_thermogravimetric(&table, &self.config));
        match parsed {
            Ok(series) => {
                self.set_thermogravimetric(name, series);
                Ok(())
            }
            Err(e) => {
                self.status.thermogravimetric = failed(name, &e);
                Err(e)
            }
        }
    }

    /// Parse an uploaded gas-signal file. On failure the previous dataset stays.
    pub fn load_gas_signal_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        match RawTable::from_bytes(bytes).and_then(|table| load_gas_signal(&table)) {
            Ok(series) => {
                self.set_gas_signal(name, series);
                Ok(())
            }
            Err(e) => {
                self.status.gas_signal = failed(name, &e);
                Err(e)
            }
        }
    }

    /// Parse an uploaded FTIR file (`;` separated). On failure the previous
    /// dataset stays.
    pub fn load_spectra_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        match RawTable::from_bytes_with_delimiter(bytes, b';').and_then(build_spectral_matrix) {
            Ok(matrix) => {
                self.set_spectra(name, matrix);
                Ok(())
            }
            Err(e) => {
                self.status.spectra = failed(name, &e);
                Err(e)
            }
        }
    }

    /// All three streams are loaded.
    pub fn is_ready(&self) -> bool {
        self.thermogravimetric.is_some() && self.gas_signal.is_some() && self.spectra.is_some()
    }

    // ---- Interactions ----

    pub fn toggle_gas_signal(&mut self) -> bool {
        self.show_gas_signal = !self.show_gas_signal;
        self.show_gas_signal
    }

    /// Recompute the synchronized view for one interaction.
    pub fn apply_event(&mut self, event: TimeEvent) -> Result<SyncView> {
        let tg = self
            .thermogravimetric
            .as_ref()
            .ok_or(DataError::NotReady("thermogravimetric"))?;
        let gs = self.gas_signal.as_ref().ok_or(DataError::NotReady("gas-signal"))?;
        let ftir = self.spectra.as_ref().ok_or(DataError::NotReady("FTIR"))?;

        let dtg = dtg_curves(tg, self.config.smoothing)?;
        let selected = resolve_selected_time_with(
            &event,
            self.manual_time,
            gs.domain(),
            self.config.display_decimals,
        );
        let spectrum = find_closest_spectrum(ftir, selected.value)?;
        let temperature = interpolate_temperature(tg, selected.value);
        let info = selection_info(selected.value, spectrum.time, temperature);

        let view = SyncView {
            initial_mass_label: dtg.initial_mass_label(),
            dtg,
            temperature_program: Trace {
                x: tg.time.clone(),
                y: tg.program_temperature.clone(),
            },
            gas_signal: self.show_gas_signal.then(|| Trace {
                x: gs.time.clone(),
                y: gs.signal.clone(),
            }),
            selected_time: selected,
            spectrum: spectrum.clone(),
            interpolated_temperature: temperature,
            info: info.clone(),
            pins: self.pins.clone(),
        };

        self.manual_time = Some(selected.display);
        self.current = Some((spectrum, info));
        Ok(view)
    }

    // ---- Pins ----

    pub fn pins(&self) -> &PinList {
        &self.pins
    }

    /// Pin the spectrum of the last view. Without a label the view's info
    /// line is used.
    pub fn pin_current(&mut self, label: Option<String>) -> Result<&PinList> {
        let (spectrum, info) = self
            .current
            .as_ref()
            .ok_or(DataError::NotReady("current spectrum"))?;
        let label = label.unwrap_or_else(|| info.clone());
        self.pins = pin_spectrum(spectrum, label, &self.pins, &self.palette);
        Ok(&self.pins)
    }

    pub fn unpin(&mut self, index: usize) -> &PinList {
        self.pins = unpin_spectrum(&self.pins, index);
        &self.pins
    }
}

fn failed(name: &str, err: &DataError) -> StreamStatus {
    log::error!("Failed to load '{name}': {err}");
    StreamStatus::Failed {
        name: name.to_string(),
        message: err.to_string(),
    }
}

/// Numerical core: smoothing, normalization and cross-instrument alignment.
///
/// ```text
///   mass ──► thermo::normalize_mass_curve ──► savgol (smooth + d/dT) ──► min_max_rescale ──► DTG
///
///   event ──► timeline::resolve_selected_time ──► closest FTIR row
///                                            └──► interpolated TG temperature
/// ```

pub mod savgol;
pub mod thermo;
pub mod timeline;

use thiserror::Error;

use crate::analysis::savgol::SgError;

// ---------------------------------------------------------------------------
// DataError – typed failure of a single recomputation
// ---------------------------------------------------------------------------

/// Errors raised while turning instrument exports into canonical series,
/// or while querying those series.
///
/// All of them are fatal to the current recomputation only: the session
/// keeps its previous valid data (see [`crate::state::SessionState`]).
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column could not be located, even after fallbacks.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// The spectral matrix has no rows at query time.
    #[error("spectral matrix is empty; load an FTIR file first")]
    EmptySpectralMatrix,

    /// A series has no usable samples.
    #[error("{0} series has no usable samples")]
    EmptySeries(&'static str),

    /// A supposedly-numeric cell could not be parsed.
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// Two sequences that must be aligned have different lengths.
    #[error("length mismatch: {left} has {left_len} values but {right} has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    /// The session has not loaded all three streams yet.
    #[error("session is missing the {0} dataset")]
    NotReady(&'static str),

    #[error("smoothing failed: {0}")]
    Smoothing(#[from] SgError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

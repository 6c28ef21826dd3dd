//! Alignment and derivative engine for coupled thermogravimetric (TG),
//! evolved-gas signal (GS) and FTIR measurements.

pub mod analysis;
pub mod color;
pub mod comparison;
pub mod config;
pub mod data;
pub mod error;
pub mod pins;
pub mod state;

//! # rusty-ega
//!
//! Headless driver for the TG / GS / FTIR alignment engine. Every command
//! prints its result as JSON on stdout so a plotting front end (or `jq`)
//! can pick it up.
//!
//! ```bash
//! # Synchronized view at t = 450 s, pinning the selected spectrum
//! rusty-ega sync tg.csv gs.csv ftir.csv --time 450 --pin
//!
//! # Overlay several TG runs
//! rusty-ega compare run_a.csv run_b.csv --hide run_b.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use rusty_ega::analysis::timeline::TimeEvent;
use rusty_ega::comparison::{ComparisonSet, LegendEntry, RunCurve};
use rusty_ega::config::EngineConfig;
use rusty_ega::data::loader::{
    load_gas_signal_file, load_spectra_file, load_thermogravimetric_file, read_table_file,
};
use rusty_ega::state::SessionState;

/// rusty-ega - TG / evolved-gas / FTIR alignment engine
#[derive(Parser)]
#[command(name = "rusty-ega")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON engine configuration (smoothing, palette, time scale)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a selected time and print the synchronized view
    Sync {
        /// TG export (time in minutes, temperatures, mass)
        #[arg(value_name = "TG")]
        tg: PathBuf,

        /// Gas-signal trace (time in seconds, intensity)
        #[arg(value_name = "GS")]
        gs: PathBuf,

        /// FTIR matrix (`;` separated, decimal comma)
        #[arg(value_name = "FTIR")]
        ftir: PathBuf,

        /// Manually entered time (s)
        #[arg(short, long, conflicts_with = "drag")]
        time: Option<f64>,

        /// Position the selection line was dragged to (s)
        #[arg(short, long)]
        drag: Option<f64>,

        /// Overlay the gas-signal trace
        #[arg(long)]
        show_gas: bool,

        /// Pin the resulting spectrum
        #[arg(long)]
        pin: bool,

        /// Pin label (defaults to the info line)
        #[arg(long, requires = "pin")]
        label: Option<String>,
    },

    /// Overlay normalized TG and DTG curves of several runs
    Compare {
        /// TG exports, in legend order
        #[arg(value_name = "RUN", required = true)]
        runs: Vec<PathBuf>,

        /// Runs to hide (by file name)
        #[arg(long, value_name = "NAME")]
        hide: Vec<String>,
    },
}

#[derive(Serialize)]
struct ComparisonReport {
    legend: Vec<LegendEntry>,
    normalized: Vec<RunCurve>,
    dtg: Vec<RunCurve>,
    temperature_programs: Vec<RunCurve>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Sync {
            tg,
            gs,
            ftir,
            time,
            drag,
            show_gas,
            pin,
            label,
        } => {
            let mut session = SessionState::new(config);
            let tg_series = load_thermogravimetric_file(&tg, &session.config)?;
            session.set_thermogravimetric(&file_name(&tg), tg_series);
            session.set_gas_signal(&file_name(&gs), load_gas_signal_file(&gs)?);
            session.set_spectra(&file_name(&ftir), load_spectra_file(&ftir)?);
            if show_gas {
                session.toggle_gas_signal();
            }

            let event = match (time, drag) {
                (Some(t), _) => TimeEvent::ManualInput(Some(t)),
                (None, Some(x)) => TimeEvent::DragShape { x0: Some(x), x1: None },
                (None, None) => TimeEvent::None,
            };
            let mut view = session.apply_event(event)?;
            info!("{}", view.info);

            if pin {
                view.pins = session.pin_current(label)?.clone();
            }
            emit(&view, cli.pretty)
        }

        Commands::Compare { runs, hide } => {
            let mut set = ComparisonSet::new(config.palette.build(), config.smoothing);
            for path in &runs {
                let table = read_table_file(path)?;
                let name = file_name(path);
                set.add_run(&name, &table)
                    .with_context(|| format!("adding comparison run {}", path.display()))?;
            }
            for name in &hide {
                if set.toggle_visibility(name).is_none() {
                    log::warn!("No comparison run named '{name}'");
                }
            }

            let report = ComparisonReport {
                legend: set.legend(),
                normalized: set.normalized_curves(),
                dtg: set.dtg_curves()?,
                temperature_programs: set.temperature_programs(),
            };
            emit(&report, cli.pretty)
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

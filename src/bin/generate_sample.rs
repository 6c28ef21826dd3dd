//! Writes a synthetic TG / GS / FTIR triple for trying the engine out.
//!
//! ```bash
//! cargo run --bin generate_sample -- sample_data/
//! ```
//!
//! The sample loses mass in two steps (around 320 °C and 560 °C). The gas
//! signal and the FTIR bands of CO2 and H2O follow the decomposition rate.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const HEATING_RATE: f64 = 10.0; // °C / min
const START_TEMPERATURE: f64 = 30.0;
const END_TEMPERATURE: f64 = 800.0;
const INITIAL_MASS: f64 = 18.5; // mg

/// (midpoint °C, width °C, mass fraction lost)
const STEPS: [(f64, f64, f64); 2] = [(320.0, 18.0, 0.35), (560.0, 25.0, 0.25)];

/// (wavenumber cm-1, band width, depth %)
const BANDS: [(f64, f64, f64); 3] = [(2350.0, 20.0, 45.0), (3650.0, 60.0, 12.0), (1520.0, 40.0, 8.0)];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn sigmoid(x: f64, mid: f64, width: f64) -> f64 {
    1.0 / (1.0 + (-(x - mid) / width).exp())
}

/// Mass (mg) at program temperature `t`.
fn mass_at(t: f64) -> f64 {
    let lost: f64 = STEPS.iter().map(|&(mid, w, frac)| frac * sigmoid(t, mid, w)).sum();
    INITIAL_MASS * (1.0 - lost)
}

/// Relative gas evolution rate (0..1) at program temperature `t`.
fn evolution_rate(t: f64) -> f64 {
    STEPS
        .iter()
        .map(|&(mid, w, frac)| {
            let s = sigmoid(t, mid, w);
            4.0 * frac * s * (1.0 - s)
        })
        .sum::<f64>()
        / 0.35
}

fn program_temperature(seconds: f64) -> f64 {
    (START_TEMPERATURE + HEATING_RATE * seconds / 60.0).min(END_TEMPERATURE)
}

fn decimal_comma(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}").replace('.', ",")
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn total_seconds() -> f64 {
    (END_TEMPERATURE - START_TEMPERATURE) / HEATING_RATE * 60.0
}

fn write_thermogravimetric(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "Time (min)",
        "Unsubtracted Weight (mg)",
        "Baseline Weight (mg)",
        "Program Temperature (°C)",
        "Sample Temperature (°C)",
    ])?;

    let steps = (total_seconds() / 30.0) as usize;
    for i in 0..=steps {
        let seconds = i as f64 * 30.0;
        let program = program_temperature(seconds);
        // The sample lags the furnace slightly.
        let sample = program - 1.5 + rng.gauss(0.0, 0.1);
        let mass = mass_at(sample) + rng.gauss(0.0, 0.002);
        wtr.write_record(&[
            format!("{:.2}", seconds / 60.0),
            format!("{mass:.4}"),
            "0.0000".to_string(),
            format!("{program:.2}"),
            format!("{sample:.2}"),
        ])?;
    }
    wtr.flush()?;
    Ok(steps + 1)
}

fn write_gas_signal(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    wtr.write_record(["Instrument", "QMS 403"])?;
    wtr.write_record(["Channel", "m/z 44"])?;
    wtr.write_record([""])?;
    wtr.write_record(["Time (s)", "Ion current (A)"])?;

    let steps = (total_seconds() / 5.0) as usize;
    for i in 0..=steps {
        let seconds = i as f64 * 5.0;
        let rate = evolution_rate(program_temperature(seconds));
        let signal = 1e-11 + 4e-10 * rate + rng.gauss(0.0, 2e-12);
        wtr.write_record(&[format!("{seconds:.1}"), format!("{signal:.4e}")])?;
    }
    wtr.flush()?;
    Ok(steps + 1)
}

fn write_spectra(path: &Path, rng: &mut SimpleRng) -> Result<(usize, usize)> {
    let wavenumbers: Vec<f64> = (0..=838).map(|i| 4000.0 - i as f64 * 4.0).collect();
    let times: Vec<f64> = (0..)
        .map(|i| 0.5 + i as f64 * 12.0)
        .take_while(|&t| t <= total_seconds())
        .collect();

    let spectra: Vec<Vec<f64>> = times
        .iter()
        .map(|&t| {
            let rate = evolution_rate(program_temperature(t));
            wavenumbers
                .iter()
                .map(|&wn| {
                    let absorbance: f64 = BANDS
                        .iter()
                        .map(|&(mu, sigma, depth)| gaussian(wn, mu, sigma, depth * rate))
                        .sum();
                    100.0 - absorbance + rng.gauss(0.0, 0.05)
                })
                .collect()
        })
        .collect();

    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;
    let mut header = vec!["cm-1".to_string()];
    header.extend(times.iter().map(|&t| decimal_comma(t, 1)));
    wtr.write_record(&header)?;

    for (j, &wn) in wavenumbers.iter().enumerate() {
        let mut record = vec![decimal_comma(wn, 1)];
        record.extend(spectra.iter().map(|s| decimal_comma(s[j], 3)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok((times.len(), wavenumbers.len()))
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let tg_path = out_dir.join("sample_tg.csv");
    let n = write_thermogravimetric(&tg_path, &mut rng)?;
    println!("Wrote {n} TG samples to {}", tg_path.display());

    let gs_path = out_dir.join("sample_gs.csv");
    let n = write_gas_signal(&gs_path, &mut rng)?;
    println!("Wrote {n} gas-signal points to {}", gs_path.display());

    let ftir_path = out_dir.join("sample_ftir.csv");
    let (spectra, channels) = write_spectra(&ftir_path, &mut rng)?;
    println!(
        "Wrote {spectra} FTIR spectra ({channels} wavenumbers each) to {}",
        ftir_path.display()
    );
    Ok(())
}

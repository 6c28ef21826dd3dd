//! Savitzky–Golay polynomial smoothing and differentiation.
//!
//! A polynomial of degree `poly_order` is least-squares fitted to each
//! window of `window_length` samples. Interior samples take the value (or
//! derivative) of the fit at the window centre, which reduces to a fixed
//! convolution. The first and last `window_length / 2` samples are
//! evaluated from the polynomial fitted to the first / last full window
//! instead of padding the signal.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SgError {
    #[error("window length {0} must be odd and at least 1")]
    InvalidWindow(usize),
    #[error("polynomial order {order} must be less than window length {window}")]
    OrderTooHigh { order: usize, window: usize },
    #[error("window length {window} exceeds signal length {len}")]
    WindowTooLong { window: usize, len: usize },
    #[error("normal equations are singular")]
    Singular,
}

/// A Savitzky–Golay filter with its least-squares projection cached.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    poly_order: usize,
    /// `(JᵀJ)⁻¹Jᵀ`, shape `(poly_order + 1) × window_length`, where
    /// `J[k][j] = (k - half)^j`. Row `j` maps a window to its `x^j` coefficient.
    projection: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, poly_order: usize) -> Result<Self, SgError> {
        if window_length == 0 || window_length % 2 == 0 {
            return Err(SgError::InvalidWindow(window_length));
        }
        if poly_order >= window_length {
            return Err(SgError::OrderTooHigh {
                order: poly_order,
                window: window_length,
            });
        }
        let projection = least_squares_projection(window_length, poly_order)?;
        Ok(Self {
            window_length,
            poly_order,
            projection,
        })
    }

    /// Convolution coefficients for the `deriv`-th derivative at the window
    /// centre, unit sample spacing. `coefficients(0)` sums to 1.
    pub fn coefficients(&self, deriv: usize) -> Vec<f64> {
        if deriv > self.poly_order {
            return vec![0.0; self.window_length];
        }
        let factorial: f64 = (1..=deriv).map(|k| k as f64).product();
        self.projection[deriv].iter().map(|c| c * factorial).collect()
    }

    /// Smoothed signal, same length as `data`.
    pub fn smooth(&self, data: &[f64]) -> Result<Vec<f64>, SgError> {
        self.apply(data, 0, 1.0)
    }

    /// First derivative with sample spacing `delta`, same length as `data`.
    pub fn derivative(&self, data: &[f64], delta: f64) -> Result<Vec<f64>, SgError> {
        self.apply(data, 1, delta)
    }

    fn apply(&self, data: &[f64], deriv: usize, delta: f64) -> Result<Vec<f64>, SgError> {
        let n = data.len();
        let w = self.window_length;
        if n < w {
            return Err(SgError::WindowTooLong { window: w, len: n });
        }
        let half = w / 2;
        let scale = delta.powi(deriv as i32);
        let mut out = vec![0.0; n];

        let coeffs = self.coefficients(deriv);
        for i in half..n - half {
            let window = &data[i - half..=i + half];
            out[i] = coeffs.iter().zip(window).map(|(c, y)| c * y).sum::<f64>() / scale;
        }

        // Edges: evaluate the fit of the first / last full window off-centre.
        let head = self.fit(&data[..w]);
        for (i, slot) in out.iter_mut().enumerate().take(half) {
            *slot = eval_polynomial(&head, i as f64 - half as f64, deriv) / scale;
        }
        let tail = self.fit(&data[n - w..]);
        for i in n - half..n {
            let x = (i - (n - w)) as f64 - half as f64;
            out[i] = eval_polynomial(&tail, x, deriv) / scale;
        }

        Ok(out)
    }

    /// Polynomial coefficients (ascending powers, centred abscissa) for one window.
    fn fit(&self, window: &[f64]) -> Vec<f64> {
        self.projection
            .iter()
            .map(|row| row.iter().zip(window).map(|(p, y)| p * y).sum())
            .collect()
    }
}

/// `deriv`-th derivative of `Σ β_j x^j` at `x`.
fn eval_polynomial(beta: &[f64], x: f64, deriv: usize) -> f64 {
    beta.iter()
        .enumerate()
        .skip(deriv)
        .map(|(j, b)| {
            let falling: f64 = ((j - deriv + 1)..=j).map(|k| k as f64).product();
            b * falling * x.powi((j - deriv) as i32)
        })
        .sum()
}

/// `(JᵀJ)⁻¹Jᵀ` for a centred Vandermonde matrix, by Gauss-Jordan elimination.
fn least_squares_projection(window: usize, order: usize) -> Result<Vec<Vec<f64>>, SgError> {
    let half = (window / 2) as f64;
    let p = order + 1;

    let j: Vec<Vec<f64>> = (0..window)
        .map(|k| {
            let x = k as f64 - half;
            (0..p).map(|e| x.powi(e as i32)).collect()
        })
        .collect();

    // Augmented [JᵀJ | I]
    let mut aug = vec![vec![0.0; 2 * p]; p];
    for r in 0..p {
        for c in 0..p {
            aug[r][c] = j.iter().map(|row| row[r] * row[c]).sum();
        }
        aug[r][p + r] = 1.0;
    }

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))
            .unwrap_or(col);
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        if pivot.abs() < 1e-12 {
            return Err(SgError::Singular);
        }
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }
        for r in 0..p {
            if r != col {
                let factor = aug[r][col];
                if factor != 0.0 {
                    for c in 0..2 * p {
                        aug[r][c] -= factor * aug[col][c];
                    }
                }
            }
        }
    }

    Ok((0..p)
        .map(|r| {
            (0..window)
                .map(|k| (0..p).map(|c| aug[r][p + c] * j[k][c]).sum())
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < tol, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn classic_five_point_quadratic_coefficients() {
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        let expected: Vec<f64> = [-3.0, 12.0, 17.0, 12.0, -3.0].iter().map(|c| c / 35.0).collect();
        assert_close(&sg.coefficients(0), &expected, 1e-12);

        let d: Vec<f64> = [-2.0, -1.0, 0.0, 1.0, 2.0].iter().map(|c| c / 10.0).collect();
        assert_close(&sg.coefficients(1), &d, 1e-12);
    }

    #[test]
    fn constant_signal_is_unchanged() {
        let data = vec![5.0; 20];
        let sg = SavitzkyGolay::new(7, 2).unwrap();
        assert_close(&sg.smooth(&data).unwrap(), &data, 1e-10);
        assert_close(&sg.derivative(&data, 1.0).unwrap(), &[0.0; 20], 1e-10);
    }

    #[test]
    fn quadratic_is_reproduced_including_edges() {
        let data: Vec<f64> = (0..15).map(|i| 0.5 * (i as f64).powi(2) - 3.0 * i as f64 + 1.0).collect();
        let sg = SavitzkyGolay::new(7, 2).unwrap();
        assert_close(&sg.smooth(&data).unwrap(), &data, 1e-8);

        let expected: Vec<f64> = (0..15).map(|i| i as f64 - 3.0).collect();
        assert_close(&sg.derivative(&data, 1.0).unwrap(), &expected, 1e-8);
    }

    #[test]
    fn derivative_respects_sample_spacing() {
        // y = 2x sampled every 5 units
        let data: Vec<f64> = (0..10).map(|i| 2.0 * (5.0 * i as f64)).collect();
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        assert_close(&sg.derivative(&data, 5.0).unwrap(), &[2.0; 10], 1e-9);
    }

    #[test]
    fn window_equal_to_signal_length() {
        let data = vec![1.0, 4.0, 9.0];
        let sg = SavitzkyGolay::new(3, 2).unwrap();
        assert_close(&sg.smooth(&data).unwrap(), &data, 1e-10);
    }

    #[test]
    fn smoothing_reduces_jitter() {
        let data: Vec<f64> = (0..60)
            .map(|i| (i as f64 * 0.1).sin() + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect();
        let sg = SavitzkyGolay::new(9, 2).unwrap();
        let smooth = sg.smooth(&data).unwrap();
        let rough = |v: &[f64]| v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>();
        assert!(rough(&smooth) < rough(&data));
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(SavitzkyGolay::new(4, 2).unwrap_err(), SgError::InvalidWindow(4));
        assert!(matches!(SavitzkyGolay::new(3, 3), Err(SgError::OrderTooHigh { .. })));
        let sg = SavitzkyGolay::new(5, 2).unwrap();
        assert!(matches!(sg.smooth(&[1.0, 2.0]), Err(SgError::WindowTooLong { .. })));
    }
}

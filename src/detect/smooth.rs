//! Savitzky-Golay smoothing.
//!
//! Each output sample is the value, at that sample, of a least-squares
//! polynomial fitted to a window of neighbouring samples. Interior samples
//! use a window centred on themselves. The first and last `window / 2`
//! samples have no centred window; they take their value from the polynomial
//! fitted to the first (or last) full window instead.

use crate::error::{Result, SpikeError};
use nalgebra::DMatrix;

/// Least-squares fitting matrix for one smoothing window.
///
/// Returns the `(polyorder + 1) × window` matrix `(AᵀA)⁻¹Aᵀ`, where `A` is
/// the Vandermonde matrix of window positions scaled to `[-1, 1]`. Applied
/// to `window` samples it gives the fitted polynomial's coefficients in
/// those scaled positions; row 0 alone gives the value at the window centre.
pub fn savgol_coefficients(window: usize, polyorder: usize) -> Result<DMatrix<f64>> {
    if window == 0 || window % 2 == 0 {
        return Err(SpikeError::InvalidParameter(format!(
            "Smoothing window must be a positive odd number, got {}",
            window
        )));
    }
    if polyorder >= window {
        return Err(SpikeError::InvalidParameter(format!(
            "Polynomial order {} must be less than window length {}",
            polyorder, window
        )));
    }

    // Scaled positions keep AᵀA well conditioned for long windows
    let half = window / 2;
    let a = DMatrix::from_fn(window, polyorder + 1, |row, power| {
        scaled_position(row, half).powi(power as i32)
    });
    let at = a.transpose();

    let ata_inv = (&at * &a).try_inverse().ok_or_else(|| {
        SpikeError::InvalidParameter("Smoothing design matrix is singular".to_string())
    })?;

    Ok(ata_inv * at)
}

/// Window position `row` mapped onto `[-1, 1]` around the centre.
fn scaled_position(row: usize, half: usize) -> f64 {
    (row as f64 - half as f64) / half.max(1) as f64
}

/// Smooth a trace with a Savitzky-Golay filter.
///
/// `window` must be odd and no longer than the trace; a window longer than
/// the trace is a [`SpikeError::WindowTooLong`] error.
pub fn savgol_filter(trace: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    let n = trace.len();
    if window > n {
        return Err(SpikeError::WindowTooLong { window, len: n });
    }
    let fit = savgol_coefficients(window, polyorder)?;

    // A polynomial with as many coefficients as window samples interpolates
    // them exactly
    if polyorder + 1 >= window {
        return Ok(trace.to_vec());
    }

    let half = window / 2;
    let mut smoothed = vec![0.0; n];

    let centre = fit.row(0);
    for i in half..n - half {
        let segment = &trace[i - half..=i + half];
        smoothed[i] = centre
            .iter()
            .zip(segment)
            .map(|(w, x)| w * x)
            .sum();
    }

    let head = fit_polynomial(&fit, &trace[..window]);
    for (i, value) in smoothed.iter_mut().enumerate().take(half) {
        *value = evaluate(&head, scaled_position(i, half));
    }

    let tail_start = n - window;
    let tail = fit_polynomial(&fit, &trace[tail_start..]);
    for i in n - half..n {
        smoothed[i] = evaluate(&tail, scaled_position(i - tail_start, half));
    }

    Ok(smoothed)
}

fn fit_polynomial(fit: &DMatrix<f64>, segment: &[f64]) -> Vec<f64> {
    fit.row_iter()
        .map(|row| row.iter().zip(segment).map(|(w, x)| w * x).sum())
        .collect()
}

/// Horner evaluation, coefficients in ascending power.
fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

//! Full-reference image quality metrics.

use crate::core::{Frame, CHANNELS};
use crate::{Result, SimError};

const MAX_PIXEL: f64 = 255.0;
/// Error of a viewport with nothing to show; its PSNR is zero
pub const WORST_MSE: f64 = MAX_PIXEL * MAX_PIXEL;
const SSIM_WINDOW: usize = 11;
const SSIM_SIGMA: f64 = 1.5;
const SSIM_K1: f64 = 0.01;
const SSIM_K2: f64 = 0.03;

fn check_shape(a: &Frame, b: &Frame) -> Result<()> {
    if a.width != b.width || a.height != b.height {
        return Err(SimError::ShapeMismatch {
            left_w: a.width,
            left_h: a.height,
            right_w: b.width,
            right_h: b.height,
        });
    }
    Ok(())
}

/// Mean squared error over all channels
pub fn mse(a: &Frame, b: &Frame) -> Result<f64> {
    check_shape(a, b)?;
    if a.data.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    Ok(sum / a.data.len() as f64)
}

pub fn psnr(a: &Frame, b: &Frame) -> Result<f64> {
    let err = mse(a, b)?;
    Ok(10.0 * (MAX_PIXEL * MAX_PIXEL / (err + 1e-8)).log10())
}

/// Structural similarity with an 11x11 Gaussian window, averaged over the
/// valid region of each channel and then over channels
pub fn ssim(a: &Frame, b: &Frame) -> Result<f64> {
    check_shape(a, b)?;
    if a.data.is_empty() {
        return Ok(1.0);
    }
    let total: f64 = (0..CHANNELS)
        .map(|c| ssim_plane(&a.channel(c), &b.channel(c), a.width, a.height))
        .sum();
    Ok(total / CHANNELS as f64)
}

fn gaussian_kernel() -> [f64; SSIM_WINDOW] {
    let mut k = [0.0; SSIM_WINDOW];
    let centre = (SSIM_WINDOW / 2) as f64;
    for (i, v) in k.iter_mut().enumerate() {
        let d = i as f64 - centre;
        *v = (-(d * d) / (2.0 * SSIM_SIGMA * SSIM_SIGMA)).exp();
    }
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// Separable "valid" convolution; output is (w - 10) x (h - 10)
fn filter_valid(plane: &[f64], w: usize, h: usize, k: &[f64; SSIM_WINDOW]) -> Vec<f64> {
    let ow = w + 1 - SSIM_WINDOW;
    let oh = h + 1 - SSIM_WINDOW;

    let mut horizontal = vec![0.0; ow * h];
    for y in 0..h {
        for x in 0..ow {
            let row = &plane[y * w + x..y * w + x + SSIM_WINDOW];
            horizontal[y * ow + x] = row.iter().zip(k).map(|(p, w)| p * w).sum();
        }
    }

    let mut out = vec![0.0; ow * oh];
    for y in 0..oh {
        for x in 0..ow {
            out[y * ow + x] = (0..SSIM_WINDOW).map(|i| horizontal[(y + i) * ow + x] * k[i]).sum();
        }
    }
    out
}

fn ssim_plane(a: &[f64], b: &[f64], w: usize, h: usize) -> f64 {
    let c1 = (SSIM_K1 * MAX_PIXEL).powi(2);
    let c2 = (SSIM_K2 * MAX_PIXEL).powi(2);

    let index = |mu_a: f64, mu_b: f64, var_a: f64, var_b: f64, cov: f64| {
        ((2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2))
            / ((mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2))
    };

    if w < SSIM_WINDOW || h < SSIM_WINDOW {
        // too small for a sliding window: one global window
        let n = a.len() as f64;
        let mu_a = a.iter().sum::<f64>() / n;
        let mu_b = b.iter().sum::<f64>() / n;
        let var_a = a.iter().map(|v| (v - mu_a).powi(2)).sum::<f64>() / n;
        let var_b = b.iter().map(|v| (v - mu_b).powi(2)).sum::<f64>() / n;
        let cov = a.iter().zip(b).map(|(x, y)| (x - mu_a) * (y - mu_b)).sum::<f64>() / n;
        return index(mu_a, mu_b, var_a, var_b, cov);
    }

    let k = gaussian_kernel();
    let aa: Vec<f64> = a.iter().map(|v| v * v).collect();
    let bb: Vec<f64> = b.iter().map(|v| v * v).collect();
    let ab: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();

    let mu_a = filter_valid(a, w, h, &k);
    let mu_b = filter_valid(b, w, h, &k);
    let s_aa = filter_valid(&aa, w, h, &k);
    let s_bb = filter_valid(&bb, w, h, &k);
    let s_ab = filter_valid(&ab, w, h, &k);

    let n = mu_a.len() as f64;
    let mut total = 0.0;
    for i in 0..mu_a.len() {
        let (ma, mb) = (mu_a[i], mu_b[i]);
        total += index(ma, mb, s_aa[i] - ma * ma, s_bb[i] - mb * mb, s_ab[i] - ma * mb);
    }
    total / n
}

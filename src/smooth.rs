//! Smoothed companions of the daily series: a rolling average and a
//! Savitzky-Golay polynomial filter.

use anyhow::{bail, Result};

pub const DEFAULT_ROLLING_WINDOW: usize = 7;
pub const DEFAULT_POLY_WINDOW: usize = 25;
pub const DEFAULT_POLY_ORDER: usize = 2;

/// How the smoothed line overlaid on the bars is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    None,
    /// mean of `window` consecutive days, shorter than the input
    RollingAverage { window: usize },
    /// least squares polynomial of degree `order` over `window` days, same length as the input
    Polynomial { window: usize, order: usize },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::RollingAverage {
            window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl Smoothing {
    /// Returns the x values and the smoothed y values, aligned with each other.
    /// None when there is nothing to draw: no smoothing or a series shorter than the window.
    pub fn apply<T: Clone>(&self, x: &[T], y: &[f64]) -> Result<Option<(Vec<T>, Vec<f64>)>> {
        let out = match *self {
            Smoothing::None => None,
            Smoothing::RollingAverage { window } => {
                let avg = rolling_average(y, window);
                if avg.is_empty() {
                    None
                } else {
                    Some((centered(x, window), avg))
                }
            }
            Smoothing::Polynomial { window, order } => {
                let sg = SavitzkyGolay::new(window, order)?;
                let smooth = sg.apply(y);
                if smooth.is_empty() {
                    None
                } else {
                    Some((x.to_vec(), smooth))
                }
            }
        };
        Ok(out)
    }
}

/// Mean of every run of `window` consecutive values.
/// The output has len - window + 1 values, empty when the window does not fit.
pub fn rolling_average(v: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > v.len() {
        return Vec::new();
    }
    let w = window as f64;
    let mut sum: f64 = v[..window].iter().sum();
    let mut avg = Vec::with_capacity(v.len() - window + 1);
    avg.push(sum / w);
    for i in window..v.len() {
        sum += v[i] - v[i - window];
        avg.push(sum / w);
    }
    avg
}

/// The x values under the centres of the rolling windows,
/// from index window/2 (floor) to len - window/2 (ceil), inclusive.
/// For even windows the centre is the right one of the two middle values.
pub fn centered<T: Clone>(x: &[T], window: usize) -> Vec<T> {
    if window == 0 || window > x.len() {
        return Vec::new();
    }
    let start = window / 2;
    let len = x.len() - window + 1;
    x[start..start + len].to_vec()
}

/// Savitzky-Golay filter, fits a polynomial of degree `order`
/// to every `window` consecutive values by least squares.
#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        SavitzkyGolay {
            window: DEFAULT_POLY_WINDOW,
            order: DEFAULT_POLY_ORDER,
        }
    }
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<SavitzkyGolay> {
        if window % 2 == 0 {
            bail!("the polynomial window has an even number of elements ({}); it should be odd to have a central element", window);
        }
        if order >= window {
            bail!("polynomial order {} must be less than the window {}", order, window);
        }
        Ok(SavitzkyGolay { window, order })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// convolution weights for the central value of the window
    pub fn coefficients(&self) -> Vec<f64> {
        central_coefficients(self.window, self.order)
    }

    /// Smooths the series preserving its length.
    /// The first and last window/2 values are evaluated on the polynomial
    /// fitted to the first and last window.
    /// Shorter series use the longest odd window that fits,
    /// and are returned unchanged when it can not hold the polynomial.
    pub fn apply(&self, v: &[f64]) -> Vec<f64> {
        let n = v.len();
        let window = if n >= self.window {
            self.window
        } else if n % 2 == 1 {
            n
        } else {
            n.saturating_sub(1)
        };
        if window == 0 || window <= self.order {
            return v.to_vec();
        }
        let half = window / 2;
        let coeffs = central_coefficients(window, self.order);

        let mut out = vec![0.; n];
        for i in half..n - half {
            out[i] = v[i - half..=i + half]
                .iter()
                .zip(coeffs.iter())
                .map(|(a, c)| a * c)
                .sum();
        }

        let positions: Vec<f64> = (0..window).map(|j| j as f64 - half as f64).collect();
        if let Some(head) = polyfit(&positions, &v[..window], self.order) {
            for i in 0..half {
                out[i] = polyval(&head, positions[i]);
            }
        }
        if let Some(tail) = polyfit(&positions, &v[n - window..], self.order) {
            for i in n - half..n {
                out[i] = polyval(&tail, positions[i - (n - window)]);
            }
        }
        out
    }
}

/// c = J (J^T J)^-1 e0, with J the Vandermonde matrix of the window positions
fn central_coefficients(window: usize, order: usize) -> Vec<f64> {
    let half = (window / 2) as f64;
    let positions: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();
    let normal = normal_matrix(&positions, order);
    let mut e0 = vec![0.; order + 1];
    e0[0] = 1.;
    match solve(normal, e0) {
        Some(z) => positions.iter().map(|&x| polyval(&z, x)).collect(),
        None => vec![1. / window as f64; window],
    }
}

/// J^T J for the powers 0..=order of the positions
fn normal_matrix(x: &[f64], order: usize) -> Vec<Vec<f64>> {
    let mut a = vec![vec![0.; order + 1]; order + 1];
    for r in 0..=order {
        for c in 0..=order {
            a[r][c] = x.iter().map(|xi| xi.powi((r + c) as i32)).sum();
        }
    }
    a
}

/// least squares polynomial coefficients, lowest degree first
fn polyfit(x: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
    let a = normal_matrix(x, order);
    let b: Vec<f64> = (0..=order)
        .map(|k| {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| xi.powi(k as i32) * yi)
                .sum()
        })
        .collect();
    solve(a, b)
}

fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0., |acc, c| acc * x + c)
}

/// gaussian elimination with partial pivoting, None if singular
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        let pivot_row = a[col].clone();
        for row in col + 1..n {
            let f = a[row][col] / pivot_row[col];
            for k in col..n {
                a[row][k] -= f * pivot_row[k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = vec![0.; n];
    for row in (0..n).rev() {
        let s: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - s) / a[row][row];
    }
    Some(x)
}

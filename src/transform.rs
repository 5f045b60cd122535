//! Per-day transforms of the cumulative series.

use anyhow::{ensure, Result};

/// added to every ratio denominator so that days without tests give 0 instead of NAN.
/// The bias is toward zero, a day with no data reads as 0% positivity.
pub const RATIO_EPSILON: f64 = 1e-19;

/// number of days a case is counted as active
pub const DAYS_ACTIVE: usize = 8;

/// first discrete derivative, s[i+1] - s[i].
/// The output is one element shorter than the input (empty if len < 2);
/// the caller drops the first x value to keep the alignment.
pub fn derivative(s: &[f64]) -> Vec<f64> {
    s.windows(2).map(|w| w[1] - w[0]).collect()
}

/// derivative applied k times, drop the first k x values to align
pub fn nth_derivative(s: &[f64], k: usize) -> Vec<f64> {
    let mut d = s.to_vec();
    for _ in 0..k {
        d = derivative(&d);
    }
    d
}

/// daily values from a cumulative series, same length as the input.
/// The first day counts from zero.
pub fn daily_from_cumulative(s: &[f64]) -> Vec<f64> {
    let mut previous = 0.;
    s.iter()
        .map(|&v| {
            let d = v - previous;
            previous = v;
            d
        })
        .collect()
}

/// first derivative with a leading zero, same length as the input.
/// The first day has no previous day and counts no change.
pub fn daily_change(s: &[f64]) -> Vec<f64> {
    if s.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.).chain(derivative(s)).collect()
}

/// elementwise num / (den + RATIO_EPSILON)
pub fn ratio(num: &[f64], den: &[f64]) -> Result<Vec<f64>> {
    ensure!(
        num.len() == den.len(),
        "ratio of series with different lengths, {} and {}",
        num.len(),
        den.len()
    );
    Ok(num
        .iter()
        .zip(den.iter())
        .map(|(n, d)| n / (d + RATIO_EPSILON))
        .collect())
}

/// fraction of positive tests, positives / (positives + negatives)
pub fn test_positivity(positives: &[f64], negatives: &[f64]) -> Result<Vec<f64>> {
    ensure!(
        positives.len() == negatives.len(),
        "positives and negatives have different lengths, {} and {}",
        positives.len(),
        negatives.len()
    );
    let total: Vec<f64> = positives
        .iter()
        .zip(negatives.iter())
        .map(|(p, n)| p + n)
        .collect();
    ratio(positives, &total)
}

/// fraction of positive tests from the cases and tests of each day,
/// capped at 1 for days with more cases than reported tests
pub fn positivity_from_tests(new_cases: &[f64], tests: &[f64]) -> Result<Vec<f64>> {
    Ok(ratio(new_cases, tests)?
        .into_iter()
        .map(|r| r.max(0.).min(1.))
        .collect())
}

pub fn percent(r: &[f64]) -> Vec<f64> {
    r.iter().map(|v| 100. * v).collect()
}

/// rolling sum of the last `days` new cases, current day included.
/// The first `days` entries sum everything seen so far.
pub fn active_cases(new_cases: &[f64], days: usize) -> Vec<f64> {
    let mut active: Vec<f64> = Vec::with_capacity(new_cases.len());
    let mut running = 0.;
    for (i, &c) in new_cases.iter().enumerate() {
        running += c;
        if days > 0 && i >= days {
            running -= new_cases[i - days];
        }
        active.push(running);
    }
    active
}

/// Coefficients of the empirical prevalence ratio,
/// prevalence = base + scale * sqrt(positivity).
/// The estimate is only meant for visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfectionModel {
    pub base: f64,
    pub scale: f64,
}

impl Default for InfectionModel {
    fn default() -> Self {
        InfectionModel {
            base: 2.5,
            scale: 16.,
        }
    }
}

impl InfectionModel {
    pub fn prevalence(&self, positivity: f64) -> f64 {
        self.base + self.scale * positivity.max(0.).sqrt()
    }
}

/// estimated true infections per day, prevalence(positivity) * new_cases
pub fn estimate_daily_infections(
    model: &InfectionModel,
    positivity: &[f64],
    new_cases: &[f64],
) -> Result<Vec<f64>> {
    ensure!(
        positivity.len() == new_cases.len(),
        "positivity and new cases have different lengths, {} and {}",
        positivity.len(),
        new_cases.len()
    );
    Ok(positivity
        .iter()
        .zip(new_cases.iter())
        .map(|(&p, &c)| model.prevalence(p) * c)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUMULATIVE: [f64; 10] = [1., 3., 6., 10., 15., 21., 28., 36., 45., 55.];

    #[test]
    fn test_derivative() {
        let d = derivative(&CUMULATIVE);
        assert_eq!(d, vec![2., 3., 4., 5., 6., 7., 8., 9., 10.]);
        for (i, v) in d.iter().enumerate() {
            assert_eq!(*v, CUMULATIVE[i + 1] - CUMULATIVE[i]);
        }
    }

    #[test]
    fn test_second_derivative() {
        let d2 = nth_derivative(&CUMULATIVE, 2);
        assert_eq!(d2, vec![1.; 8]);
        assert_eq!(d2, derivative(&derivative(&CUMULATIVE)));
    }

    #[test]
    fn test_derivative_short_input() {
        assert!(derivative(&[]).is_empty());
        assert!(derivative(&[4.]).is_empty());
        assert!(nth_derivative(&[1., 2.], 2).is_empty());
    }

    #[test]
    fn test_daily_from_cumulative() {
        assert_eq!(daily_from_cumulative(&[2., 5., 5., 9.]), vec![2., 3., 0., 4.]);
        assert!(daily_from_cumulative(&[]).is_empty());
    }

    #[test]
    fn test_daily_change() {
        assert_eq!(daily_change(&[2., 5., 5., 9.]), vec![0., 3., 0., 4.]);
        assert_eq!(daily_change(&[7.]), vec![0.]);
        assert!(daily_change(&[]).is_empty());
    }

    #[test]
    fn test_zero_tests_give_zero_positivity() {
        let p = test_positivity(&[0., 5.], &[0., 15.]).unwrap();
        assert_eq!(p[0], 0.);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!((p[1] - 0.25).abs() < 1e-12);
        assert_eq!(percent(&p)[0], 0.);
    }

    #[test]
    fn test_positivity_from_tests() {
        let p = positivity_from_tests(&[5., 3., 0.], &[50., 0., 0.]).unwrap();
        assert!((p[0] - 0.1).abs() < 1e-12);
        assert_eq!(p[1], 1.);
        assert_eq!(p[2], 0.);
    }

    #[test]
    fn test_ratio_length_mismatch() {
        assert!(ratio(&[1.], &[1., 2.]).is_err());
    }

    #[test]
    fn test_active_cases() {
        let new_cases: Vec<f64> = (1..=12).map(|v| v as f64).collect();
        let active = active_cases(&new_cases, DAYS_ACTIVE);
        assert_eq!(active[0], 1.);
        assert_eq!(active[7], 36.);
        // days 2..=9
        assert_eq!(active[8], 44.);
        assert_eq!(active[11], (5..=12).sum::<i32>() as f64);
    }

    #[test]
    fn test_estimate_daily_infections() {
        let model = InfectionModel::default();
        let est = estimate_daily_infections(&model, &[0., 0.25], &[10., 10.]).unwrap();
        assert!((est[0] - 25.).abs() < 1e-12);
        assert!((est[1] - 105.).abs() < 1e-12);

        let flat = InfectionModel { base: 1., scale: 0. };
        let est = estimate_daily_infections(&flat, &[0.5, 0.9], &[3., 4.]).unwrap();
        assert_eq!(est, vec![3., 4.]);

        assert!(estimate_daily_infections(&model, &[0.1], &[]).is_err());
    }
}

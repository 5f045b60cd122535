//! Source adapters: each one reads its CSV layout, filters the rows of one
//! region and produces a [`RegionSeries`].

pub mod cagov;
pub mod covidtracking;
pub mod fetch;
pub mod nyt;

use crate::{Region, RegionSeries};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub use fetch::read_source;

/// A data source that can be filtered down to one region.
/// Ok(None) means that no row matched the region.
pub trait Source {
    /// name shown in the figure titles
    fn name(&self) -> &str;
    fn load(&self, region: &Region) -> Result<Option<RegionSeries>>;
}

/// Replaces the missing cells of a column with zero.
/// Zero and unknown are not distinguished afterwards, the number of
/// replaced cells is logged so the coercion stays visible.
pub fn fill_missing<I: IntoIterator<Item = Option<f64>>>(column: &str, values: I) -> Vec<f64> {
    let mut missing = 0usize;
    let filled: Vec<f64> = values
        .into_iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => v,
            _ => {
                missing += 1;
                0.
            }
        })
        .collect();
    if missing == filled.len() && missing > 0 {
        warn!(column, missing, "column has no values, filled with zeros");
    } else if missing > 0 {
        debug!(column, missing, "missing values replaced with zero");
    }
    filled
}

/// parses dates as %Y-%m-%d, ignoring any time part after the day
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    let day = s.trim().get(..10).unwrap_or_else(|| s.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").with_context(|| format!("invalid date '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing() {
        let v = fill_missing("icu", vec![Some(1.), None, Some(3.), Some(f64::NAN)]);
        assert_eq!(v, vec![1., 0., 3., 0.]);
        assert!(fill_missing("icu", Vec::new()).is_empty());
    }

    #[test]
    fn test_parse_iso_date() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 18).unwrap();
        assert_eq!(parse_iso_date("2020-03-18").unwrap(), d);
        assert_eq!(parse_iso_date("2020-03-18T00:00:00").unwrap(), d);
        assert!(parse_iso_date("03/18/2020").is_err());
        assert!(parse_iso_date("").is_err());
    }
}

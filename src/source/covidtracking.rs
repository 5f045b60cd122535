//! COVID Tracking Project (The Atlantic) daily state values, state-daily.csv.
//! Rows come newest first, one per state and day.

use super::{fill_missing, read_source, Source};
use crate::{same_name, Region, RegionSeries};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

pub const SOURCE_NAME: &str = "COVID Tracking Project Data (The Atlantic)";
pub const DEFAULT_CSV: &str = "./covidtracking-data/state-daily.csv";
pub const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Deserialize)]
struct Row {
    date: String,
    state: String,
    positive: Option<f64>,
    negative: Option<f64>,
    death: Option<f64>,
    #[serde(rename = "hospitalizedCurrently")]
    hospitalized_currently: Option<f64>,
    #[serde(rename = "inIcuCurrently")]
    in_icu_currently: Option<f64>,
}

/// rows of one state, by postal code (e.g. NY), ascending by date
pub fn load(bytes: &[u8], state: &str) -> Result<Option<RegionSeries>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows: Vec<(NaiveDate, Row)> = Vec::new();
    for result in rdr.deserialize() {
        let row: Row = result.context("invalid row in the COVID Tracking Project csv")?;
        if !same_name(&row.state, state) {
            continue;
        }
        let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT)
            .with_context(|| format!("invalid date '{}'", row.date))?;
        rows.push((date, row));
    }
    if rows.is_empty() {
        return Ok(None);
    }
    rows.sort_by_key(|r| r.0);

    let mut rs = RegionSeries::new(&rows[0].1.state, rows.len());
    rs.dates = rows.iter().map(|r| r.0).collect();
    rs.cases = fill_missing("positive", rows.iter().map(|r| r.1.positive));
    rs.deaths = fill_missing("death", rows.iter().map(|r| r.1.death));
    rs.hospitalized = Some(fill_missing(
        "hospitalizedCurrently",
        rows.iter().map(|r| r.1.hospitalized_currently),
    ));
    rs.icu = Some(fill_missing("inIcuCurrently", rows.iter().map(|r| r.1.in_icu_currently)));
    rs.positives = Some(rs.cases.clone());
    rs.negatives = Some(fill_missing("negative", rows.iter().map(|r| r.1.negative)));
    Ok(Some(rs))
}

/// The state-daily csv, path or URL.
#[derive(Debug, Clone)]
pub struct CovidTracking {
    pub csv: String,
}

impl Default for CovidTracking {
    fn default() -> Self {
        CovidTracking {
            csv: DEFAULT_CSV.to_string(),
        }
    }
}

impl Source for CovidTracking {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn load(&self, region: &Region) -> Result<Option<RegionSeries>> {
        let series = load(&read_source(&self.csv)?, &region.state)?;
        if let Some(rs) = &series {
            info!(location = %rs.location, days = rs.len(), "COVID Tracking Project rows loaded");
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = "date,state,positive,negative,pending,hospitalizedCurrently,inIcuCurrently,death
20200403,NY,30,70,,12,4,2
20200403,CA,9,91,,,,
20200402,NY,20,50,,10,,1
20200401,NY,10,,,,,
";

    #[test]
    fn test_load_reverses_to_ascending() {
        let rs = load(DAILY.as_bytes(), "ny").unwrap().unwrap();
        assert_eq!(rs.location, "NY");
        assert_eq!(rs.display_dates(), vec!["04/01", "04/02", "04/03"]);
        assert_eq!(rs.cases, vec![10., 20., 30.]);
        assert_eq!(rs.deaths, vec![0., 1., 2.]);
        assert_eq!(rs.negatives, Some(vec![0., 50., 70.]));
        assert_eq!(rs.hospitalized, Some(vec![0., 10., 12.]));
        assert_eq!(rs.icu, Some(vec![0., 0., 4.]));
        assert!(rs.is_aligned());
    }

    #[test]
    fn test_unknown_state() {
        assert!(load(DAILY.as_bytes(), "WA").unwrap().is_none());
    }
}

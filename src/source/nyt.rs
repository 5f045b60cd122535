//! New York Times daily cumulative counts, us-states.csv and us-counties.csv.

use super::{fill_missing, parse_iso_date, read_source, Source};
use crate::{same_name, Region, RegionSeries};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

pub const SOURCE_NAME: &str = "NYT COVID Data";
pub const DEFAULT_STATES_CSV: &str = "./nyt-data/us-states.csv";
pub const DEFAULT_COUNTIES_CSV: &str = "./nyt-data/us-counties.csv";

#[derive(Debug, Deserialize)]
struct StateRow {
    date: String,
    state: String,
    cases: Option<f64>,
    deaths: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CountyRow {
    date: String,
    county: String,
    state: String,
    cases: Option<f64>,
    deaths: Option<f64>,
}

fn build(location: String, mut rows: Vec<(NaiveDate, Option<f64>, Option<f64>)>) -> RegionSeries {
    rows.sort_by_key(|r| r.0);
    let mut rs = RegionSeries::new(&location, rows.len());
    rs.dates = rows.iter().map(|r| r.0).collect();
    rs.cases = fill_missing("cases", rows.iter().map(|r| r.1));
    rs.deaths = fill_missing("deaths", rows.iter().map(|r| r.2));
    rs
}

/// rows of one state, the state name is matched ignoring case
pub fn load_states(bytes: &[u8], state: &str) -> Result<Option<RegionSeries>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    let mut name = None;
    for result in rdr.deserialize() {
        let row: StateRow = result.context("invalid row in the NYT states csv")?;
        if !same_name(&row.state, state) {
            continue;
        }
        rows.push((parse_iso_date(&row.date)?, row.cases, row.deaths));
        name.get_or_insert(row.state);
    }
    Ok(name.map(|n| build(n, rows)))
}

/// rows of one county within a state
pub fn load_counties(bytes: &[u8], state: &str, county: &str) -> Result<Option<RegionSeries>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();
    let mut name = None;
    for result in rdr.deserialize() {
        let row: CountyRow = result.context("invalid row in the NYT counties csv")?;
        if !same_name(&row.state, state) || !same_name(&row.county, county) {
            continue;
        }
        rows.push((parse_iso_date(&row.date)?, row.cases, row.deaths));
        name.get_or_insert_with(|| format!("{} County, {}", row.county, row.state));
    }
    Ok(name.map(|n| build(n, rows)))
}

/// The NYT csv files, paths or URLs.
#[derive(Debug, Clone)]
pub struct Nyt {
    pub states_csv: String,
    pub counties_csv: String,
}

impl Default for Nyt {
    fn default() -> Self {
        Nyt {
            states_csv: DEFAULT_STATES_CSV.to_string(),
            counties_csv: DEFAULT_COUNTIES_CSV.to_string(),
        }
    }
}

impl Source for Nyt {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn load(&self, region: &Region) -> Result<Option<RegionSeries>> {
        let series = match &region.county {
            Some(county) => load_counties(&read_source(&self.counties_csv)?, &region.state, county)?,
            None => load_states(&read_source(&self.states_csv)?, &region.state)?,
        };
        if let Some(rs) = &series {
            info!(location = %rs.location, days = rs.len(), "NYT rows loaded");
        }
        Ok(series)
    }
}

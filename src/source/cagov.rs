//! California county data from data.ca.gov: cases, hospitals and statewide testing.
//! Hospital and testing rows are aligned to the dates of the case rows.

use super::{fill_missing, parse_iso_date, read_source, Source};
use crate::transform::daily_from_cumulative;
use crate::{same_name, Region, RegionSeries};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

pub const SOURCE_NAME: &str = "CA Gov COVID19 Data";
pub const DEFAULT_COUNTY: &str = "Los Angeles";
pub const HOSPITALS_URL: &str = "https://data.ca.gov/dataset/529ac907-6ba1-4cb7-9aae-8966fc96aeef/resource/42d33765-20fd-44b8-a978-b083b7542225/download/hospitals_by_county.csv";
pub const CASES_URL: &str = "https://data.ca.gov/dataset/590188d5-8545-4c93-a9a0-e230f0db7290/resource/926fd08f-cc91-4828-af38-bd45de97f8c3/download/statewide_cases.csv";
pub const TESTS_URL: &str = "https://data.ca.gov/dataset/efd6b822-7312-477c-922b-bccb82025fbe/resource/b6648a0d-ff0a-4111-b80b-febda2ac9e09/download/statewide_testing.csv";

#[derive(Debug, Deserialize)]
struct CaseRow {
    county: String,
    totalcountconfirmed: Option<f64>,
    totalcountdeaths: Option<f64>,
    newcountconfirmed: Option<f64>,
    newcountdeaths: Option<f64>,
    date: String,
}

#[derive(Debug, Deserialize)]
struct HospitalRow {
    county: String,
    todays_date: String,
    hospitalized_covid_confirmed_patients: Option<f64>,
    hospitalized_suspected_covid_patients: Option<f64>,
    icu_covid_confirmed_patients: Option<f64>,
    icu_suspected_covid_patients: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TestRow {
    date: String,
    tested: Option<f64>,
}

fn sum_present(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.) + b.unwrap_or(0.)),
    }
}

/// hospitalized and ICU patients (confirmed + suspected) of the county by date
fn hospitals_by_date(bytes: &[u8], county: &str) -> Result<HashMap<NaiveDate, (Option<f64>, Option<f64>)>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut by_date = HashMap::new();
    for result in rdr.deserialize() {
        let row: HospitalRow = result.context("invalid row in the hospitals csv")?;
        if !same_name(&row.county, county) {
            continue;
        }
        let hospitalized = sum_present(
            row.hospitalized_covid_confirmed_patients,
            row.hospitalized_suspected_covid_patients,
        );
        let icu = sum_present(row.icu_covid_confirmed_patients, row.icu_suspected_covid_patients);
        by_date.insert(parse_iso_date(&row.todays_date)?, (hospitalized, icu));
    }
    Ok(by_date)
}

/// statewide tests performed per day, from the cumulative counts
fn daily_tests_by_date(bytes: &[u8]) -> Result<HashMap<NaiveDate, f64>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows: Vec<(NaiveDate, Option<f64>)> = Vec::new();
    for result in rdr.deserialize() {
        let row: TestRow = result.context("invalid row in the testing csv")?;
        rows.push((parse_iso_date(&row.date)?, row.tested));
    }
    rows.sort_by_key(|r| r.0);
    let cumulative = fill_missing("tested", rows.iter().map(|r| r.1));
    let daily = daily_from_cumulative(&cumulative);
    Ok(rows.iter().map(|r| r.0).zip(daily.into_iter()).collect())
}

/// Rows of one county: cumulative and new cases and deaths, hospital census and daily tests.
/// Days without a hospital or testing row count as zero.
pub fn load(cases: &[u8], hospitals: &[u8], tests: &[u8], county: &str) -> Result<Option<RegionSeries>> {
    let mut rdr = csv::Reader::from_reader(cases);
    let mut rows: Vec<(NaiveDate, CaseRow)> = Vec::new();
    for result in rdr.deserialize() {
        let row: CaseRow = result.context("invalid row in the cases csv")?;
        if !same_name(&row.county, county) {
            continue;
        }
        rows.push((parse_iso_date(&row.date)?, row));
    }
    if rows.is_empty() {
        return Ok(None);
    }
    rows.sort_by_key(|r| r.0);

    let hospitals = hospitals_by_date(hospitals, county)?;
    let tests = daily_tests_by_date(tests)?;
    debug!(hospital_days = hospitals.len(), test_days = tests.len(), "aligning to case dates");

    let mut rs = RegionSeries::new(&rows[0].1.county, rows.len());
    rs.dates = rows.iter().map(|r| r.0).collect();
    rs.cases = fill_missing("totalcountconfirmed", rows.iter().map(|r| r.1.totalcountconfirmed));
    rs.deaths = fill_missing("totalcountdeaths", rows.iter().map(|r| r.1.totalcountdeaths));
    rs.new_cases = Some(fill_missing("newcountconfirmed", rows.iter().map(|r| r.1.newcountconfirmed)));
    rs.new_deaths = Some(fill_missing("newcountdeaths", rows.iter().map(|r| r.1.newcountdeaths)));
    rs.hospitalized = Some(fill_missing(
        "hospitalized",
        rs.dates.iter().map(|d| hospitals.get(d).and_then(|h| h.0)),
    ));
    rs.icu = Some(fill_missing("icu", rs.dates.iter().map(|d| hospitals.get(d).and_then(|h| h.1))));
    rs.tests = Some(fill_missing("tests", rs.dates.iter().map(|d| tests.get(d).copied())));
    Ok(Some(rs))
}

/// The three data.ca.gov csv files, paths or URLs.
#[derive(Debug, Clone)]
pub struct CaGov {
    pub cases_csv: String,
    pub hospitals_csv: String,
    pub tests_csv: String,
}

impl Default for CaGov {
    fn default() -> Self {
        CaGov {
            cases_csv: CASES_URL.to_string(),
            hospitals_csv: HOSPITALS_URL.to_string(),
            tests_csv: TESTS_URL.to_string(),
        }
    }
}

impl Source for CaGov {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn load(&self, region: &Region) -> Result<Option<RegionSeries>> {
        let county = match &region.county {
            Some(c) => c,
            None => bail!("the California data is by county, no county given"),
        };
        let cases = read_source(&self.cases_csv)?;
        let hospitals = read_source(&self.hospitals_csv)?;
        let tests = read_source(&self.tests_csv)?;
        let series = load(&cases, &hospitals, &tests, county)?;
        if let Some(rs) = &series {
            info!(location = %rs.location, days = rs.len(), "data.ca.gov rows loaded");
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &str = "county,totalcountconfirmed,totalcountdeaths,newcountconfirmed,newcountdeaths,date
Orange,10,1,10,1,2020-04-01
Orange,15,1,5,0,2020-04-02
Marin,3,0,3,0,2020-04-01
Orange,22,3,7,2,2020-04-03
";

    const HOSPITALS: &str = "county,todays_date,hospitalized_covid_confirmed_patients,hospitalized_suspected_covid_patients,hospitalized_covid_patients,all_hospital_beds,icu_covid_confirmed_patients,icu_suspected_covid_patients,icu_available_beds
Orange,2020-04-02,4,2,6,100,1,,20
Orange,2020-04-03,5,1,6,100,2,1,20
Marin,2020-04-03,1,1,2,50,0,0,10
";

    const TESTS: &str = "date,tested
2020-04-01,100
2020-04-02,150
2020-04-03,210
";

    #[test]
    fn test_load_aligns_by_date() {
        let rs = load(CASES.as_bytes(), HOSPITALS.as_bytes(), TESTS.as_bytes(), "orange")
            .unwrap()
            .unwrap();
        assert_eq!(rs.location, "Orange");
        assert_eq!(rs.cases, vec![10., 15., 22.]);
        assert_eq!(rs.new_cases, Some(vec![10., 5., 7.]));
        assert_eq!(rs.new_deaths, Some(vec![1., 0., 2.]));
        // no hospital row on the first day
        assert_eq!(rs.hospitalized, Some(vec![0., 6., 6.]));
        assert_eq!(rs.icu, Some(vec![0., 1., 3.]));
        assert_eq!(rs.tests, Some(vec![100., 50., 60.]));
        assert!(rs.is_aligned());
    }

    #[test]
    fn test_unknown_county() {
        let rs = load(CASES.as_bytes(), HOSPITALS.as_bytes(), TESTS.as_bytes(), "Alpine").unwrap();
        assert!(rs.is_none());
    }

    #[test]
    fn test_county_required() {
        let src = CaGov::default();
        assert!(src.load(&Region::state("California")).is_err());
    }
}

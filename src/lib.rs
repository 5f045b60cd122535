use chrono::NaiveDate;
pub mod chart;
pub mod cli;
pub mod color;
pub mod figure;
pub mod pipeline;
pub mod smooth;
pub mod source;
pub mod transform;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// format of the dates shown on the x axis
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d";

/// A row filter, a state and optionally a county within it.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub state: String,
    pub county: Option<String>,
}

impl Region {
    pub fn state(state: &str) -> Region {
        Region {
            state: state.trim().to_string(),
            county: None,
        }
    }

    pub fn county(state: &str, county: &str) -> Region {
        Region {
            state: state.trim().to_string(),
            county: Some(county.trim().to_string()),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.county {
            Some(c) => write!(f, "{} County, {}", c, self.state),
            None => write!(f, "{}", self.state),
        }
    }
}

/// case-insensitive comparison used by all the region filters
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// The main struct for the daily time series of one region.
/// All the columns have the same length as `dates`, ascending by date.
/// Missing cells have already been normalized to zero by the source adapters.
#[derive(Debug, Clone, Default)]
pub struct RegionSeries {
    pub location: String,
    pub dates: Vec<NaiveDate>,
    /// cumulative confirmed cases
    pub cases: Vec<f64>,
    /// cumulative deaths
    pub deaths: Vec<f64>,
    /// patients currently hospitalized
    pub hospitalized: Option<Vec<f64>>,
    /// patients currently in intensive care
    pub icu: Option<Vec<f64>>,
    /// cumulative positive tests
    pub positives: Option<Vec<f64>>,
    /// cumulative negative tests
    pub negatives: Option<Vec<f64>>,
    /// new cases reported per day, when the source provides them
    pub new_cases: Option<Vec<f64>>,
    /// new deaths reported per day, when the source provides them
    pub new_deaths: Option<Vec<f64>>,
    /// tests performed per day
    pub tests: Option<Vec<f64>>,
}

impl RegionSeries {
    pub fn new(location: &str, capacity: usize) -> RegionSeries {
        RegionSeries {
            location: location.to_string(),
            dates: Vec::with_capacity(capacity),
            cases: Vec::with_capacity(capacity),
            deaths: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// the x axis labels, MM/DD
    pub fn display_dates(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
            .collect()
    }

    /// checks that every present column is aligned with the dates
    pub fn is_aligned(&self) -> bool {
        let n = self.dates.len();
        let optional = [
            &self.hospitalized,
            &self.icu,
            &self.positives,
            &self.negatives,
            &self.new_cases,
            &self.new_deaths,
            &self.tests,
        ];
        self.cases.len() == n
            && self.deaths.len() == n
            && optional
                .iter()
                .all(|c| c.as_ref().map_or(true, |v| v.len() == n))
    }

    /// file name friendly version of the location
    pub fn slug(&self) -> String {
        slugify(&self.location)
    }
}

impl std::fmt::Display for RegionSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "date, cases, deaths\n")?;
        for ((d, c), t) in self.dates.iter().zip(self.cases.iter()).zip(self.deaths.iter()) {
            write!(f, "{},{},{}\n", d, c, t)?
        }
        Ok(())
    }
}

pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// min and max of a slice, None if empty.
/// NAN values are skipped by the comparisons.
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut s_iter = s.iter();
    let (mut min, mut max) = match s_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in s_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dates() {
        let mut rs = RegionSeries::new("Utah", 2);
        rs.dates.push(NaiveDate::from_ymd_opt(2020, 3, 9).unwrap());
        rs.dates.push(NaiveDate::from_ymd_opt(2020, 12, 25).unwrap());
        assert_eq!(rs.display_dates(), vec!["03/09", "12/25"]);
    }

    #[test]
    fn test_is_aligned() {
        let mut rs = RegionSeries::new("Utah", 2);
        rs.dates.push(NaiveDate::from_ymd_opt(2020, 3, 9).unwrap());
        rs.cases.push(1.);
        rs.deaths.push(0.);
        assert!(rs.is_aligned());
        rs.icu = Some(vec![1., 2.]);
        assert!(!rs.is_aligned());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Los Angeles County, California"), "los_angeles_county_california");
        assert_eq!(slugify("  NY "), "ny");
    }

    #[test]
    fn test_min_and_max() {
        assert_eq!(min_and_max(&[3., -1., 7., 2.]), Some((-1., 7.)));
        assert_eq!(min_and_max::<f64>(&[]), None);
    }

    #[test]
    fn test_region_display_and_matching() {
        assert_eq!(Region::county("California", "Orange").to_string(), "Orange County, California");
        assert_eq!(Region::state("Texas").to_string(), "Texas");
        assert!(same_name("new york", "New York"));
        assert!(!same_name("New York", "New Jersey"));
    }
}

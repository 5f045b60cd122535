//! From a source and a region to the figures on disk.

use crate::figure::{
    figure_path, render_figure, CountyOverviewPlot, Figure, HospitalizationPlot, OutputFormat, SinglePanel,
    StandardPlot,
};
use crate::smooth::Smoothing;
use crate::source::Source;
use crate::transform::{
    active_cases, daily_change, daily_from_cumulative, positivity_from_tests, test_positivity, InfectionModel,
    DAYS_ACTIVE,
};
use crate::{Region, RegionSeries};
use anyhow::{ensure, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Output and smoothing settings shared by all the plotting apps.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub outdir: PathBuf,
    pub format: OutputFormat,
    pub smoothing: Smoothing,
    pub infection: InfectionModel,
    /// pixels of each figure
    pub size: (u32, u32),
    pub verbose: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            outdir: PathBuf::from("."),
            format: OutputFormat::Png,
            smoothing: Smoothing::default(),
            infection: InfectionModel::default(),
            size: (1200, 800),
            verbose: false,
        }
    }
}

impl PlotConfig {
    /// renders the figure into the output directory, returns the file path
    pub fn save<F: Figure + ?Sized>(&self, figure: &F, slug: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.outdir)
            .with_context(|| format!("could not create {}", self.outdir.display()))?;
        let fout = figure_path(&self.outdir, slug, figure.name(), self.format);
        render_figure(figure, &fout, self.size)
            .with_context(|| format!("could not render {}", fout.display()))?;
        Ok(fout)
    }
}

/// The figures available for the columns of the series:
/// the standard grid always, the others when their columns are present.
pub fn figures(source: &str, rs: &RegionSeries, config: &PlotConfig) -> Result<Vec<Box<dyn Figure>>> {
    ensure!(rs.is_aligned(), "columns of {} are not aligned with the dates", rs.location);
    let x = rs.display_dates();
    let smoothing = config.smoothing;
    let mut figures: Vec<Box<dyn Figure>> = Vec::new();

    if let (Some(new_cases), Some(hospitalized), Some(icu), Some(new_deaths)) =
        (&rs.new_cases, &rs.hospitalized, &rs.icu, &rs.new_deaths)
    {
        figures.push(Box::new(CountyOverviewPlot {
            location: rs.location.clone(),
            x: x.clone(),
            active: active_cases(new_cases, DAYS_ACTIVE),
            hospitalized: hospitalized.clone(),
            icu: icu.clone(),
            deaths: new_deaths.clone(),
            smoothing,
        }));
    }

    figures.push(Box::new(StandardPlot {
        source: source.to_string(),
        location: rs.location.clone(),
        x: x.clone(),
        cases: rs.cases.clone(),
        deaths: rs.deaths.clone(),
        smoothing,
    }));

    if rs.new_cases.is_none() {
        if let (Some(hospitalized), Some(icu)) = (&rs.hospitalized, &rs.icu) {
            figures.push(Box::new(HospitalizationPlot {
                location: rs.location.clone(),
                x: x.clone(),
                hospitalized: hospitalized.clone(),
                icu: icu.clone(),
                smoothing,
            }));
        }
    }

    if let (Some(positives), Some(negatives)) = (&rs.positives, &rs.negatives) {
        let daily_positives = daily_from_cumulative(positives);
        let daily_negatives = daily_from_cumulative(negatives);
        let positivity = test_positivity(&daily_positives, &daily_negatives)?;
        let new_cases = daily_change(&rs.cases);
        figures.push(Box::new(SinglePanel::test_results(
            &rs.location,
            &x,
            daily_positives,
            daily_negatives,
            smoothing,
        )));
        figures.push(Box::new(SinglePanel::test_positivity(&rs.location, &x, &positivity, smoothing)));
        figures.push(Box::new(SinglePanel::estimated_infections(
            &rs.location,
            &x,
            &config.infection,
            &positivity,
            &new_cases,
            smoothing,
        )?));
    } else if let (Some(new_cases), Some(tests)) = (&rs.new_cases, &rs.tests) {
        let positivity = positivity_from_tests(new_cases, tests)?;
        figures.push(Box::new(SinglePanel::estimated_infections(
            &rs.location,
            &x,
            &config.infection,
            &positivity,
            new_cases,
            smoothing,
        )?));
    }
    Ok(figures)
}

/// Loads the region from the source and saves its figures.
/// Ok(None) when no row matched the region, nothing is drawn.
pub fn plot_region<S: Source + ?Sized>(
    source: &S,
    region: &Region,
    config: &PlotConfig,
) -> Result<Option<Vec<PathBuf>>> {
    let rs = match source.load(region)? {
        Some(rs) if !rs.is_empty() => rs,
        _ => {
            warn!(region = %region, "no data found");
            return Ok(None);
        }
    };
    info!(location = %rs.location, days = rs.len(), "plotting");
    let slug = rs.slug();
    let mut saved = Vec::new();
    for figure in figures(source.name(), &rs, config)?.iter() {
        saved.push(config.save(figure.as_ref(), &slug)?);
    }
    Ok(Some(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(n: usize) -> RegionSeries {
        let mut rs = RegionSeries::new("Orange", n);
        let start = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        for i in 0..n {
            rs.dates.push(start + chrono::Duration::days(i as i64));
            rs.cases.push((i * i) as f64);
            rs.deaths.push(i as f64);
        }
        rs
    }

    fn names(figures: &[Box<dyn Figure>]) -> Vec<String> {
        figures.iter().map(|f| f.name().to_string()).collect()
    }

    #[test]
    fn test_figures_cases_only() {
        let f = figures("src", &series(12), &PlotConfig::default()).unwrap();
        assert_eq!(names(&f), vec!["standard"]);
    }

    #[test]
    fn test_figures_tracking_columns() {
        let mut rs = series(12);
        rs.hospitalized = Some(vec![1.; 12]);
        rs.icu = Some(vec![0.; 12]);
        rs.positives = Some(rs.cases.clone());
        rs.negatives = Some(vec![10.; 12]);
        let f = figures("src", &rs, &PlotConfig::default()).unwrap();
        assert_eq!(names(&f), vec!["standard", "hospitalizations", "tests", "positivity", "infections"]);
        for figure in f.iter() {
            for panel in figure.panels().unwrap() {
                panel.validate().unwrap();
            }
        }
    }

    #[test]
    fn test_reported_cases_start_at_zero() {
        let mut rs = series(12);
        rs.positives = Some(rs.cases.clone());
        rs.negatives = Some(vec![10.; 12]);
        let f = figures("src", &rs, &PlotConfig::default()).unwrap();
        let infections = f.iter().find(|f| f.name() == "infections").unwrap();
        let reported = &infections.panels().unwrap()[0].series[1].values;
        assert_eq!(reported[..3], [0., 1., 3.]);
        assert_eq!(infections.panels().unwrap()[0].series[0].values[0], 0.);
    }

    #[test]
    fn test_figures_county_columns() {
        let mut rs = series(12);
        rs.new_cases = Some(daily_from_cumulative(&rs.cases));
        rs.new_deaths = Some(vec![1.; 12]);
        rs.hospitalized = Some(vec![1.; 12]);
        rs.icu = Some(vec![0.; 12]);
        rs.tests = Some(vec![0.; 12]);
        let f = figures("src", &rs, &PlotConfig::default()).unwrap();
        assert_eq!(names(&f), vec!["overview", "standard", "infections"]);
    }

    #[test]
    fn test_misaligned_series() {
        let mut rs = series(5);
        rs.icu = Some(vec![1.]);
        assert!(figures("src", &rs, &PlotConfig::default()).is_err());
    }
}

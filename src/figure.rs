//! Fixed multi-panel layouts and their rendering to png or svg files.

use crate::chart::{render, Panel, PanelStyle, Series, TITLE_FONT_SIZE};
use crate::smooth::Smoothing;
use crate::transform::{derivative, estimate_daily_infections, nth_derivative, percent, InfectionModel};
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FIGURE_TITLE_FONT_SIZE: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => bail!("unsupported output format '{}', use png or svg", other),
        }
    }
}

/// A figure is a grid of panels under a common title.
pub trait Figure {
    /// title drawn above the whole grid
    fn title(&self) -> String;
    /// short name used in the output file name
    fn name(&self) -> &str;
    /// rows and columns
    fn grid(&self) -> (usize, usize);
    /// the panels, row by row
    fn panels(&self) -> Result<Vec<Panel>>;
}

/// draws the panels of the figure into the grid of the given area
pub fn draw_figure<F, DB>(figure: &F, root: &DrawingArea<DB, Shift>) -> Result<()>
where
    F: Figure + ?Sized,
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let panels = figure.panels()?;
    let areas = root.split_evenly(figure.grid());
    if panels.len() > areas.len() {
        bail!(
            "figure '{}' has {} panels for a grid of {}",
            figure.name(),
            panels.len(),
            areas.len()
        );
    }
    for (area, panel) in areas.iter().zip(panels.iter()) {
        // too few days for this panel, e.g. a 2nd derivative of two days
        if panel.x.is_empty() {
            debug!(panel = %panel.title, "no values to draw, caption only");
            area.titled(&panel.title, ("sans-serif", TITLE_FONT_SIZE))?;
            continue;
        }
        render(area, panel).with_context(|| format!("could not draw panel '{}'", panel.title))?;
    }
    Ok(())
}

/// renders the figure to `fout`, svg if the extension is svg, png otherwise
pub fn render_figure<F: Figure + ?Sized>(figure: &F, fout: &Path, size: (u32, u32)) -> Result<()> {
    let is_svg = fout
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("svg"));
    let drawn = if is_svg {
        let root = SVGBackend::new(fout, size).into_drawing_area();
        draw_root(figure, &root)
    } else {
        let root = BitMapBackend::new(fout, size).into_drawing_area();
        draw_root(figure, &root)
    };
    if let Err(e) = drawn {
        if fout.exists() {
            let _ = std::fs::remove_file(fout);
        }
        return Err(e);
    }
    info!(figure = figure.name(), file = %fout.display(), "figure saved");
    Ok(())
}

fn draw_root<F, DB>(figure: &F, root: &DrawingArea<DB, Shift>) -> Result<()>
where
    F: Figure + ?Sized,
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let body = root.titled(&figure.title(), ("sans-serif", FIGURE_TITLE_FONT_SIZE))?;
    draw_figure(figure, &body)?;
    root.present()?;
    Ok(())
}

/// <outdir>/<slug>_<name>.<ext>
pub fn figure_path(outdir: &Path, slug: &str, name: &str, format: OutputFormat) -> PathBuf {
    outdir.join(format!("{}_{}.{}", slug, name, format.extension()))
}

fn skip(x: &[String], k: usize) -> Vec<String> {
    x.iter().skip(k).cloned().collect()
}

/// Cumulative cases and deaths with their first and second derivatives, 3x2.
#[derive(Debug, Clone)]
pub struct StandardPlot {
    pub source: String,
    pub location: String,
    pub x: Vec<String>,
    pub cases: Vec<f64>,
    pub deaths: Vec<f64>,
    pub smoothing: Smoothing,
}

impl Figure for StandardPlot {
    fn title(&self) -> String {
        format!("{} - {}", self.source, self.location)
    }

    fn name(&self) -> &str {
        "standard"
    }

    fn grid(&self) -> (usize, usize) {
        (3, 2)
    }

    fn panels(&self) -> Result<Vec<Panel>> {
        let loc = &self.location;
        let panel = |title: &str, k: usize, cases: Option<Vec<f64>>, deaths: Vec<f64>, ylabel: &str, prefix: &str| {
            let mut series = Vec::with_capacity(2);
            if let Some(c) = cases {
                series.push(Series::new(&format!("{}cases", prefix), "lightcoral", c));
            }
            series.push(Series::new(&format!("{}deaths", prefix), "gray", deaths));
            Panel {
                title: format!("{} COVID-19 {}", loc, title),
                x: skip(&self.x, k),
                series,
                ylabel: ylabel.to_string(),
                smoothing: self.smoothing,
                ..Default::default()
            }
        };
        let d_cases = derivative(&self.cases);
        let d_deaths = derivative(&self.deaths);
        let d2_cases = nth_derivative(&self.cases, 2);
        let d2_deaths = nth_derivative(&self.deaths, 2);
        Ok(vec![
            panel("Cumulative Confirmed Cases/Deaths", 0, Some(self.cases.clone()), self.deaths.clone(), "# of cases or deaths", ""),
            panel("Cumulative Confirmed Deaths", 0, None, self.deaths.clone(), "# of deaths", ""),
            panel("Confirmed Cases/Deaths 1st Deriv.", 1, Some(d_cases), d_deaths.clone(), "# of cases or deaths / day", "d_"),
            panel("Confirmed Deaths 1st Deriv.", 1, None, d_deaths, "# of deaths / day", "d_"),
            panel("Confirmed Cases/Deaths 2nd Deriv.", 2, Some(d2_cases), d2_deaths.clone(), "# of cases or deaths / day²", "d2_"),
            panel("Confirmed Deaths 2nd Deriv.", 2, None, d2_deaths, "# of deaths / day²", "d2_"),
        ])
    }
}

/// Hospital census and its daily change, 2x2.
#[derive(Debug, Clone)]
pub struct HospitalizationPlot {
    pub location: String,
    pub x: Vec<String>,
    pub hospitalized: Vec<f64>,
    pub icu: Vec<f64>,
    pub smoothing: Smoothing,
}

impl Figure for HospitalizationPlot {
    fn title(&self) -> String {
        format!("{} COVID-19 Hospitalizations", self.location)
    }

    fn name(&self) -> &str {
        "hospitalizations"
    }

    fn grid(&self) -> (usize, usize) {
        (2, 2)
    }

    fn panels(&self) -> Result<Vec<Panel>> {
        let loc = &self.location;
        let hospitalized = Series::new("hospitalized", "lightcoral", self.hospitalized.clone());
        let icu = Series::new("ICU", "orange", self.icu.clone());
        Ok(vec![
            Panel {
                title: format!("{} COVID-19 Currently Hospitalized", loc),
                x: self.x.clone(),
                series: vec![hospitalized.clone()],
                ylabel: "# of patients".to_string(),
                smoothing: self.smoothing,
                ..Default::default()
            },
            Panel {
                title: format!("{} COVID-19 Currently in ICU", loc),
                x: self.x.clone(),
                series: vec![icu.clone()],
                ylabel: "# of patients".to_string(),
                smoothing: self.smoothing,
                ..Default::default()
            },
            Panel {
                title: format!("{} COVID-19 Hospitalized/ICU", loc),
                x: self.x.clone(),
                series: vec![hospitalized, icu],
                ylabel: "# of patients".to_string(),
                smoothing: Smoothing::None,
                style: PanelStyle::Lines,
                ..Default::default()
            },
            Panel {
                title: format!("{} COVID-19 Hospitalized/ICU 1st Deriv.", loc),
                x: skip(&self.x, 1),
                series: vec![
                    Series::new("d_hospitalized", "lightcoral", derivative(&self.hospitalized)),
                    Series::new("d_ICU", "orange", derivative(&self.icu)),
                ],
                ylabel: "# of patients / day".to_string(),
                smoothing: self.smoothing,
                ..Default::default()
            },
        ])
    }
}

/// Active cases, hospitalizations and deaths of a county, 2x2.
#[derive(Debug, Clone)]
pub struct CountyOverviewPlot {
    pub location: String,
    pub x: Vec<String>,
    pub active: Vec<f64>,
    pub hospitalized: Vec<f64>,
    pub icu: Vec<f64>,
    /// deaths per day
    pub deaths: Vec<f64>,
    pub smoothing: Smoothing,
}

impl Figure for CountyOverviewPlot {
    fn title(&self) -> String {
        format!("{} COVID-19 Overview", self.location)
    }

    fn name(&self) -> &str {
        "overview"
    }

    fn grid(&self) -> (usize, usize) {
        (2, 2)
    }

    fn panels(&self) -> Result<Vec<Panel>> {
        let active = Series::new("Active", "green", self.active.clone());
        let hospitalized = Series::new("Hospitalized", "lightcoral", self.hospitalized.clone());
        let icu = Series::new("ICU", "orange", self.icu.clone());
        let deaths = Series::new("Deaths", "dimgray", self.deaths.clone());
        let panel = |series: Vec<Series>| Panel {
            title: format!("{} COVID-19 Data", self.location),
            x: self.x.clone(),
            series,
            xlabel: "Date".to_string(),
            ylabel: "Number".to_string(),
            smoothing: self.smoothing,
            ..Default::default()
        };
        Ok(vec![
            panel(vec![active, hospitalized.clone()]),
            panel(vec![hospitalized.clone(), icu]),
            panel(vec![deaths.clone()]),
            panel(vec![hospitalized, deaths]),
        ])
    }
}

/// A figure with a single panel.
#[derive(Debug, Clone)]
pub struct SinglePanel {
    pub title: String,
    pub name: String,
    pub panel: Panel,
}

impl Figure for SinglePanel {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn grid(&self) -> (usize, usize) {
        (1, 1)
    }

    fn panels(&self) -> Result<Vec<Panel>> {
        Ok(vec![self.panel.clone()])
    }
}

impl SinglePanel {
    /// daily negative and positive test counts
    pub fn test_results(
        location: &str,
        x: &[String],
        positives: Vec<f64>,
        negatives: Vec<f64>,
        smoothing: Smoothing,
    ) -> SinglePanel {
        SinglePanel {
            title: format!("{} COVID-19 Test Results", location),
            name: "tests".to_string(),
            panel: Panel {
                title: "COVID-19 Test Results".to_string(),
                x: x.to_vec(),
                series: vec![
                    Series::new("Number of negatives", "green", negatives),
                    Series::new("Number of positives", "red", positives),
                ],
                xlabel: "Date".to_string(),
                ylabel: "Count".to_string(),
                smoothing,
                ..Default::default()
            },
        }
    }

    /// percentage of positive tests, from the positivity ratio
    pub fn test_positivity(location: &str, x: &[String], positivity: &[f64], smoothing: Smoothing) -> SinglePanel {
        SinglePanel {
            title: format!("{} COVID-19 Test Positivity", location),
            name: "positivity".to_string(),
            panel: Panel {
                title: "COVID-19 Test Results".to_string(),
                x: x.to_vec(),
                series: vec![Series::new("Percent positive", "green", percent(positivity))],
                xlabel: "Date".to_string(),
                ylabel: "Percent".to_string(),
                smoothing,
                ..Default::default()
            },
        }
    }

    /// estimated true infections per day next to the reported new cases
    pub fn estimated_infections(
        location: &str,
        x: &[String],
        model: &InfectionModel,
        positivity: &[f64],
        new_cases: &[f64],
        smoothing: Smoothing,
    ) -> Result<SinglePanel> {
        let estimate = estimate_daily_infections(model, positivity, new_cases)?;
        Ok(SinglePanel {
            title: format!("{} Estimated Daily COVID-19 Infections", location),
            name: "infections".to_string(),
            panel: Panel {
                title: format!(
                    "prevalence ratio = {} + {} * sqrt(test positivity)",
                    model.base, model.scale
                ),
                x: x.to_vec(),
                series: vec![
                    Series::new("Estimated infections", "steelblue", estimate),
                    Series::new("Reported new cases", "red", new_cases.to_vec()),
                ],
                xlabel: "Date".to_string(),
                ylabel: "# of people / day".to_string(),
                smoothing,
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("04/{:02}", i + 1)).collect()
    }

    fn standard() -> StandardPlot {
        StandardPlot {
            source: "NYT COVID Data".to_string(),
            location: "Utah".to_string(),
            x: dates(10),
            cases: vec![1., 3., 6., 10., 15., 21., 28., 36., 45., 55.],
            deaths: vec![0., 0., 1., 1., 2., 3., 3., 4., 6., 7.],
            smoothing: Smoothing::default(),
        }
    }

    #[test]
    fn test_standard_panels_alignment() {
        let p = standard().panels().unwrap();
        assert_eq!(p.len(), 6);
        for panel in p.iter() {
            panel.validate().unwrap();
        }
        assert_eq!(p[2].x.len(), 9);
        assert_eq!(p[2].x[0], "04/02");
        assert_eq!(p[2].series[0].values, vec![2., 3., 4., 5., 6., 7., 8., 9., 10.]);
        assert_eq!(p[4].x.len(), 8);
        assert_eq!(p[4].series[0].values, vec![1.; 8]);
        assert_eq!(p[1].series.len(), 1);
        assert_eq!(p[1].series[0].color, "gray");
        assert_eq!(standard().title(), "NYT COVID Data - Utah");
    }

    #[test]
    fn test_hospitalization_panels() {
        let h = HospitalizationPlot {
            location: "NY".to_string(),
            x: dates(5),
            hospitalized: vec![1., 2., 4., 4., 3.],
            icu: vec![0., 1., 1., 2., 2.],
            smoothing: Smoothing::None,
        };
        let p = h.panels().unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p[2].style, PanelStyle::Lines);
        assert_eq!(p[3].series[0].values, vec![1., 2., 0., -1.]);
        for panel in p.iter() {
            panel.validate().unwrap();
        }
    }

    #[test]
    fn test_estimated_infections_panel() {
        let x = dates(2);
        let f = SinglePanel::estimated_infections("Orange", &x, &InfectionModel::default(), &[0., 0.25], &[10., 10.], Smoothing::None)
            .unwrap();
        assert_eq!(f.panel.series[0].values, vec![25., 105.]);
        assert_eq!(f.grid(), (1, 1));
        assert!(SinglePanel::estimated_infections("Orange", &x, &InfectionModel::default(), &[0.], &[10., 10.], Smoothing::None).is_err());
    }

    #[test]
    fn test_output_format_and_path() {
        assert_eq!("SVG".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert!("pdf".parse::<OutputFormat>().is_err());
        let p = figure_path(Path::new("out"), "utah", "standard", OutputFormat::Png);
        assert_eq!(p, Path::new("out").join("utah_standard.png"));
    }

    #[test]
    fn test_render_standard_svg() {
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("utah_standard.svg");
        render_figure(&standard(), &fout, (1200, 800)).unwrap();
        let svg = std::fs::read_to_string(&fout).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Utah"));
    }

    #[test]
    fn test_render_standard_png() {
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("utah_standard.png");
        render_figure(&standard(), &fout, (600, 400)).unwrap();
        let bytes = std::fs::read(&fout).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_two_days_leaves_second_derivative_blank() {
        let two_days = StandardPlot {
            x: dates(2),
            cases: vec![1., 3.],
            deaths: vec![0., 0.],
            ..standard()
        };
        let p = two_days.panels().unwrap();
        assert_eq!(p[2].x.len(), 1);
        assert!(p[4].x.is_empty());
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("utah_standard.svg");
        render_figure(&two_days, &fout, (900, 600)).unwrap();
        let svg = std::fs::read_to_string(&fout).unwrap();
        assert!(svg.contains("2nd Deriv."));
    }

    #[test]
    fn test_failed_render_removes_file() {
        let mut bad = SinglePanel::test_positivity("Utah", &dates(3), &[0.1, 0.2, 0.3], Smoothing::None);
        bad.panel.series[0].color = "no such color".to_string();
        let dir = tempfile::tempdir().unwrap();
        let fout = dir.path().join("utah_positivity.svg");
        assert!(render_figure(&bad, &fout, (600, 400)).is_err());
        assert!(!fout.exists());
    }
}

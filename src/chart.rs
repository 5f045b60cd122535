//! Drawing of one panel: bars or lines with an optional smoothed overlay.

use crate::color::{named_color, smoothed_color};
use crate::min_and_max;
use crate::smooth::Smoothing;
use anyhow::{anyhow, ensure, Result};
use plotters::coord::Shift;
use plotters::prelude::*;

pub const TITLE_FONT_SIZE: u32 = 18;
pub const AXIS_FONT_SIZE: u32 = 16;
pub const TICK_FONT_SIZE: u32 = 13;
/// one x label every X_TICK_STEPS days
pub const X_TICK_STEPS: usize = 10;
/// fraction of the day slot covered by a bar
const BAR_WIDTH: f64 = 0.8;

/// One y series of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// CSS color name, see [`crate::color::named_color`]
    pub color: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(label: &str, color: &str, values: Vec<f64>) -> Series {
        Series {
            label: label.to_string(),
            color: color.to_string(),
            values,
        }
    }
}

/// How the series of a panel are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelStyle {
    Bars,
    Lines,
}

/// Everything needed to draw one sub-plot.
/// All the series share the x values, one value per day.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x: Vec<String>,
    pub series: Vec<Series>,
    pub xlabel: String,
    pub ylabel: String,
    pub smoothing: Smoothing,
    pub style: PanelStyle,
}

impl Default for Panel {
    fn default() -> Self {
        Panel {
            title: String::new(),
            x: Vec::new(),
            series: Vec::new(),
            xlabel: "date".to_string(),
            ylabel: String::new(),
            smoothing: Smoothing::default(),
            style: PanelStyle::Bars,
        }
    }
}

impl Panel {
    /// every series must have one value for each x
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.x.is_empty(), "panel '{}' has no x values", self.title);
        for s in self.series.iter() {
            ensure!(
                s.values.len() == self.x.len(),
                "series '{}' of panel '{}' has {} values for {} x values",
                s.label,
                self.title,
                s.values.len(),
                self.x.len()
            );
        }
        Ok(())
    }
}

struct Layer {
    label: String,
    color: RGBColor,
    values: Vec<f64>,
    smooth: Option<(Vec<usize>, Vec<f64>, RGBColor)>,
}

fn resolve(name: &str) -> Result<RGBColor> {
    named_color(name).ok_or_else(|| anyhow!("unknown color '{}'", name))
}

fn layers(panel: &Panel, smoothing: Smoothing) -> Result<Vec<Layer>> {
    let index: Vec<usize> = (0..panel.x.len()).collect();
    let mut layers = Vec::with_capacity(panel.series.len());
    for s in panel.series.iter() {
        let color = resolve(&s.color)?;
        let smooth = match smoothing.apply(&index, &s.values)? {
            Some((sx, sy)) => Some((sx, sy, resolve(smoothed_color(&s.color))?)),
            None => None,
        };
        layers.push(Layer {
            label: s.label.clone(),
            color,
            values: s.values.clone(),
            smooth,
        });
    }
    Ok(layers)
}

/// y range over all the values, always including zero, with a 5% margin
fn y_range(layers: &[Layer]) -> (f64, f64) {
    let mut all: Vec<f64> = Vec::new();
    for l in layers.iter() {
        all.extend(l.values.iter().filter(|v| v.is_finite()));
        if let Some((_, sy, _)) = &l.smooth {
            all.extend(sy.iter().filter(|v| v.is_finite()));
        }
    }
    let (ymin, ymax) = min_and_max(&all[..]).unwrap_or((0., 1.));
    let (ymin, ymax) = (ymin.min(0.), ymax.max(0.));
    let yspan = if ymax > ymin { ymax - ymin } else { 1. };
    let ymin = if ymin < 0. { ymin - yspan / 20. } else { ymin };
    (ymin, ymax + yspan / 20.)
}

/// the date label of an x tick, empty between days
fn x_tick_label(x: &[String], v: f64) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0. {
        return String::new();
    }
    x.get(i as usize).cloned().unwrap_or_default()
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    layers: &[Layer],
    bars: bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = panel.x.len();
    let (ymin, ymax) = y_range(layers);
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), ymin..ymax)?;

    let tick = |v: &f64| x_tick_label(&panel.x, *v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).mix(0.4))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", TICK_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_FONT_SIZE))
        .x_labels(n / X_TICK_STEPS + 1)
        .x_label_formatter(&tick)
        .y_label_formatter(&|y: &f64| format!("{}", y))
        .x_desc(panel.xlabel.as_str())
        .y_desc(panel.ylabel.as_str())
        .draw()?;

    let half = BAR_WIDTH / 2.;
    for layer in layers.iter() {
        let color = layer.color;
        if bars {
            chart
                .draw_series(layer.values.iter().enumerate().map(|(i, &y)| {
                    let x = i as f64;
                    Rectangle::new([(x - half, 0.), (x + half, y)], color.filled())
                }))?
                .label(layer.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        } else {
            let points = layer.values.iter().enumerate().map(|(i, &y)| (i as f64, y));
            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                .label(layer.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2)));
            chart.draw_series(points.map(|p| Circle::new(p, 2, color.filled())))?;
        }
        // the smoothed line stays out of the legend
        if let Some((sx, sy, scolor)) = &layer.smooth {
            chart.draw_series(LineSeries::new(
                sx.iter().zip(sy.iter()).map(|(&i, &y)| (i as f64, y)),
                scolor.stroke_width(2),
            ))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", TICK_FONT_SIZE))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Draws every series as bars, and when the panel smoothing is not None
/// overlays each series' smoothed line in its companion color.
/// The caller has already checked that there is data to draw.
pub fn render_bars<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    panel.validate()?;
    let layers = layers(panel, panel.smoothing)?;
    draw_panel(area, panel, &layers, true)
}

/// Draws every series as a line with point markers, never smoothed.
pub fn render_lines<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    panel.validate()?;
    let layers = layers(panel, Smoothing::None)?;
    draw_panel(area, panel, &layers, false)
}

/// draws the panel with the renderer matching its style
pub fn render<DB>(area: &DrawingArea<DB, Shift>, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    match panel.style {
        PanelStyle::Bars => render_bars(area, panel),
        PanelStyle::Lines => render_lines(area, panel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(n: usize) -> Panel {
        Panel {
            title: "Utah cases".to_string(),
            x: (0..n).map(|i| format!("03/{:02}", i + 1)).collect(),
            series: vec![
                Series::new("cases", "lightcoral", (0..n).map(|i| i as f64).collect()),
                Series::new("deaths", "gray", vec![1.; n]),
            ],
            ylabel: "# of cases".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(panel(20).validate().is_ok());
        let mut p = panel(20);
        p.series[1].values.pop();
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("deaths"));
        assert!(panel(0).validate().is_err());
    }

    #[test]
    fn test_layers_colors_and_smoothing() {
        let p = panel(20);
        let l = layers(&p, p.smoothing).unwrap();
        assert_eq!(l.len(), 2);
        assert_eq!(l[0].color, RGBColor(240, 128, 128));
        let (sx, sy, sc) = l[0].smooth.as_ref().unwrap();
        assert_eq!(sx[0], 3);
        assert_eq!(sx.len(), sy.len());
        assert_eq!(*sc, named_color("crimson").unwrap());
        assert!(layers(&p, Smoothing::None).unwrap()[0].smooth.is_none());

        let mut bad = panel(20);
        bad.series[0].color = "no such color".to_string();
        assert!(layers(&bad, Smoothing::None).is_err());
    }

    #[test]
    fn test_y_range_includes_zero() {
        let mut p = panel(5);
        p.series = vec![Series::new("d", "gray", vec![-4., 2., 6., 1., 0.])];
        let (lo, hi) = y_range(&layers(&p, Smoothing::None).unwrap());
        assert!(lo < -4. && hi > 6.);
        p.series = vec![Series::new("d", "gray", vec![5., 5.])];
        p.x.truncate(2);
        let (lo, hi) = y_range(&layers(&p, Smoothing::None).unwrap());
        assert_eq!(lo, 0.);
        assert!(hi > 5.);
    }

    #[test]
    fn test_x_tick_label() {
        let x = vec!["03/01".to_string(), "03/02".to_string()];
        assert_eq!(x_tick_label(&x, 1.), "03/02");
        assert_eq!(x_tick_label(&x, 0.5), "");
        assert_eq!(x_tick_label(&x, -1.), "");
        assert_eq!(x_tick_label(&x, 7.), "");
    }

    #[test]
    fn test_render_rejects_misaligned_panel() {
        let mut p = panel(10);
        p.series[0].values.truncate(3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.svg");
        let root = SVGBackend::new(&path, (400, 300)).into_drawing_area();
        assert!(render_bars(&root, &p).is_err());
        assert!(render_lines(&root, &p).is_err());
    }
}

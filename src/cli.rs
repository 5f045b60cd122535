use super::VERSION;
use crate::pipeline::PlotConfig;
use crate::smooth::{SavitzkyGolay, Smoothing};
use crate::source::cagov::{self, CaGov};
use crate::source::covidtracking::{self, CovidTracking};
use crate::source::nyt::{self, Nyt};
use crate::transform::InfectionModel;
use crate::Region;
use anyhow::{anyhow, Result};
use clap::{App, Arg, ArgMatches};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sets up the stderr logger, RUST_LOG overrides the level.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn is_positive_int(v: String) -> Result<(), String> {
    match v.parse::<usize>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(format!("expected a positive integer, got {}", v)),
    }
}

fn is_int(v: String) -> Result<(), String> {
    v.parse::<usize>().map(|_| ()).map_err(|e| e.to_string())
}

fn is_float(v: String) -> Result<(), String> {
    v.parse::<f64>().map(|_| ()).map_err(|e| e.to_string())
}

/// the output and smoothing arguments of every app
fn plot_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    let arg_outdir = Arg::with_name("outdir")
        .help("directory for the figures")
        .short("o")
        .long("outdir")
        .takes_value(true)
        .default_value(".");
    let arg_format = Arg::with_name("format")
        .help("image format of the figures")
        .long("format")
        .takes_value(true)
        .possible_values(&["png", "svg"])
        .default_value("png");
    let arg_smoothing = Arg::with_name("smoothing")
        .help("smoothed line drawn over the bars")
        .long_help("none, avg (rolling average over --window days) or poly (Savitzky-Golay over --poly-window days)")
        .short("s")
        .long("smoothing")
        .takes_value(true)
        .possible_values(&["none", "avg", "poly"])
        .default_value("avg");
    let arg_window = Arg::with_name("window")
        .help("number of days of the rolling average")
        .short("w")
        .long("window")
        .takes_value(true)
        .validator(is_positive_int)
        .default_value("7");
    let arg_poly_window = Arg::with_name("poly_window")
        .help("number of days of the polynomial smoothing, odd")
        .long("poly-window")
        .takes_value(true)
        .validator(is_positive_int)
        .default_value("25");
    let arg_poly_order = Arg::with_name("poly_order")
        .help("degree of the polynomial smoothing")
        .long("poly-order")
        .takes_value(true)
        .validator(is_int)
        .default_value("2");
    let arg_prevalence_base = Arg::with_name("prevalence_base")
        .help("constant term of the prevalence ratio")
        .long("prevalence-base")
        .takes_value(true)
        .validator(is_float)
        .default_value("2.5");
    let arg_prevalence_scale = Arg::with_name("prevalence_scale")
        .help("coefficient of sqrt(test positivity) in the prevalence ratio")
        .long("prevalence-scale")
        .takes_value(true)
        .validator(is_float)
        .default_value("16");
    let arg_width = Arg::with_name("width")
        .help("width of the figures in pixels")
        .long("width")
        .takes_value(true)
        .validator(is_positive_int)
        .default_value("1200");
    let arg_height = Arg::with_name("height")
        .help("height of the figures in pixels")
        .long("height")
        .takes_value(true)
        .validator(is_positive_int)
        .default_value("800");
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    vec![
        arg_outdir,
        arg_format,
        arg_smoothing,
        arg_window,
        arg_poly_window,
        arg_poly_order,
        arg_prevalence_base,
        arg_prevalence_scale,
        arg_width,
        arg_height,
        arg_verbose,
    ]
}

fn value<T>(cli_args: &ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let v = cli_args
        .value_of(name)
        .ok_or_else(|| anyhow!("missing value for {}", name))?;
    v.parse::<T>()
        .map_err(|e| anyhow!("invalid value '{}' for {}: {}", v, name, e))
}

/// builds the PlotConfig from the arguments of [`plot_args`]
pub fn plot_config(cli_args: &ArgMatches) -> Result<PlotConfig> {
    let smoothing = match cli_args.value_of("smoothing").unwrap_or("avg") {
        "none" => Smoothing::None,
        "poly" => {
            let sg = SavitzkyGolay::new(value(cli_args, "poly_window")?, value(cli_args, "poly_order")?)?;
            Smoothing::Polynomial {
                window: sg.window(),
                order: sg.order(),
            }
        }
        _ => Smoothing::RollingAverage {
            window: value(cli_args, "window")?,
        },
    };
    Ok(PlotConfig {
        outdir: PathBuf::from(value::<String>(cli_args, "outdir")?),
        format: value(cli_args, "format")?,
        smoothing,
        infection: InfectionModel {
            base: value(cli_args, "prevalence_base")?,
            scale: value(cli_args, "prevalence_scale")?,
        },
        size: (value(cli_args, "width")?, value(cli_args, "height")?),
        verbose: cli_args.is_present("verbose"),
    })
}

pub fn nyt_app<'a, 'b>() -> App<'a, 'b> {
    let arg_state = Arg::with_name("state")
        .help("name of the state, e.g. New York")
        .long("state")
        .takes_value(true)
        .required(true);
    let arg_county = Arg::with_name("county")
        .help("name of a county within the state")
        .long("county")
        .takes_value(true);
    let arg_states_csv = Arg::with_name("states_csv")
        .help("path or URL of us-states.csv")
        .long("states-csv")
        .takes_value(true)
        .default_value(nyt::DEFAULT_STATES_CSV);
    let arg_counties_csv = Arg::with_name("counties_csv")
        .help("path or URL of us-counties.csv")
        .long("counties-csv")
        .takes_value(true)
        .default_value(nyt::DEFAULT_COUNTIES_CSV);
    App::new("covid_nyt")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the NYT COVID-19 data of a state or county")
        .arg(arg_state)
        .arg(arg_county)
        .arg(arg_states_csv)
        .arg(arg_counties_csv)
        .args(&plot_args())
}

pub fn nyt_from_matches(cli_args: &ArgMatches) -> Result<(Region, Nyt, PlotConfig)> {
    let state: String = value(cli_args, "state")?;
    let region = match cli_args.value_of("county") {
        Some(c) => Region::county(&state, c),
        None => Region::state(&state),
    };
    let source = Nyt {
        states_csv: value(cli_args, "states_csv")?,
        counties_csv: value(cli_args, "counties_csv")?,
    };
    Ok((region, source, plot_config(cli_args)?))
}

/// Takes the CLI arguments of the NYT app.
pub fn parse_cli_nyt() -> Result<(Region, Nyt, PlotConfig)> {
    nyt_from_matches(&nyt_app().get_matches())
}

pub fn tracking_app<'a, 'b>() -> App<'a, 'b> {
    let arg_state = Arg::with_name("state")
        .help("postal code of the state, e.g. NY")
        .required(true)
        .index(1);
    let arg_csv = Arg::with_name("csv")
        .help("path or URL of state-daily.csv")
        .short("f")
        .long("csv")
        .takes_value(true)
        .default_value(covidtracking::DEFAULT_CSV);
    App::new("covid_tracking")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the COVID Tracking Project data of a state")
        .arg(arg_state)
        .arg(arg_csv)
        .args(&plot_args())
}

pub fn tracking_from_matches(cli_args: &ArgMatches) -> Result<(Region, CovidTracking, PlotConfig)> {
    let state: String = value(cli_args, "state")?;
    let source = CovidTracking {
        csv: value(cli_args, "csv")?,
    };
    Ok((Region::state(&state), source, plot_config(cli_args)?))
}

/// Takes the CLI arguments of the COVID Tracking Project app.
pub fn parse_cli_tracking() -> Result<(Region, CovidTracking, PlotConfig)> {
    tracking_from_matches(&tracking_app().get_matches())
}

pub fn ca_app<'a, 'b>() -> App<'a, 'b> {
    let arg_county = Arg::with_name("county")
        .help("name of the California county")
        .index(1)
        .default_value(cagov::DEFAULT_COUNTY);
    let arg_cases_csv = Arg::with_name("cases_csv")
        .help("path or URL of statewide_cases.csv")
        .long("cases-csv")
        .takes_value(true)
        .default_value(cagov::CASES_URL);
    let arg_hospitals_csv = Arg::with_name("hospitals_csv")
        .help("path or URL of hospitals_by_county.csv")
        .long("hospitals-csv")
        .takes_value(true)
        .default_value(cagov::HOSPITALS_URL);
    let arg_tests_csv = Arg::with_name("tests_csv")
        .help("path or URL of statewide_testing.csv")
        .long("tests-csv")
        .takes_value(true)
        .default_value(cagov::TESTS_URL);
    App::new("covid_ca")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the data.ca.gov COVID-19 data of a California county")
        .arg(arg_county)
        .arg(arg_cases_csv)
        .arg(arg_hospitals_csv)
        .arg(arg_tests_csv)
        .args(&plot_args())
}

pub fn ca_from_matches(cli_args: &ArgMatches) -> Result<(Region, CaGov, PlotConfig)> {
    let county: String = value(cli_args, "county")?;
    let source = CaGov {
        cases_csv: value(cli_args, "cases_csv")?,
        hospitals_csv: value(cli_args, "hospitals_csv")?,
        tests_csv: value(cli_args, "tests_csv")?,
    };
    Ok((Region::county("California", &county), source, plot_config(cli_args)?))
}

/// Takes the CLI arguments of the California app.
pub fn parse_cli_ca() -> Result<(Region, CaGov, PlotConfig)> {
    ca_from_matches(&ca_app().get_matches())
}

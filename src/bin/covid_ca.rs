use covid_plots::cli::{init_tracing, parse_cli_ca};
use covid_plots::pipeline::plot_region;

fn main() -> anyhow::Result<()> {
    let (region, source, config) = parse_cli_ca()?;
    init_tracing(config.verbose);
    match plot_region(&source, &region, &config)? {
        Some(files) => {
            for f in files {
                println!("saved {}", f.display());
            }
        }
        None => println!("no data found for {}", region),
    }
    Ok(())
}

//! ITCZ Locator - Seasonal ITCZ Latitude Detection & Chart Rendering
//!
//! Reads gridded monthly precipitation, finds the latitude of maximum
//! seasonal rainfall for DJF and JJA, and renders a zonal-mean profile and
//! a rainfall map with the ITCZ curve for each season.
//!
//! Usage: `itcz_locator [INPUT.nc | CONFIG.json]`

mod charts;
mod config;
mod data;
mod stats;

use anyhow::{Context, Result};
use charts::{RenderError, StaticChartRenderer};
use config::ItczConfig;
use data::{DataLoader, ItczExporter, PrecipGrid, Season};
use stats::{ItczAnalysis, ItczReport};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config_from_args(std::env::args().nth(1))?;
    let (grid, report) = run(&config)?;

    for season in Season::ALL {
        println!(" {} ITCZ Latitude: {}", season, report.profile(season).itcz_lat);
    }
    println!("{:?}", grid.lon);

    let charts = render(&config, &report)?;

    if config.export {
        export(&config, &report)?;
    }

    if config.show {
        show_all(&charts, StaticChartRenderer::show);
    }

    Ok(())
}

/// A `.json` argument is a config file; anything else replaces the input path.
fn config_from_args(arg: Option<String>) -> Result<ItczConfig> {
    let config = match arg {
        Some(arg) if arg.ends_with(".json") => ItczConfig::from_json_file(Path::new(&arg))
            .with_context(|| format!("Loading config {}", arg))?,
        Some(arg) => ItczConfig {
            input: PathBuf::from(arg),
            ..Default::default()
        },
        None => ItczConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(config: &ItczConfig) -> Result<(PrecipGrid, ItczReport)> {
    let grid = DataLoader::load(&config.input, &config.load_options())
        .with_context(|| format!("Loading {}", config.input.display()))?;
    let settings = config.analysis_settings()?;

    let report = ItczAnalysis::run(&grid, &settings).context("ITCZ detection failed")?;
    for season in Season::ALL {
        let map = report.map(season);
        log::info!(
            "{}: {} timesteps, ITCZ spans {:.2}..{:.2} across {} longitudes",
            season,
            map.n_steps,
            map.itcz_lat.iter().copied().fold(f64::INFINITY, f64::min),
            map.itcz_lat.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            map.lon.len()
        );
    }
    log::debug!("Reprojected longitudes: {:?}", report.djf_map.lon);
    Ok((grid, report))
}

/// Writes every chart to `output_dir` and returns their paths.
fn render(config: &ItczConfig, report: &ItczReport) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Creating {}", config.output_dir.display()))?;

    let mut written = Vec::with_capacity(2 * Season::ALL.len());
    for season in Season::ALL {
        let tag = season.label().to_ascii_lowercase();

        let profile =
            StaticChartRenderer::render_profile(report.profile(season), config.profile_size)?;
        let profile_path = config.output_dir.join(format!("profile_{}.png", tag));
        StaticChartRenderer::save_png(&profile, &profile_path)?;

        let map = StaticChartRenderer::render_map(
            report.map(season),
            config.map_size,
            config.contour_levels,
        )?;
        let map_path = config.output_dir.join(format!("map_{}.png", tag));
        StaticChartRenderer::save_png(&map, &map_path)?;

        written.push(profile_path);
        written.push(map_path);
    }
    Ok(written)
}

/// Opens each chart in turn; a viewer that fails to launch is only reported.
fn show_all<F>(paths: &[PathBuf], open: F) -> usize
where
    F: Fn(&Path) -> Result<(), RenderError>,
{
    let mut opened = 0;
    for path in paths {
        match open(path) {
            Ok(()) => opened += 1,
            Err(e) => log::warn!("Could not open {}: {}", path.display(), e),
        }
    }
    opened
}

fn export(config: &ItczConfig, report: &ItczReport) -> Result<()> {
    ItczExporter::write_curve_csv(
        &report.djf_map,
        &report.jja_map,
        &config.output_dir.join("itcz_curve.csv"),
    )?;
    ItczExporter::write_summary_json(report, &config.output_dir.join("itcz_summary.json"))?;
    Ok(())
}

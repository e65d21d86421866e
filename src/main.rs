use std::path::Path;

use clap::Parser;
use cli::{Command, DownloadArgs, MapArgs, PanelsArgs, StyleArgs, SummarizeArgs, SyntheticArgs};
use hypomap::catalog::{read_catalog, write_catalog_csv, Hypocenter};
use hypomap::constant::PANEL_SIZE;
use hypomap::fdsn::{download, DownloadConfig, FdsnClient};
use hypomap::geo::Extent;
use hypomap::map::{data_extent, render_map, render_panels, MapBackend, MapConfig, Panel};
use hypomap::prelude::*;
use hypomap::station::{read_station_table, Station};
use hypomap::summary::write_summary;
use hypomap::synthetic::{generate, perturb, SyntheticConfig};
use log::{info, warn};
mod cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::Args::parse();

    let result = match args.command {
        Command::Download(args) => run_download(args),
        Command::Summarize(args) => run_summarize(args),
        Command::Synthetic(args) => run_synthetic(args),
        Command::Map(args) => run_map(args),
        Command::Panels(args) => run_panels(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_download(args: DownloadArgs) -> Result<()> {
    let mut config = DownloadConfig::new(args.out_dir, args.start, args.end);
    config.min_magnitude = args.min_mag;
    config.max_magnitude = args.max_mag;
    config.radius_km = args.radius_km;
    config.pre_s = args.pre;
    config.length_s = args.length;

    let client = FdsnClient::new(&args.base_url);
    let report = download(&client, &config)?;
    info!(
        "event {}: {} stations, {} waveforms saved, {} failed",
        report.event.id,
        report.stations.len(),
        report.saved.len(),
        report.failed.len()
    );
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<()> {
    write_summary(&args.dat_dir, &args.output, args.force)?;
    Ok(())
}

fn run_synthetic(args: SyntheticArgs) -> Result<()> {
    let mut config = SyntheticConfig::default();
    if !args.centers.is_empty() {
        config.centers = args.centers;
    }
    config.dh = args.dh;
    config.dv = args.dv;
    config.events = match args.events[..] {
        [lat, lon, dep] => [lat, lon, dep],
        _ => return Err(Error::InvalidInput("--events takes three counts".to_owned())),
    };

    let mut catalog = generate(&config)?;
    if let Some(loc_err) = args.perturb {
        catalog = perturb(&catalog, loc_err, args.seed)?;
    }
    write_catalog_csv(&args.output, &catalog)?;
    info!("wrote {} events to {}", catalog.len(), args.output.display());
    Ok(())
}

fn run_map(args: MapArgs) -> Result<()> {
    let catalog = read_catalog(&args.catalog)?;
    let stations = read_station_table(&args.station)?;
    info!("{} events, {} stations", catalog.len(), stations.len());

    let mut config = map_config(&args.style, data_extent(&[catalog.as_slice()], &stations))?;
    config.title = args.title.unwrap_or_else(|| file_name(&args.catalog));
    let backend = backend(&args.style, &args.output);
    render_map(backend, &args.output, &config, &catalog, &stations)
}

fn run_panels(args: PanelsArgs) -> Result<()> {
    let mut panels = Vec::with_capacity(args.catalog.len());
    for (i, path) in args.catalog.iter().enumerate() {
        // a missing panel stays in the grid, empty
        let catalog = match read_catalog(path) {
            Ok(catalog) => catalog,
            Err(Error::MissingFile(path)) => {
                warn!("{} not found, plotting an empty panel", path.display());
                vec![]
            }
            Err(e) => return Err(e),
        };
        let title = args.title.get(i).cloned().unwrap_or_else(|| file_name(path));
        panels.push(Panel { title, catalog });
    }
    let stations: Vec<Station> = match &args.station {
        Some(path) => read_station_table(path)?,
        None => vec![],
    };

    let catalogs: Vec<&[Hypocenter]> = panels.iter().map(|p| p.catalog.as_slice()).collect();
    let mut config = map_config(&args.style, data_extent(&catalogs, &stations))?;
    let cols = args.cols.clamp(1, panels.len().max(1));
    let rows = (panels.len() + cols - 1) / cols;
    config.size = (PANEL_SIZE.0 * cols as u32, PANEL_SIZE.1 * rows as u32);

    let backend = backend(&args.style, &args.output);
    render_panels(backend, &args.output, &config, &panels, &stations, cols)
}

/// Explicit ranges override the aggregated extent axis by axis.
fn map_config(style: &StyleArgs, aggregated: Extent) -> Result<MapConfig> {
    let mut extent = aggregated;
    if let Some((min, max)) = style.lat_range.as_deref().and_then(pair) {
        extent.lat_min = min.min(max);
        extent.lat_max = min.max(max);
    }
    if let Some((min, max)) = style.lon_range.as_deref().and_then(pair) {
        extent.lon_min = min.min(max);
        extent.lon_max = min.max(max);
    }

    let (depth_min, depth_max) = pair(&style.depth_range)
        .ok_or_else(|| Error::InvalidInput("--depth-range takes two values".to_owned()))?;
    let mut config = MapConfig::new(extent);
    config.depth_range = depth_min..depth_max;
    config.center_depth = style.center.unwrap_or((depth_min + depth_max) / 2.0);
    config.palette = style.palette.into();
    config.color_by = style.color_by.into();
    config.error_bars = style.error_bars;
    // fail before any file is written
    config.mapper()?;
    Ok(config)
}

fn pair(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        &[a, b] => Some((a, b)),
        _ => None,
    }
}

fn backend(style: &StyleArgs, output: &Path) -> MapBackend {
    style
        .backend
        .map(MapBackend::from)
        .or_else(|| MapBackend::from_path(output))
        .unwrap_or(MapBackend::Png)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use hypomap::color::Palette;
use hypomap::constant::FDSN_BASE_URL;
use hypomap::map::{ColorBy, MapBackend};

/// Seismic catalog tools: download, summarize, synthesize and map hypocenters
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download stations and waveforms of the best covered event from an FDSN data center
    Download(DownloadArgs),
    /// Summarize per-event inversion files into a catalog list
    Summarize(SummarizeArgs),
    /// Write a synthetic test catalog of REF rings and SYN grids
    Synthetic(SyntheticArgs),
    /// Plot one catalog and a station table on a map
    Map(MapArgs),
    /// Plot several catalogs side by side on one shared extent
    Panels(PanelsArgs),
}

#[derive(ClapArgs)]
pub(crate) struct DownloadArgs {
    /// Output directory for station.tbl, stations.csv and waveforms
    #[arg(long, default_value = "demo_event")]
    pub(crate) out_dir: PathBuf,
    /// Start of the event search window (YYYY-MM-DD or full timestamp)
    #[arg(long, default_value = "2025-06-01", value_parser = parse_datetime)]
    pub(crate) start: NaiveDateTime,
    /// End of the event search window
    #[arg(long, default_value = "2025-12-31", value_parser = parse_datetime)]
    pub(crate) end: NaiveDateTime,
    #[arg(long, default_value_t = 2.9)]
    pub(crate) min_mag: f64,
    #[arg(long, default_value_t = 3.1)]
    pub(crate) max_mag: f64,
    /// Station search radius around the event
    #[arg(long, default_value_t = 50.0)]
    pub(crate) radius_km: f64,
    /// Seconds of waveform before the origin time
    #[arg(long, default_value_t = 20)]
    pub(crate) pre: i64,
    /// Seconds of waveform after the origin time
    #[arg(long, default_value_t = 180)]
    pub(crate) length: i64,
    #[arg(long, default_value = FDSN_BASE_URL)]
    pub(crate) base_url: String,
}

#[derive(ClapArgs)]
pub(crate) struct SummarizeArgs {
    /// Directory of dat files
    #[arg(short, long)]
    pub(crate) dat_dir: PathBuf,
    #[arg(short, long, default_value = "catalog.list")]
    pub(crate) output: PathBuf,
    /// Overwrite an existing output file
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(ClapArgs)]
pub(crate) struct SyntheticArgs {
    #[arg(short, long, default_value = "catalog_syn.csv")]
    pub(crate) output: PathBuf,
    /// Grid center as LAT,LON,DEP; repeat for several grids
    #[arg(long = "center", value_parser = parse_center, allow_hyphen_values = true)]
    pub(crate) centers: Vec<(f64, f64, f64)>,
    /// Grid spacing in degrees
    #[arg(long, default_value_t = 0.027)]
    pub(crate) dh: f64,
    /// Grid cells along latitude, longitude and depth
    #[arg(long, num_args = 3, value_names = ["LAT", "LON", "DEP"], default_values_t = [5, 5, 1])]
    pub(crate) events: Vec<usize>,
    /// Depth spacing in km
    #[arg(long, default_value_t = 0.0)]
    pub(crate) dv: f64,
    /// Standard deviation in degrees of the location noise added to SYN events
    #[arg(long)]
    pub(crate) perturb: Option<f64>,
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,
}

#[derive(ClapArgs)]
pub(crate) struct MapArgs {
    /// Catalog file (.csv with header, anything else as a catalog list)
    #[arg(long, default_value = "./catalog_ground_truth.csv")]
    pub(crate) catalog: PathBuf,
    #[arg(long, default_value = "./station.tbl")]
    pub(crate) station: PathBuf,
    #[arg(long, default_value = "catalog_map.png")]
    pub(crate) output: PathBuf,
    #[command(flatten)]
    pub(crate) style: StyleArgs,
    /// Map title, defaults to the catalog file name
    #[arg(long)]
    pub(crate) title: Option<String>,
}

#[derive(ClapArgs)]
pub(crate) struct PanelsArgs {
    /// Catalog of each panel, in row-major order
    #[arg(long, num_args = 1.., required = true)]
    pub(crate) catalog: Vec<PathBuf>,
    /// Panel titles, defaults to the catalog file names
    #[arg(long, num_args = 1..)]
    pub(crate) title: Vec<String>,
    #[arg(long)]
    pub(crate) station: Option<PathBuf>,
    #[arg(long, default_value = "map_panels.png")]
    pub(crate) output: PathBuf,
    #[arg(long, default_value_t = 3)]
    pub(crate) cols: usize,
    #[command(flatten)]
    pub(crate) style: StyleArgs,
}

#[derive(ClapArgs)]
pub(crate) struct StyleArgs {
    /// Drawing backend, guessed from the output extension when omitted
    #[arg(long, value_enum)]
    pub(crate) backend: Option<Backend>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub(crate) lat_range: Option<Vec<f64>>,
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub(crate) lon_range: Option<Vec<f64>>,
    /// Depth range of the color scale in km
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [10.0, 20.0])]
    pub(crate) depth_range: Vec<f64>,
    /// Depth in km at the middle of the color scale, defaults to the middle of the range
    #[arg(long)]
    pub(crate) center: Option<f64>,
    #[arg(long, value_enum, default_value_t = PaletteArg::Coolwarm)]
    pub(crate) palette: PaletteArg,
    #[arg(long, value_enum, default_value_t = ColorByArg::Depth)]
    pub(crate) color_by: ColorByArg,
    /// Draw location error bars from the elat/elon columns, in km
    #[arg(long)]
    pub(crate) error_bars: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq)]
pub(crate) enum Backend {
    /// PNG image
    Png,
    /// SVG image
    Svg,
    /// GMT script
    Gmt,
}

impl From<Backend> for MapBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Png => MapBackend::Png,
            Backend::Svg => MapBackend::Svg,
            Backend::Gmt => MapBackend::Gmt,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq)]
pub(crate) enum PaletteArg {
    /// Blue to red through grey
    Coolwarm,
    /// Dark blue through cyan and yellow to dark red
    Gnuplot,
}

impl From<PaletteArg> for Palette {
    fn from(palette: PaletteArg) -> Self {
        match palette {
            PaletteArg::Coolwarm => Palette::CoolWarm,
            PaletteArg::Gnuplot => Palette::Gnuplot,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq)]
pub(crate) enum ColorByArg {
    Depth,
    /// Cluster id
    Cluster,
}

impl From<ColorByArg> for ColorBy {
    fn from(color_by: ColorByArg) -> Self {
        match color_by {
            ColorByArg::Depth => ColorBy::Depth,
            ColorByArg::Cluster => ColorBy::Cluster,
        }
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid date {}", s));
    }
    hypomap::catalog::parse_time(s).map_err(|e| format!("{}: {}", s, e))
}

fn parse_center(s: &str) -> Result<(f64, f64, f64), String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{}: {}", v, e)))
        .collect::<Result<Vec<f64>, String>>()?;
    match values[..] {
        [lat, lon, dep] => Ok((lat, lon, dep)),
        _ => Err(format!("expected LAT,LON,DEP, got {}", s)),
    }
}

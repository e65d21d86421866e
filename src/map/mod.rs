mod chart;
mod gmt;

use std::path::Path;

use log::info;
use plotters::prelude::{BitMapBackend, IntoDrawingArea, SVGBackend};

use crate::catalog::{Hypocenter, Method};
use crate::color::{to_rgb8, DepthColorMapper, Palette};
use crate::constant::{
    DEFAULT_CENTER_DEPTH_KM, DEFAULT_DEPTH_RANGE, DEFAULT_EXTENT, EXTENT_MARGIN_DEG, KM_PER_DEGREE,
    MAP_SIZE,
};
use crate::geo::{Extent, Point};
use crate::prelude::*;
use crate::station::Station;

/// Where a map goes. Each variant is a different drawing toolchain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MapBackend {
    /// Raster image drawn with plotters.
    Png,
    /// Vector image drawn with plotters.
    Svg,
    /// GMT 6 shell script with its palette and data files, run separately.
    Gmt,
}

impl MapBackend {
    /// Backend implied by an output file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(MapBackend::Png),
            "svg" => Some(MapBackend::Svg),
            "sh" | "gmt" => Some(MapBackend::Gmt),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColorBy {
    Depth,
    Cluster,
}

#[derive(Debug, Clone)]
pub struct MapConfig {
    pub extent: Extent,
    pub depth_range: std::ops::Range<f64>,
    pub center_depth: f64,
    pub palette: Palette,
    pub color_by: ColorBy,
    pub title: String,
    pub size: (u32, u32),
    /// Draw `elat`/`elon` error bars, read as km, under the markers.
    pub error_bars: bool,
}

impl MapConfig {
    pub fn new(extent: Extent) -> Self {
        MapConfig {
            extent,
            depth_range: DEFAULT_DEPTH_RANGE,
            center_depth: DEFAULT_CENTER_DEPTH_KM,
            palette: Palette::CoolWarm,
            color_by: ColorBy::Depth,
            title: String::new(),
            size: MAP_SIZE,
            error_bars: false,
        }
    }

    pub fn mapper(&self) -> Result<DepthColorMapper> {
        DepthColorMapper::new(self.depth_range.clone(), self.center_depth, self.palette.ramp())
    }
}

/// Frame around every catalog and the stations, padded by the default margin.
pub fn data_extent(catalogs: &[&[Hypocenter]], stations: &[Station]) -> Extent {
    let mut sets: Vec<Vec<Point>> = catalogs
        .iter()
        .map(|catalog| catalog.iter().map(Hypocenter::point).collect())
        .collect();
    sets.push(stations.iter().map(Station::point).collect());
    Extent::aggregate(sets, EXTENT_MARGIN_DEG, DEFAULT_EXTENT)
}

/// One map of a figure.
#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub catalog: Vec<Hypocenter>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Marker {
    Circle,
    Square,
}

pub(crate) fn marker(method: &Method) -> Marker {
    match method {
        Method::Ref => Marker::Square,
        Method::Syn | Method::Trd | Method::Other(_) => Marker::Circle,
    }
}

/// Half lengths in degrees `(lon, lat)` of the error bars of `h`, if it has any.
pub(crate) fn error_bar(h: &Hypocenter) -> Option<(f64, f64)> {
    let valid = |e: f64| e.is_finite() && e > 0.0;
    if !valid(h.elat) && !valid(h.elon) {
        return None;
    }
    let km = |e: f64| if valid(e) { e } else { 0.0 };
    let d_lat = km(h.elat) / KM_PER_DEGREE;
    let d_lon = km(h.elon) / (KM_PER_DEGREE * h.lat.to_radians().cos());
    Some((d_lon, d_lat))
}

pub(crate) fn point_color(config: &MapConfig, mapper: &DepthColorMapper, h: &Hypocenter) -> (u8, u8, u8) {
    match config.color_by {
        ColorBy::Depth => to_rgb8(mapper.color(h.dep)),
        ColorBy::Cluster => cluster_color(h.cid),
    }
}

pub(crate) fn cluster_color(cid: Option<i64>) -> (u8, u8, u8) {
    use plotters::style::{Color, Palette as _, Palette99};
    match cid {
        Some(cid) if cid >= 0 => Palette99::pick(cid as usize).to_backend_color().rgb,
        _ => (128, 128, 128),
    }
}

/// Renders a single map of `catalog` and `stations` titled with `config.title`.
pub fn render_map(
    backend: MapBackend,
    path: &Path,
    config: &MapConfig,
    catalog: &[Hypocenter],
    stations: &[Station],
) -> Result<()> {
    let panel = Panel {
        title: config.title.clone(),
        catalog: catalog.to_vec(),
    };
    render_panels(backend, path, config, &[panel], stations, 1)
}

/// Renders `panels` in a grid of `cols` columns sharing one extent, one depth scale
/// and the same stations.
pub fn render_panels(
    backend: MapBackend,
    path: &Path,
    config: &MapConfig,
    panels: &[Panel],
    stations: &[Station],
    cols: usize,
) -> Result<()> {
    if panels.is_empty() {
        return Err(Error::InvalidInput("nothing to plot".to_owned()));
    }
    let mapper = config.mapper()?;
    let cols = cols.clamp(1, panels.len());

    match backend {
        MapBackend::Png => {
            let root = BitMapBackend::new(path, config.size).into_drawing_area();
            chart::draw_figure(&root, config, panels, stations, cols, &mapper)?;
        }
        MapBackend::Svg => {
            let root = SVGBackend::new(path, config.size).into_drawing_area();
            chart::draw_figure(&root, config, panels, stations, cols, &mapper)?;
        }
        MapBackend::Gmt => gmt::write_script(path, config, panels, stations, cols, &mapper)?,
    }
    info!("map saved to {}", path.display());
    Ok(())
}

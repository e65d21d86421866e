use std::f64::consts::PI;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::catalog::{Hypocenter, Method};
use crate::constant::{DAT_FILE_NAME_FORMAT, KM_PER_DEGREE};
use crate::prelude::*;

/// Layout of the synthetic test catalog.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// `(lat, lon, dep)` of every grid center.
    pub centers: Vec<(f64, f64, f64)>,
    /// Horizontal grid spacing in degrees.
    pub dh: f64,
    /// Vertical grid spacing in km.
    pub dv: f64,
    /// Grid cells along latitude, longitude and depth.
    pub events: [usize; 3],
    pub num_ref: usize,
    pub start_time: NaiveDateTime,
    pub time_step: Duration,
    /// Directory prefix written into the `file` column.
    pub data_dir: String,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            centers: vec![(39.8, 143.3, 20.0), (39.8, 143.6, 20.0)],
            // about 3 km
            dh: 0.027,
            dv: 0.0,
            events: [5, 5, 1],
            num_ref: 10,
            start_time: NaiveDate::from_ymd_opt(2000, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            time_step: Duration::hours(1),
            data_dir: "./dat-syn".to_owned(),
        }
    }
}

/// Builds the synthetic catalog: for every center a ring of REF events followed by a
/// grid of SYN events. Event `k` is stamped `start_time + k * time_step`.
pub fn generate(config: &SyntheticConfig) -> Result<Vec<Hypocenter>> {
    if !(config.dh > 0.0) {
        return Err(Error::InvalidInput(format!("grid spacing dh must be positive, got {}", config.dh)));
    }
    let mut catalog = Vec::new();
    for &center in config.centers.iter() {
        for (lat, lon, dep) in ref_ring(config, center) {
            catalog.push(event(config, catalog.len(), lat, lon, dep, Method::Ref));
        }
        for (lat, lon, dep) in syn_grid(config, center) {
            catalog.push(event(config, catalog.len(), lat, lon, dep, Method::Syn));
        }
    }
    if let (Some(first), Some(last)) = (catalog.first(), catalog.last()) {
        info!(
            "generated {} synthetic events from {} to {}",
            catalog.len(),
            first.time,
            last.time
        );
    }
    Ok(catalog)
}

fn event(config: &SyntheticConfig, index: usize, lat: f64, lon: f64, dep: f64, method: Method) -> Hypocenter {
    let time = config.start_time + config.time_step * index as i32;
    Hypocenter {
        time,
        lat,
        lon,
        dep,
        elat: 0.0,
        elon: 0.0,
        edep: 0.0,
        res: 0.0,
        file: format!("{}/{}", config.data_dir, time.format(DAT_FILE_NAME_FORMAT)),
        method,
        cid: Some(0),
    }
}

/// REF events evenly spaced on a circle just outside the SYN grid.
fn ref_ring(config: &SyntheticConfig, (lat_c, lon_c, dep_c): (f64, f64, f64)) -> Vec<(f64, f64, f64)> {
    let radius = config.dh * (config.events[0] as f64 / 2.0 + 1.0);
    (0..config.num_ref)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / config.num_ref as f64;
            let lat = lat_c + radius * angle.cos();
            let lon = lon_c + radius * angle.sin() / lat_c.to_radians().cos();
            (lat, lon, dep_c)
        })
        .collect()
}

fn syn_grid(config: &SyntheticConfig, (lat_c, lon_c, dep_c): (f64, f64, f64)) -> Vec<(f64, f64, f64)> {
    let half_lat = config.dh * config.events[0] as f64 / 2.0;
    let half_lon = config.dh * config.events[1] as f64 / 2.0;
    let lats = arange(lat_c - half_lat, lat_c + half_lat + config.dh / 2.0, config.dh);
    let lons = arange(lon_c - half_lon, lon_c + half_lon + config.dh / 2.0, config.dh);
    let layers = config.events[2].max(1);
    let deps: Vec<f64> = (0..layers)
        .map(|j| dep_c + (j as f64 - (layers - 1) as f64 / 2.0) * config.dv)
        .collect();

    let mut grid = Vec::with_capacity(lats.len() * lons.len() * deps.len());
    for &lat in lats.iter() {
        for &lon in lons.iter() {
            for &dep in deps.iter() {
                grid.push((lat, lon, dep));
            }
        }
    }
    grid
}

/// Values `start, start + step, ...` strictly below `stop`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Copies `catalog` with gaussian location noise of `loc_err` degrees on every non-REF
/// row. Longitude noise is widened by `1 / cos(lat)` of the original latitude and depth
/// noise is converted to km.
pub fn perturb(catalog: &[Hypocenter], loc_err: f64, seed: u64) -> Result<Vec<Hypocenter>> {
    let noise = Normal::new(0.0, loc_err)
        .map_err(|e| Error::InvalidInput(format!("location error {}: {}", loc_err, e)))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let perturbed = catalog
        .iter()
        .map(|h| {
            let mut h = h.clone();
            if h.method != Method::Ref {
                let cos_lat = h.lat.to_radians().cos();
                h.lat += noise.sample(&mut rng);
                h.lon += noise.sample(&mut rng) / cos_lat;
                h.dep += noise.sample(&mut rng) * KM_PER_DEGREE;
            }
            h
        })
        .collect();
    Ok(perturbed)
}

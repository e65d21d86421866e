use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};

use crate::constant::{FDSN_CHANNELS, KM_PER_DEGREE, STATION_WINDOW_S};
use crate::geo::{distance_azimuth, Point};
use crate::prelude::*;
use crate::station::{write_station_table, Station};

use super::{DataCenter, Event, EventQuery, StationInfo, StationQuery, WaveformQuery};

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub out_dir: PathBuf,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub radius_km: f64,
    /// Seconds of waveform before the origin time.
    pub pre_s: i64,
    /// Seconds of waveform after the origin time.
    pub length_s: i64,
    pub channel: String,
}

impl DownloadConfig {
    pub fn new(out_dir: impl Into<PathBuf>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DownloadConfig {
            out_dir: out_dir.into(),
            start,
            end,
            min_magnitude: 2.9,
            max_magnitude: 3.1,
            radius_km: 50.0,
            pre_s: 20,
            length_s: 180,
            channel: FDSN_CHANNELS.to_owned(),
        }
    }

    fn radius_deg(&self) -> f64 {
        self.radius_km / KM_PER_DEGREE
    }

    fn station_query(&self, event: &Event) -> StationQuery {
        StationQuery {
            lat: event.lat,
            lon: event.lon,
            max_radius_deg: self.radius_deg(),
            channel: self.channel.clone(),
            start: event.time - Duration::seconds(STATION_WINDOW_S.0),
            end: event.time + Duration::seconds(STATION_WINDOW_S.1),
        }
    }
}

/// A station seen from the selected event.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub info: StationInfo,
    pub distance_km: f64,
    pub azimuth_deg: f64,
    pub back_azimuth_deg: f64,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub event: Event,
    pub stations: Vec<StationRecord>,
    pub saved: Vec<PathBuf>,
    /// Station codes whose waveform request failed.
    pub failed: Vec<String>,
}

/// Picks the event with the densest station coverage in the configured window and
/// downloads its station table and waveforms into `config.out_dir`.
///
/// A station whose waveforms cannot be fetched is logged and skipped.
pub fn download(center: &dyn DataCenter, config: &DownloadConfig) -> Result<DownloadReport> {
    fs::create_dir_all(&config.out_dir)?;

    let events = center.events(&EventQuery {
        start: config.start,
        end: config.end,
        min_magnitude: config.min_magnitude,
        max_magnitude: config.max_magnitude,
    })?;
    info!("found {} events", events.len());

    let event = select_event(center, config, events)?;
    info!(
        "selected event {} at {} lat={:.3} lon={:.3} depth={:.1} km",
        event.id, event.time, event.lat, event.lon, event.depth_km
    );

    let stations = center.stations(&config.station_query(&event))?;
    info!("found {} stations", stations.len());
    let records = station_records(&event, stations);

    let table: Vec<Station> = records
        .iter()
        .map(|r| Station::from_elevation(&r.info.code(), r.info.lat, r.info.lon, r.info.elevation_m))
        .collect();
    let table_path = config.out_dir.join("station.tbl");
    write_station_table(&table_path, &table)?;
    info!("station table written to {}", table_path.display());
    let csv_path = config.out_dir.join("stations.csv");
    write_stations_csv(&csv_path, &records)?;
    info!("station csv written to {}", csv_path.display());

    let mut saved = Vec::new();
    let mut failed = Vec::new();
    for record in records.iter() {
        let query = WaveformQuery {
            network: record.info.network.clone(),
            station: record.info.station.clone(),
            location: "*".to_owned(),
            channel: config.channel.clone(),
            start: event.time - Duration::seconds(config.pre_s),
            end: event.time + Duration::seconds(config.length_s),
        };
        let path = config.out_dir.join(format!("{}.mseed", record.info.code()));
        match center
            .waveforms(&query)
            .and_then(|bytes| Ok(fs::write(&path, bytes)?))
        {
            Ok(()) => {
                info!("saved {}", path.display());
                saved.push(path);
            }
            Err(e) => {
                warn!("failed for {}: {}", record.info.code(), e);
                failed.push(record.info.code());
            }
        }
    }

    Ok(DownloadReport {
        event,
        stations: records,
        saved,
        failed,
    })
}

fn select_event(center: &dyn DataCenter, config: &DownloadConfig, events: Vec<Event>) -> Result<Event> {
    let total = events.len();
    let mut best: Option<(usize, Event)> = None;
    for (i, event) in events.into_iter().enumerate() {
        let count = match center.stations(&config.station_query(&event)) {
            Ok(stations) => stations.len(),
            Err(e) => {
                warn!("error checking event {}: {}", event.id, e);
                continue;
            }
        };
        if (i + 1) % 10 == 0 {
            info!("checked {}/{} events", i + 1, total);
        }
        // first event wins a tie
        if best.as_ref().map_or(true, |(n, _)| count > *n) {
            best = Some((count, event));
        }
    }
    best.map(|(_, event)| event)
        .ok_or_else(|| Error::NoData("no events with stations found".to_owned()))
}

fn station_records(event: &Event, stations: Vec<StationInfo>) -> Vec<StationRecord> {
    let origin = Point::new(event.lat, event.lon);
    let mut records: Vec<StationRecord> = stations
        .into_iter()
        .map(|info| {
            let (distance_km, azimuth_deg, back_azimuth_deg) =
                distance_azimuth(origin, Point::new(info.lat, info.lon));
            StationRecord {
                info,
                distance_km,
                azimuth_deg,
                back_azimuth_deg,
            }
        })
        .collect();
    records.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    records
}

pub fn write_stations_csv(path: &Path, records: &[StationRecord]) -> Result<()> {
    let text = |name: &str, value: fn(&StationRecord) -> &str| {
        Series::new(name, records.iter().map(value).collect::<Vec<&str>>())
    };
    let float = |name: &str, value: fn(&StationRecord) -> f64| {
        Series::new(name, records.iter().map(value).collect::<Vec<f64>>())
    };
    let mut df = DataFrame::new(vec![
        text("network", |r| r.info.network.as_str()),
        text("station", |r| r.info.station.as_str()),
        float("latitude", |r| r.info.lat),
        float("longitude", |r| r.info.lon),
        float("elevation_m", |r| r.info.elevation_m),
        float("distance_km", |r| r.distance_km),
        float("azimuth_deg", |r| r.azimuth_deg),
        float("backazimuth_deg", |r| r.back_azimuth_deg),
    ])?;

    let mut writer = BufWriter::new(File::create(path)?);
    CsvWriter::new(&mut writer).has_header(true).finish(&mut df)?;
    writer.flush()?;
    Ok(())
}

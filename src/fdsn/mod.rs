//! Event, station and waveform retrieval from an FDSN web data center.

mod client;
mod download;

pub use client::FdsnClient;
pub use download::{download, write_stations_csv, DownloadConfig, DownloadReport, StationRecord};

use chrono::NaiveDateTime;

use crate::catalog::parse_time;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub time: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    pub depth_km: f64,
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationInfo {
    pub network: String,
    pub station: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: f64,
}

impl StationInfo {
    pub fn code(&self) -> String {
        format!("{}.{}", self.network, self.station)
    }
}

#[derive(Debug, Clone)]
pub struct EventQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

#[derive(Debug, Clone)]
pub struct StationQuery {
    pub lat: f64,
    pub lon: f64,
    pub max_radius_deg: f64,
    pub channel: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct WaveformQuery {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A source of events, station metadata and waveforms.
pub trait DataCenter {
    fn events(&self, query: &EventQuery) -> Result<Vec<Event>>;
    fn stations(&self, query: &StationQuery) -> Result<Vec<StationInfo>>;
    /// Raw waveform bytes of every channel that matched.
    fn waveforms(&self, query: &WaveformQuery) -> Result<Vec<u8>>;
}

fn text_rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(i, line)| (i + 1, line.split('|').map(str::trim).collect()))
}

fn field_f64(fields: &[&str], index: usize, source: &str, line: usize) -> Result<f64> {
    let field = fields
        .get(index)
        .ok_or_else(|| Error::parse(source, line, format!("missing column {}", index + 1)))?;
    field
        .parse()
        .map_err(|e| Error::parse(source, line, format!("column {}: {}", index + 1, e)))
}

/// Parses an fdsnws-event `format=text` response.
///
/// Columns: `EventID|Time|Latitude|Longitude|Depth/km|Author|Catalog|Contributor|
/// ContributorID|MagType|Magnitude|MagAuthor|EventLocationName`.
pub fn parse_event_text(text: &str) -> Result<Vec<Event>> {
    text_rows(text)
        .map(|(line, fields)| {
            if fields.len() < 5 {
                return Err(Error::parse("fdsnws-event", line, "expected at least 5 columns"));
            }
            Ok(Event {
                id: fields[0].to_owned(),
                time: parse_time(fields[1])?,
                lat: field_f64(&fields, 2, "fdsnws-event", line)?,
                lon: field_f64(&fields, 3, "fdsnws-event", line)?,
                depth_km: field_f64(&fields, 4, "fdsnws-event", line)?,
                magnitude: fields.get(10).and_then(|m| m.parse().ok()),
            })
        })
        .collect()
}

/// Parses an fdsnws-station `format=text&level=station` response.
///
/// Columns: `Network|Station|Latitude|Longitude|Elevation|SiteName|StartTime|EndTime`.
pub fn parse_station_text(text: &str) -> Result<Vec<StationInfo>> {
    text_rows(text)
        .map(|(line, fields)| {
            if fields.len() < 5 {
                return Err(Error::parse("fdsnws-station", line, "expected at least 5 columns"));
            }
            Ok(StationInfo {
                network: fields[0].to_owned(),
                station: fields[1].to_owned(),
                lat: field_f64(&fields, 2, "fdsnws-station", line)?,
                lon: field_f64(&fields, 3, "fdsnws-station", line)?,
                elevation_m: field_f64(&fields, 4, "fdsnws-station", line)?,
            })
        })
        .collect()
}

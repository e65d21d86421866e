use chrono::NaiveDateTime;
use log::debug;

use crate::prelude::*;

use super::{
    parse_event_text, parse_station_text, DataCenter, Event, EventQuery, StationInfo, StationQuery,
    WaveformQuery,
};

const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Blocking client for the fdsnws event, station and dataselect services.
pub struct FdsnClient {
    base_url: String,
    agent: ureq::Agent,
}

impl FdsnClient {
    pub fn new(base_url: &str) -> Self {
        FdsnClient {
            base_url: base_url.trim_end_matches('/').to_owned(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// `None` when the service answered that nothing matched.
    fn query(&self, service: &str, params: &[(&str, String)]) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/fdsnws/{}/1/query", self.base_url, service);
        debug!("GET {} {:?}", url, params);

        let mut request = self.agent.get(&url);
        for (key, value) in params {
            request = request.query(*key, value);
        }
        let mut response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if response.status().as_u16() == 204 {
            return Ok(None);
        }
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        Ok(Some(body))
    }
}

fn time_param(time: &NaiveDateTime) -> String {
    time.format(QUERY_TIME_FORMAT).to_string()
}

impl DataCenter for FdsnClient {
    fn events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let params = [
            ("starttime", time_param(&query.start)),
            ("endtime", time_param(&query.end)),
            ("minmagnitude", query.min_magnitude.to_string()),
            ("maxmagnitude", query.max_magnitude.to_string()),
            ("format", "text".to_owned()),
        ];
        match self.query("event", &params)? {
            None => Ok(vec![]),
            Some(body) => parse_event_text(&String::from_utf8_lossy(&body)),
        }
    }

    fn stations(&self, query: &StationQuery) -> Result<Vec<StationInfo>> {
        let params = [
            ("latitude", query.lat.to_string()),
            ("longitude", query.lon.to_string()),
            ("maxradius", query.max_radius_deg.to_string()),
            ("channel", query.channel.clone()),
            ("starttime", time_param(&query.start)),
            ("endtime", time_param(&query.end)),
            ("level", "station".to_owned()),
            ("format", "text".to_owned()),
        ];
        match self.query("station", &params)? {
            None => Ok(vec![]),
            Some(body) => parse_station_text(&String::from_utf8_lossy(&body)),
        }
    }

    fn waveforms(&self, query: &WaveformQuery) -> Result<Vec<u8>> {
        let params = [
            ("network", query.network.clone()),
            ("station", query.station.clone()),
            ("location", query.location.clone()),
            ("channel", query.channel.clone()),
            ("starttime", time_param(&query.start)),
            ("endtime", time_param(&query.end)),
        ];
        match self.query("dataselect", &params)? {
            Some(body) if !body.is_empty() => Ok(body),
            _ => Err(Error::NoData(format!(
                "no data available for {}.{}",
                query.network, query.station
            ))),
        }
    }
}

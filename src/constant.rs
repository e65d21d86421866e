use crate::geo::Extent;

/// Padding added around the data when a map extent is aggregated.
pub const EXTENT_MARGIN_DEG: f64 = 0.1;
/// Map frame used when there is nothing to aggregate.
pub const DEFAULT_EXTENT: Extent = Extent {
    lat_min: 38.0,
    lat_max: 40.5,
    lon_min: 141.5,
    lon_max: 144.0,
};

pub const DEFAULT_DEPTH_RANGE: std::ops::Range<f64> = 10.0..30.0;
pub const DEFAULT_CENTER_DEPTH_KM: f64 = 20.0;
/// Entries in a pre-baked lookup table, same as a 256-bin listed colormap.
pub const LOOKUP_TABLE_SIZE: usize = 256;

/// Written as the depth of any station at or below sea level.
pub const NON_POSITIVE_ELEVATION_DEPTH_M: f64 = -1000.0;
pub const STATION_NAME_WIDTH: usize = 6;

pub const KM_PER_DEGREE: f64 = 111.19;

pub const FDSN_BASE_URL: &str = "https://service.iris.edu";
pub const FDSN_CHANNELS: &str = "BH?,HH?";
/// Station search window around the origin time, in seconds.
pub const STATION_WINDOW_S: (i64, i64) = (60, 600);

pub const CATALOG_LIST_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const CATALOG_CSV_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
pub const DAT_FILE_NAME_FORMAT: &str = "%y%m%d.%H%M%S";

pub const MAP_SIZE: (u32, u32) = (1024, 1024);
pub const PANEL_SIZE: (u32, u32) = (640, 640);

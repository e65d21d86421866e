use ::geo::{Bearing, Distance, Geodesic};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Point { lat, lon }
    }

    fn to_geo(self) -> ::geo::Point<f64> {
        ::geo::Point::new(self.lon, self.lat)
    }
}

/// Latitude/longitude rectangle used to frame a map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Extent {
    pub fn new(lat: (f64, f64), lon: (f64, f64)) -> Self {
        Extent {
            lat_min: lat.0.min(lat.1),
            lat_max: lat.0.max(lat.1),
            lon_min: lon.0.min(lon.1),
            lon_max: lon.0.max(lon.1),
        }
    }

    /// Bounds the union of every point in `sets`, padded by `margin` degrees on each side.
    ///
    /// The sets are merged before the min/max is taken, so catalog events and station
    /// locations end up inside one frame. With no points at all `default` is returned
    /// unchanged.
    pub fn aggregate<S, P>(sets: S, margin: f64, default: Extent) -> Extent
    where
        S: IntoIterator<Item = P>,
        P: IntoIterator<Item = Point>,
    {
        let bounds = sets.into_iter().flatten().fold(None, |acc, p| {
            let (lat_min, lat_max, lon_min, lon_max) = match acc {
                None => (p.lat, p.lat, p.lon, p.lon),
                Some((a, b, c, d)) => (
                    f64::min(a, p.lat),
                    f64::max(b, p.lat),
                    f64::min(c, p.lon),
                    f64::max(d, p.lon),
                ),
            };
            Some((lat_min, lat_max, lon_min, lon_max))
        });

        match bounds {
            None => default,
            Some((lat_min, lat_max, lon_min, lon_max)) => Extent {
                lat_min: lat_min - margin,
                lat_max: lat_max + margin,
                lon_min: lon_min - margin,
                lon_max: lon_max + margin,
            },
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.lat >= self.lat_min && p.lat <= self.lat_max && p.lon >= self.lon_min && p.lon <= self.lon_max
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            lat_min: self.lat_min.min(other.lat_min),
            lat_max: self.lat_max.max(other.lat_max),
            lon_min: self.lon_min.min(other.lon_min),
            lon_max: self.lon_max.max(other.lon_max),
        }
    }

    pub fn lat_range(&self) -> std::ops::Range<f64> {
        self.lat_min..self.lat_max
    }

    pub fn lon_range(&self) -> std::ops::Range<f64> {
        self.lon_min..self.lon_max
    }
}

/// Geodesic distance in km plus the azimuth and back-azimuth in degrees on the WGS84
/// ellipsoid. Azimuths run clockwise from north in `[0, 360)`.
pub fn distance_azimuth(from: Point, to: Point) -> (f64, f64, f64) {
    let (a, b) = (from.to_geo(), to.to_geo());
    let distance = Geodesic.distance(a, b) / 1000.0;
    (distance, azimuth(Geodesic.bearing(a, b)), azimuth(Geodesic.bearing(b, a)))
}

fn azimuth(bearing: f64) -> f64 {
    let deg = bearing.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to 360
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

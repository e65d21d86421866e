use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::Path,
};

use crate::constant::{NON_POSITIVE_ELEVATION_DEPTH_M, STATION_NAME_WIDTH};
use crate::geo::Point;
use crate::prelude::*;

/// One row of the fixed-width station table read by the location programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Depth in meters, positive down.
    pub depth_m: f64,
    pub p_correction: f64,
    pub s_correction: f64,
}

impl Station {
    /// Builds a station row from a surveyed elevation.
    ///
    /// Only stations above sea level get their negated elevation as depth; any other
    /// station is written with the -1000 m placeholder.
    pub fn from_elevation(name: &str, lat: f64, lon: f64, elevation_m: f64) -> Self {
        Station {
            name: name.chars().take(STATION_NAME_WIDTH).collect(),
            lat,
            lon,
            depth_m: table_depth_m(elevation_m),
            p_correction: 0.0,
            s_correction: 0.0,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }

    pub fn to_table_line(&self) -> String {
        let name: String = self.name.chars().take(STATION_NAME_WIDTH).collect();
        format!(
            "{:<width$} {:8.2} {:9.2} {:7.0} {:5.2} {:5.2}",
            name,
            self.lat,
            self.lon,
            self.depth_m,
            self.p_correction,
            self.s_correction,
            width = STATION_NAME_WIDTH
        )
    }
}

pub fn table_depth_m(elevation_m: f64) -> f64 {
    if elevation_m > 0.0 {
        -elevation_m
    } else {
        NON_POSITIVE_ELEVATION_DEPTH_M
    }
}

pub fn write_station_table(path: impl AsRef<Path>, stations: &[Station]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for station in stations {
        writeln!(writer, "{}", station.to_table_line())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a whitespace separated station table.
///
/// Only name, latitude and longitude are required; depth and the two corrections
/// default to zero and any further columns are ignored. Blank lines and lines starting
/// with `#` are skipped.
pub fn read_station_table(path: impl AsRef<Path>) -> Result<Vec<Station>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let file_name = path.display().to_string();
    let reader = io::BufReader::new(File::open(path)?);

    let mut stations = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::parse(
                &file_name,
                i + 1,
                format!("expected at least 3 columns, found {}", fields.len()),
            ));
        }
        let number = |index: usize| -> Result<f64> {
            match fields.get(index) {
                None => Ok(0.0),
                Some(field) => field.parse::<f64>().map_err(|e| {
                    Error::parse(&file_name, i + 1, format!("column {}: {}", index + 1, e))
                }),
            }
        };
        stations.push(Station {
            name: fields[0].to_owned(),
            lat: number(1)?,
            lon: number(2)?,
            depth_m: number(3)?,
            p_correction: number(4)?,
            s_correction: number(5)?,
        });
    }
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_depth_from_elevation() {
        assert_eq!(-1200.0, table_depth_m(1200.0));
        assert_eq!(-1000.0, table_depth_m(-50.0));
        assert_eq!(-1000.0, table_depth_m(0.0));
    }

    #[test]
    fn test_table_line_layout() {
        let station = Station::from_elevation("CI.BAR", 32.68, -116.67, 1200.0);
        assert_eq!("CI.BAR    32.68   -116.67   -1200  0.00  0.00", station.to_table_line());

        let station = Station::from_elevation("AZ.RRSP", 33.5, -116.6, -50.0);
        assert_eq!("AZ.RRS", station.name);
        assert_eq!("AZ.RRS    33.50   -116.60   -1000  0.00  0.00", station.to_table_line());

        let station = Station::from_elevation("ST01", 39.0, 142.2, 10.0);
        assert!(station.to_table_line().starts_with("ST01   "));
    }

    #[test]
    fn test_write_then_read_table() {
        let path = env::temp_dir().join("hypomap_test_station.tbl");
        let stations = vec![
            Station::from_elevation("ML06", 39.671, 143.712, -2879.0),
            Station {
                name: "ST01".to_owned(),
                lat: 39.0,
                lon: 142.2,
                depth_m: -1000.0,
                p_correction: 0.4,
                s_correction: 0.68,
            },
        ];
        write_station_table(&path, &stations).unwrap();

        let read = read_station_table(&path).unwrap();
        assert_eq!(2, read.len());
        assert_eq!("ML06", read[0].name);
        assert_eq!(39.67, read[0].lat);
        assert_eq!(143.71, read[0].lon);
        assert_eq!(-1000.0, read[0].depth_m);
        assert_eq!(0.4, read[1].p_correction);
        assert_eq!(0.68, read[1].s_correction);
    }

    #[test]
    fn test_read_short_and_commented_rows() {
        let path = env::temp_dir().join("hypomap_test_station_short.tbl");
        std::fs::write(&path, "# name lat lon\nST02 39.10 142.30\n\nST03\t39.2  142.4 -500 0.1 0.2 x y z\n")
            .unwrap();

        let read = read_station_table(&path).unwrap();
        assert_eq!(2, read.len());
        assert_eq!(0.0, read[0].depth_m);
        assert_eq!(-500.0, read[1].depth_m);
        assert_eq!(0.2, read[1].s_correction);
    }

    #[test]
    fn test_read_errors() {
        let missing = env::temp_dir().join("hypomap_no_such_station.tbl");
        assert!(matches!(read_station_table(&missing), Err(Error::MissingFile(_))));

        let path = env::temp_dir().join("hypomap_test_station_bad.tbl");
        std::fs::write(&path, "ST01 39.0\n").unwrap();
        assert!(matches!(
            read_station_table(&path),
            Err(Error::Parse { line: 1, .. })
        ));
    }
}

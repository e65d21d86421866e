use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use chrono::NaiveDateTime;
use polars::prelude::{
    CsvReader, CsvWriter, DataFrame, DataType, NamedFrom, SerReader, SerWriter, Series,
};

use crate::constant::{CATALOG_CSV_TIME_FORMAT, CATALOG_LIST_TIME_FORMAT};
use crate::geo::Point;
use crate::prelude::*;

pub const CATALOG_COLUMNS: [&str; 11] = [
    "time", "lat", "lon", "dep", "elat", "elon", "edep", "res", "file", "method", "cid",
];

/// Provenance tag of a catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Reference event with a fixed location.
    Ref,
    /// Synthetic event.
    Syn,
    /// Triple-difference relocation.
    Trd,
    Other(String),
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_uppercase();
        Ok(match tag.as_str() {
            "" => return Err(Error::InvalidInput("empty method tag".to_owned())),
            "REF" => Method::Ref,
            "SYN" => Method::Syn,
            "TRD" => Method::Trd,
            _ => Method::Other(tag),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Ref => write!(f, "REF"),
            Method::Syn => write!(f, "SYN"),
            Method::Trd => write!(f, "TRD"),
            Method::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// One hypocenter solution of a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypocenter {
    pub time: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    /// km
    pub dep: f64,
    pub elat: f64,
    pub elon: f64,
    pub edep: f64,
    pub res: f64,
    pub file: String,
    pub method: Method,
    /// Cluster id.
    pub cid: Option<i64>,
}

impl Hypocenter {
    pub fn point(&self) -> Point {
        Point::new(self.lat, self.lon)
    }

    fn to_list_line(&self) -> String {
        let mut line = format!(
            "{} {} {} {} {} {} {} {} {} {}",
            self.time.format(CATALOG_LIST_TIME_FORMAT),
            self.lat,
            self.lon,
            self.dep,
            self.elat,
            self.elon,
            self.edep,
            self.res,
            quote_list_field(&self.file),
            quote_list_field(&self.method.to_string())
        );
        if let Some(cid) = self.cid {
            line.push_str(&format!(" {}", cid));
        }
        line
    }
}

/// Double-quotes a list field that is empty or holds whitespace or quotes, with inner
/// quotes doubled.
fn quote_list_field(field: &str) -> Cow<'_, str> {
    if field.is_empty() || field.contains(|c: char| c.is_whitespace() || c == '"') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Splits a list line on whitespace, keeping double-quoted fields whole.
fn split_list_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };
        let mut field = String::new();
        if first == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.next_if_eq(&'"').is_some() => field.push('"'),
                    Some('"') => break,
                    Some(c) => field.push(c),
                    // unterminated quote
                    None => return None,
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                field.push(c);
            }
        }
        fields.push(field);
    }
    Some(fields)
}

pub fn parse_time(value: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
}

pub fn write_catalog_list(path: impl AsRef<Path>, catalog: &[Hypocenter]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for hypocenter in catalog {
        writeln!(writer, "{}", hypocenter.to_list_line())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the header-less, space separated catalog list.
pub fn read_catalog_list(path: impl AsRef<Path>) -> Result<Vec<Hypocenter>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let file_name = path.display().to_string();
    let reader = io::BufReader::new(File::open(path)?);

    let mut catalog = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields = split_list_line(&line)
            .ok_or_else(|| Error::parse(&file_name, i + 1, "unterminated quote"))?;
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 10 {
            return Err(Error::parse(
                &file_name,
                i + 1,
                format!("expected 10 or 11 columns, found {}", fields.len()),
            ));
        }
        let number = |index: usize| -> Result<f64> {
            fields[index].parse::<f64>().map_err(|e| {
                Error::parse(&file_name, i + 1, format!("{}: {}", CATALOG_COLUMNS[index], e))
            })
        };
        let cid = match fields.get(10) {
            None => None,
            Some(field) => Some(field.parse::<i64>().map_err(|e| {
                Error::parse(&file_name, i + 1, format!("cid: {}", e))
            })?),
        };
        catalog.push(Hypocenter {
            time: parse_time(&fields[0])?,
            lat: number(1)?,
            lon: number(2)?,
            dep: number(3)?,
            elat: number(4)?,
            elon: number(5)?,
            edep: number(6)?,
            res: number(7)?,
            file: fields[8].clone(),
            method: fields[9].parse()?,
            cid,
        });
    }
    Ok(catalog)
}

pub fn write_catalog_csv(path: impl AsRef<Path>, catalog: &[Hypocenter]) -> Result<()> {
    let float = |name: &str, value: fn(&Hypocenter) -> f64| {
        Series::new(name, catalog.iter().map(value).collect::<Vec<f64>>())
    };
    let mut df = DataFrame::new(vec![
        Series::new(
            "time",
            catalog
                .iter()
                .map(|h| h.time.format(CATALOG_CSV_TIME_FORMAT).to_string())
                .collect::<Vec<String>>(),
        ),
        float("lat", |h| h.lat),
        float("lon", |h| h.lon),
        float("dep", |h| h.dep),
        float("elat", |h| h.elat),
        float("elon", |h| h.elon),
        float("edep", |h| h.edep),
        float("res", |h| h.res),
        Series::new("file", catalog.iter().map(|h| h.file.as_str()).collect::<Vec<&str>>()),
        Series::new(
            "method",
            catalog.iter().map(|h| h.method.to_string()).collect::<Vec<String>>(),
        ),
        Series::new("cid", catalog.iter().map(|h| h.cid).collect::<Vec<Option<i64>>>()),
    ])?;

    let mut writer = BufWriter::new(File::create(path)?);
    CsvWriter::new(&mut writer).has_header(true).finish(&mut df)?;
    writer.flush()?;
    Ok(())
}

/// Reads a catalog CSV with a header line.
///
/// `latitude`, `longitude`, `depth` and `mode` are accepted in place of `lat`, `lon`,
/// `dep` and `method`. Only the time and the location are required; rows of a file
/// without a method column are tagged `TRD`.
pub fn read_catalog_csv(path: impl AsRef<Path>) -> Result<Vec<Hypocenter>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let df = CsvReader::from_path(path)?.has_header(true).finish()?;
    let rows = df.height();

    let file_name = path.display().to_string();
    let required = |names: &[&str]| -> Result<Vec<f64>> {
        let values = floats(&df, names)?.ok_or_else(|| {
            Error::InvalidInput(format!("{}: no {} column", file_name, names[0]))
        })?;
        values
            .into_iter()
            .enumerate()
            // row 1 is the header
            .map(|(i, v)| v.ok_or_else(|| Error::parse(&file_name, i + 2, format!("empty {}", names[0]))))
            .collect()
    };
    let optional = |names: &[&str]| -> Result<Vec<f64>> {
        Ok(match floats(&df, names)? {
            Some(values) => values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            None => vec![0.0; rows],
        })
    };

    let times = strings(&df, &["time"])?
        .ok_or_else(|| Error::InvalidInput(format!("{}: no time column", file_name)))?;
    let lat = required(&["lat", "latitude"])?;
    let lon = required(&["lon", "longitude"])?;
    let dep = required(&["dep", "depth"])?;
    let elat = optional(&["elat"])?;
    let elon = optional(&["elon"])?;
    let edep = optional(&["edep"])?;
    let res = optional(&["res"])?;
    let files = strings(&df, &["file"])?.unwrap_or_else(|| vec![String::new(); rows]);
    let methods = strings(&df, &["method", "mode"])?;
    let cids = integers(&df, &["cid"])?;

    let mut catalog = Vec::with_capacity(rows);
    for i in 0..rows {
        let method = match &methods {
            Some(methods) => methods[i].parse()?,
            None => Method::Trd,
        };
        catalog.push(Hypocenter {
            time: parse_time(&times[i])?,
            lat: lat[i],
            lon: lon[i],
            dep: dep[i],
            elat: elat[i],
            elon: elon[i],
            edep: edep[i],
            res: res[i],
            file: files[i].clone(),
            method,
            cid: cids.as_ref().and_then(|cids| cids[i]),
        });
    }
    Ok(catalog)
}

/// Reads a catalog from either layout, picked by the `.csv` extension.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<Vec<Hypocenter>> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => read_catalog_csv(path),
        _ => read_catalog_list(path),
    }
}

fn column<'a>(df: &'a DataFrame, names: &[&str]) -> Option<&'a Series> {
    names.iter().find_map(|name| df.column(name).ok())
}

fn floats(df: &DataFrame, names: &[&str]) -> Result<Option<Vec<Option<f64>>>> {
    let Some(series) = column(df, names) else {
        return Ok(None);
    };
    let series = series.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(Some(values))
}

fn integers(df: &DataFrame, names: &[&str]) -> Result<Option<Vec<Option<i64>>>> {
    let Some(series) = column(df, names) else {
        return Ok(None);
    };
    let series = series.cast(&DataType::Int64)?;
    let values = series.i64()?.into_iter().collect();
    Ok(Some(values))
}

fn strings(df: &DataFrame, names: &[&str]) -> Result<Option<Vec<String>>> {
    let Some(series) = column(df, names) else {
        return Ok(None);
    };
    let series = series.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_owned())
        .collect();
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;

    fn hypocenter(hour: u32, method: Method, cid: Option<i64>) -> Hypocenter {
        Hypocenter {
            time: NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            lat: 39.8,
            lon: 143.25,
            dep: 20.5,
            elat: 0.01,
            elon: 0.02,
            edep: 0.5,
            res: 0.125,
            file: format!("./dat-syn/000101.{:02}0000", hour),
            method,
            cid,
        }
    }

    #[test]
    fn test_method_tags() {
        assert_eq!(Method::Ref, "ref".parse().unwrap());
        assert_eq!(Method::Trd, "TRD".parse().unwrap());
        assert_eq!(Method::Other("GRD".to_owned()), "grd".parse().unwrap());
        assert!("  ".parse::<Method>().is_err());
        assert_eq!("SYN", Method::Syn.to_string());
    }

    #[test]
    fn test_list_line_layout() {
        let line = hypocenter(3, Method::Trd, None).to_list_line();
        assert_eq!(
            "2000-01-01T03:00:00 39.8 143.25 20.5 0.01 0.02 0.5 0.125 ./dat-syn/000101.030000 TRD",
            line
        );
        assert!(hypocenter(3, Method::Ref, Some(4)).to_list_line().ends_with(" REF 4"));
    }

    #[test]
    fn test_list_fields_with_spaces_are_quoted() {
        let mut h = hypocenter(1, Method::Other("GRID 2".to_owned()), Some(5));
        h.file = "my dat/000101.010000".to_owned();
        assert_eq!(
            "2000-01-01T01:00:00 39.8 143.25 20.5 0.01 0.02 0.5 0.125 \"my dat/000101.010000\" \"GRID 2\" 5",
            h.to_list_line()
        );
        assert_eq!("\"\"", quote_list_field(""));
        assert_eq!("\"say \"\"hi\"\"\"", quote_list_field("say \"hi\""));
    }

    #[test]
    fn test_split_list_line() {
        assert_eq!(
            Some(vec!["a".to_owned(), "b c".to_owned(), "".to_owned(), "d\"e".to_owned()]),
            split_list_line("  a \"b c\"\t\"\" \"d\"\"e\" ")
        );
        assert_eq!(Some(vec![]), split_list_line("   "));
        assert_eq!(None, split_list_line("a \"b c"));
    }

    #[test]
    fn test_catalog_list_file_with_spaces() {
        let path = env::temp_dir().join("hypomap_test_catalog_spaces.list");
        let mut spaced = hypocenter(1, Method::Trd, None);
        spaced.file = "my dat/000101.010000".to_owned();
        let mut empty = hypocenter(2, Method::Ref, Some(1));
        empty.file = String::new();
        let catalog = vec![spaced, empty];

        write_catalog_list(&path, &catalog).unwrap();
        assert_eq!(catalog, read_catalog(&path).unwrap());

        std::fs::write(&path, "2000-01-01T00:00:00 39.8 143.3 20 0 0 0 0 \"open TRD\n").unwrap();
        assert!(matches!(read_catalog(&path), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn test_catalog_csv_quotes_commas() {
        let path = env::temp_dir().join("hypomap_test_catalog_comma.csv");
        let mut h = hypocenter(1, Method::Syn, Some(0));
        h.file = "run,1/000101.010000".to_owned();
        let catalog = vec![h, hypocenter(2, Method::Ref, None)];

        write_catalog_csv(&path, &catalog).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(Some(CATALOG_COLUMNS.join(",").as_str()), lines.next());
        assert!(lines.next().unwrap().starts_with("2000-01-01T01:00:00.000Z,39.8,143.25,20.5,"));
        assert!(text.contains("\"run,1/000101.010000\""));

        assert_eq!(catalog, read_catalog(&path).unwrap());
    }

    #[test]
    fn test_catalog_csv_rejects_empty_location() {
        let path = env::temp_dir().join("hypomap_test_catalog_null.csv");
        std::fs::write(
            &path,
            "time,lat,lon,dep\n2025-08-15T16:43:29.010Z,33.676,-116.799,17.3\n2025-08-15T16:50:00.000Z,33.7,,17.0\n",
        )
        .unwrap();
        assert!(matches!(read_catalog(&path), Err(Error::Parse { line: 3, .. })));
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = "2025-08-15 16:43:29";
        assert_eq!(expected, parse_time("2025-08-15T16:43:29").unwrap().to_string());
        assert_eq!(expected, parse_time(" 2025-08-15 16:43:29 ").unwrap().to_string());
        assert_eq!(
            "2025-08-15 16:43:29.010",
            parse_time("2025-08-15T16:43:29.010Z").unwrap().to_string()
        );
        assert!(parse_time("15/08/2025").is_err());
    }

    #[test]
    fn test_catalog_list_file() {
        let path = env::temp_dir().join("hypomap_test_catalog.list");
        let catalog = vec![
            hypocenter(1, Method::Trd, None),
            hypocenter(2, Method::Ref, Some(7)),
        ];
        write_catalog_list(&path, &catalog).unwrap();
        assert_eq!(catalog, read_catalog(&path).unwrap());
    }

    #[test]
    fn test_catalog_csv_file() {
        let path = env::temp_dir().join("hypomap_test_catalog.csv");
        let catalog = vec![
            hypocenter(1, Method::Syn, Some(0)),
            hypocenter(2, Method::Ref, Some(3)),
        ];
        write_catalog_csv(&path, &catalog).unwrap();
        assert_eq!(catalog, read_catalog(&path).unwrap());
    }

    #[test]
    fn test_catalog_csv_aliases_and_defaults() {
        let path = env::temp_dir().join("hypomap_test_catalog_alias.csv");
        std::fs::write(
            &path,
            "time,latitude,longitude,depth\n2025-08-15T16:43:29.010Z,33.676,-116.799,17.3\n",
        )
        .unwrap();

        let catalog = read_catalog_csv(&path).unwrap();
        assert_eq!(1, catalog.len());
        assert_eq!(Method::Trd, catalog[0].method);
        assert_eq!(33.676, catalog[0].lat);
        assert_eq!(-116.799, catalog[0].lon);
        assert_eq!(17.3, catalog[0].dep);
        assert_eq!(0.0, catalog[0].res);
        assert_eq!(None, catalog[0].cid);
        assert_eq!("", catalog[0].file);
    }

    #[test]
    fn test_read_catalog_errors() {
        let missing = env::temp_dir().join("hypomap_no_such_catalog.csv");
        assert!(matches!(read_catalog(&missing), Err(Error::MissingFile(_))));

        let path = env::temp_dir().join("hypomap_test_catalog_bad.list");
        std::fs::write(&path, "2000-01-01T00:00:00 39.8 143.3 20\n").unwrap();
        assert!(matches!(read_catalog(&path), Err(Error::Parse { line: 1, .. })));

        std::fs::write(&path, "yesterday 39.8 143.3 20 0 0 0 0 f TRD\n").unwrap();
        assert!(matches!(read_catalog(&path), Err(Error::Timestamp(_))));
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::catalog::{write_catalog_list, Hypocenter};
use crate::constant::DAT_FILE_NAME_FORMAT;
use crate::prelude::*;

/// Event time encoded in the name of a per-event inversion file, e.g. `250815.164329`.
pub fn event_time(path: &Path) -> Result<NaiveDateTime> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("no file name in {}", path.display())))?;
    Ok(NaiveDateTime::parse_from_str(name, DAT_FILE_NAME_FORMAT)?)
}

/// Reads one per-event inversion file into a catalog row.
///
/// The first non-blank row holds `lat lon dep type`, the second `elat elon edep res`.
pub fn read_event_file(path: &Path) -> Result<Hypocenter> {
    let file_name = path.display().to_string();
    let time = event_time(path)?;
    let content = fs::read_to_string(path)?;

    let rows: Vec<(usize, Vec<&str>)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<&str>>()))
        .filter(|(_, fields)| !fields.is_empty())
        .take(2)
        .collect();
    if rows.len() < 2 {
        return Err(Error::parse(&file_name, rows.len() + 1, "expected a solution row and an error row"));
    }

    let number = |row: usize, column: usize| -> Result<f64> {
        let (line, fields) = &rows[row];
        let field = fields
            .get(column)
            .ok_or_else(|| Error::parse(&file_name, *line, format!("missing column {}", column + 1)))?;
        field
            .parse::<f64>()
            .map_err(|e| Error::parse(&file_name, *line, format!("column {}: {}", column + 1, e)))
    };
    let kind = rows[0]
        .1
        .get(3)
        .ok_or_else(|| Error::parse(&file_name, rows[0].0, "missing type column"))?;

    Ok(Hypocenter {
        time,
        lat: number(0, 0)?,
        lon: number(0, 1)?,
        dep: number(0, 2)?,
        elat: number(1, 0)?,
        elon: number(1, 1)?,
        edep: number(1, 2)?,
        res: number(1, 3)?,
        file: file_name.clone(),
        method: kind.parse()?,
        cid: None,
    })
}

/// Collects every file of `dat_dir` into a catalog sorted by event time.
pub fn summarize(dat_dir: &Path) -> Result<Vec<Hypocenter>> {
    if !dat_dir.is_dir() {
        return Err(Error::MissingFile(dat_dir.to_path_buf()));
    }
    let mut paths = fs::read_dir(dat_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::result::Result<Vec<PathBuf>, std::io::Error>>()?;
    paths.retain(|p| p.is_file());
    paths.sort();

    let mut catalog = Vec::with_capacity(paths.len());
    for path in paths {
        info!("{}", path.display());
        catalog.push(read_event_file(&path)?);
    }
    catalog.sort_by_key(|h| h.time);
    debug!("summarized {} events from {}", catalog.len(), dat_dir.display());
    Ok(catalog)
}

/// Summarizes `dat_dir` into a catalog list at `output`.
///
/// An existing `output` is only replaced when `overwrite` is set.
pub fn write_summary(dat_dir: &Path, output: &Path, overwrite: bool) -> Result<Vec<Hypocenter>> {
    if output.exists() && !overwrite {
        return Err(Error::InvalidInput(format!(
            "{} already exists, pass --force to overwrite it",
            output.display()
        )));
    }
    let catalog = summarize(dat_dir)?;
    write_catalog_list(output, &catalog)?;
    info!("wrote {} events to {}", catalog.len(), output.display());
    Ok(catalog)
}

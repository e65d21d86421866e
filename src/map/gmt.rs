use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::catalog::Hypocenter;
use crate::color::DepthColorMapper;
use crate::prelude::*;
use crate::station::Station;

use super::{cluster_color, error_bar, marker, ColorBy, MapConfig, Marker, Panel};

const CPT_SLICES: usize = 64;
const PANEL_WIDTH_CM: f64 = 8.0;

/// Writes a GMT 6 modern-mode script to `path`. Its palette and the data files it plots
/// are written next to it and referenced by file name, so the script runs from any
/// working directory.
pub(super) fn write_script(
    path: &Path,
    config: &MapConfig,
    panels: &[Panel],
    stations: &[Station],
    cols: usize,
    mapper: &DepthColorMapper,
) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("bad script path {}", path.display())))?;

    let cpt = format!("{}.cpt", stem);
    let palette = match config.color_by {
        ColorBy::Depth => mapper.to_cpt(CPT_SLICES),
        ColorBy::Cluster => cluster_cpt(panels),
    };
    fs::write(dir.join(&cpt), palette)?;

    let station_file = format!("{}_stations.txt", stem);
    let rows: String = stations
        .iter()
        .map(|s| format!("{} {} {}\n", s.lon, s.lat, s.name))
        .collect();
    fs::write(dir.join(&station_file), rows)?;

    let e = config.extent;
    let rows = (panels.len() + cols - 1) / cols;
    let mut script = String::from("#!/usr/bin/env bash\nset -e\ncd \"$(dirname \"$0\")\"\n\n");
    let _ = writeln!(script, "gmt begin {} png", stem);
    let _ = writeln!(
        script,
        "  gmt subplot begin {}x{} -Fs{w}c/{w}c -M0.3c -R{}/{}/{}/{} -JM?",
        rows,
        cols,
        e.lon_min,
        e.lon_max,
        e.lat_min,
        e.lat_max,
        w = PANEL_WIDTH_CM
    );

    for (i, panel) in panels.iter().enumerate() {
        let _ = writeln!(script, "    gmt subplot set {}", i);
        let _ = writeln!(
            script,
            "    gmt coast -Baf -B+t\"{}\" -Glightgray -Slightblue -W0.5p,gray -N1/0.5p,gray",
            panel.title.replace('"', "'")
        );
        if config.error_bars {
            let rows: String = panel
                .catalog
                .iter()
                .filter_map(|h| {
                    let (d_lon, d_lat) = error_bar(h)?;
                    Some(format!("{} {} {} {}\n", h.lon, h.lat, d_lon, d_lat))
                })
                .collect();
            if !rows.is_empty() {
                let name = format!("{}_{}_errors.txt", stem, i);
                fs::write(dir.join(&name), rows)?;
                let _ = writeln!(script, "    gmt plot {} -Sp -Exy+p0.5p,gray", name);
            }
        }
        for (group, symbol) in [(Marker::Circle, "-Sc0.2c -W0.3p,black"), (Marker::Square, "-Ss0.25c -W0.5p,black")] {
            let rows: String = panel
                .catalog
                .iter()
                .filter(|h| marker(&h.method) == group)
                .map(|h| format!("{} {} {}\n", h.lon, h.lat, z_value(config, h)))
                .collect();
            if rows.is_empty() {
                continue;
            }
            let name = format!("{}_{}_{}.txt", stem, i, group_name(group));
            fs::write(dir.join(&name), rows)?;
            let _ = writeln!(script, "    gmt plot {} {} -C{}", name, symbol, cpt);
        }
        let _ = writeln!(script, "    gmt plot {} -S+0.4c -W1.5p,black", station_file);
    }

    script.push_str("  gmt subplot end\n");
    if config.color_by == ColorBy::Depth {
        let _ = writeln!(
            script,
            "  gmt colorbar -C{} -DJBC+w10c/0.3c+h+o0/1c -Bxaf+l\"Depth [km]\"",
            cpt
        );
    }
    script.push_str("gmt end\n");

    fs::write(path, script)?;
    Ok(())
}

fn group_name(group: Marker) -> &'static str {
    match group {
        Marker::Circle => "circle",
        Marker::Square => "square",
    }
}

fn z_value(config: &MapConfig, h: &Hypocenter) -> String {
    match config.color_by {
        ColorBy::Depth => h.dep.to_string(),
        ColorBy::Cluster => h.cid.unwrap_or(-1).to_string(),
    }
}

/// One constant band per cluster id, unclustered rows (`-1`) grey.
fn cluster_cpt(panels: &[Panel]) -> String {
    let max_cid = panels
        .iter()
        .flat_map(|p| p.catalog.iter())
        .filter_map(|h| h.cid)
        .max()
        .unwrap_or(0)
        .max(0);
    let mut cpt = String::from("# cluster id\n");
    for cid in -1..=max_cid {
        let (r, g, b) = cluster_color(Some(cid));
        let _ = writeln!(cpt, "{}\t{r}/{g}/{b}\t{}\t{r}/{g}/{b}", cid as f64 - 0.5, cid as f64 + 0.5);
    }
    cpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Method;
    use crate::constant::DEFAULT_EXTENT;
    use crate::map::{render_panels, MapBackend};
    use chrono::NaiveDateTime;
    use std::env;

    fn hypocenter(lat: f64, lon: f64, dep: f64, method: Method, cid: Option<i64>) -> Hypocenter {
        Hypocenter {
            time: NaiveDateTime::default(),
            lat,
            lon,
            dep,
            elat: 0.0,
            elon: 0.0,
            edep: 0.0,
            res: 0.0,
            file: String::new(),
            method,
            cid,
        }
    }

    fn out_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_script_and_data_files() {
        let dir = out_dir("hypomap_test_gmt");
        let path = dir.join("trd.sh");
        let config = MapConfig::new(DEFAULT_EXTENT);
        let panels = vec![
            Panel {
                title: "syn".to_owned(),
                catalog: vec![
                    hypocenter(39.8, 143.3, 20.0, Method::Syn, Some(0)),
                    hypocenter(39.9, 143.4, 21.5, Method::Ref, Some(0)),
                ],
            },
            Panel {
                title: "with \"ref\" event".to_owned(),
                catalog: vec![hypocenter(39.7, 143.2, 18.0, Method::Trd, Some(1))],
            },
        ];
        let stations = vec![Station::from_elevation("ST01", 39.0, 142.2, 10.0)];

        render_panels(MapBackend::Gmt, &path, &config, &panels, &stations, 3).unwrap();

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.contains("gmt begin trd png\n"));
        assert!(script.contains("gmt subplot begin 1x2 -Fs8c/8c -M0.3c -R141.5/144/38/40.5 -JM?\n"));
        assert!(script.contains("gmt plot trd_0_circle.txt -Sc0.2c -W0.3p,black -Ctrd.cpt\n"));
        assert!(script.contains("gmt plot trd_0_square.txt -Ss0.25c -W0.5p,black -Ctrd.cpt\n"));
        assert!(!script.contains("trd_1_square.txt"));
        assert!(script.contains("-B+t\"with 'ref' event\""));
        assert!(script.contains("gmt colorbar -Ctrd.cpt"));
        assert!(script.trim_end().ends_with("gmt end"));

        assert_eq!("143.3 39.8 20\n", fs::read_to_string(dir.join("trd_0_circle.txt")).unwrap());
        assert_eq!("143.4 39.9 21.5\n", fs::read_to_string(dir.join("trd_0_square.txt")).unwrap());
        assert_eq!("142.2 39 ST01\n", fs::read_to_string(dir.join("trd_stations.txt")).unwrap());
        assert!(fs::read_to_string(dir.join("trd.cpt")).unwrap().starts_with("# depth [km]\n10.0000\t"));
    }

    #[test]
    fn test_cluster_palette() {
        let dir = out_dir("hypomap_test_gmt_cluster");
        let path = dir.join("cid.gmt");
        let mut config = MapConfig::new(DEFAULT_EXTENT);
        config.color_by = ColorBy::Cluster;
        let panels = vec![Panel {
            title: String::new(),
            catalog: vec![
                hypocenter(39.8, 143.3, 20.0, Method::Trd, Some(2)),
                hypocenter(39.8, 143.4, 20.0, Method::Trd, None),
            ],
        }];

        render_panels(MapBackend::Gmt, &path, &config, &panels, &[], 1).unwrap();

        let cpt = fs::read_to_string(dir.join("cid.cpt")).unwrap();
        // -1, 0, 1, 2
        assert_eq!(4, cpt.lines().filter(|l| !l.starts_with('#')).count());
        assert!(cpt.contains("-1.5\t128/128/128\t-0.5\t128/128/128\n"));
        assert_eq!("143.3 39.8 2\n143.4 39.8 -1\n", fs::read_to_string(dir.join("cid_0_circle.txt")).unwrap());
        assert!(!fs::read_to_string(&path).unwrap().contains("colorbar"));
    }

    #[test]
    fn test_error_bar_layer() {
        let dir = out_dir("hypomap_test_gmt_errors");
        let path = dir.join("err.sh");
        let mut config = MapConfig::new(DEFAULT_EXTENT);
        let mut with_error = hypocenter(60.0, 143.0, 20.0, Method::Trd, None);
        with_error.elat = 111.19;
        with_error.elon = 111.19;
        let panels = vec![Panel {
            title: String::new(),
            catalog: vec![with_error, hypocenter(39.8, 143.4, 20.0, Method::Trd, None)],
        }];

        render_panels(MapBackend::Gmt, &path, &config, &panels, &[], 1).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("-Exy"));
        assert!(!dir.join("err_0_errors.txt").exists());

        config.error_bars = true;
        render_panels(MapBackend::Gmt, &path, &config, &panels, &[], 1).unwrap();
        let script = fs::read_to_string(&path).unwrap();
        let errors = script.find("gmt plot err_0_errors.txt -Sp -Exy+p0.5p,gray").unwrap();
        assert!(errors < script.find("err_0_circle.txt").unwrap());
        let rows = fs::read_to_string(dir.join("err_0_errors.txt")).unwrap();
        let fields: Vec<f64> = rows.split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(4, fields.len());
        assert!((fields[2] - 2.0).abs() < 1e-9);
        assert_eq!(1.0, fields[3]);
    }
}

use std::{env, fs, path::PathBuf};

use hypomap::catalog::{read_catalog, write_catalog_list, Method};
use hypomap::map::{data_extent, render_panels, MapBackend, MapConfig, Panel};
use hypomap::station::{read_station_table, write_station_table, Station};
use hypomap::summary::write_summary;
use hypomap::synthetic::{generate, perturb, SyntheticConfig};

fn work_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn synthetic_catalog_to_gmt_panels() -> anyhow::Result<()> {
    let dir = work_dir("hypomap_it_pipeline");

    let truth = generate(&SyntheticConfig::default())?;
    let noisy = perturb(&truth, 0.01, 3)?;
    let truth_path = dir.join("catalog_ground_truth.csv");
    let noisy_path = dir.join("catalog_noisy.list");
    hypomap::catalog::write_catalog_csv(&truth_path, &truth)?;
    write_catalog_list(&noisy_path, &noisy)?;

    let truth = read_catalog(&truth_path)?;
    let noisy = read_catalog(&noisy_path)?;
    assert_eq!(truth.len(), noisy.len());
    assert_eq!(20, truth.iter().filter(|h| h.method == Method::Ref).count());

    let stations = vec![
        Station::from_elevation("ST01", 39.5, 142.2, 120.0),
        Station::from_elevation("ST02", 40.1, 142.0, -15.0),
    ];
    let station_path = dir.join("station.tbl");
    write_station_table(&station_path, &stations)?;
    let stations = read_station_table(&station_path)?;

    let extent = data_extent(&[truth.as_slice(), noisy.as_slice()], &stations);
    for h in truth.iter().chain(noisy.iter()) {
        assert!(extent.contains(&h.point()));
    }
    for s in stations.iter() {
        assert!(extent.contains(&s.point()));
    }

    let mut config = MapConfig::new(extent);
    config.depth_range = 17.0..23.0;
    let panels = vec![
        Panel { title: "truth".to_owned(), catalog: truth },
        Panel { title: "noisy".to_owned(), catalog: noisy },
    ];
    let script = dir.join("compare.sh");
    render_panels(MapBackend::Gmt, &script, &config, &panels, &stations, 2)?;

    let text = fs::read_to_string(&script)?;
    assert!(text.contains("gmt subplot begin 1x2"));
    assert!(text.contains("gmt subplot set 1"));
    assert!(dir.join("compare_0_square.txt").exists());
    assert!(dir.join("compare_1_circle.txt").exists());
    assert_eq!(2, fs::read_to_string(dir.join("compare_stations.txt"))?.lines().count());
    Ok(())
}

#[test]
fn summarize_dat_directory() -> anyhow::Result<()> {
    let dir = work_dir("hypomap_it_summary");
    let dat = dir.join("dat");
    fs::create_dir_all(&dat)?;
    fs::write(dat.join("250815.164329"), "33.676 -116.799 17.3 TRD\n0.01 0.01 0.5 0.08\n")?;
    fs::write(dat.join("250815.120000"), "33.670 -116.790 16.9 TRD\n0.02 0.01 0.4 0.06\n")?;

    let output = dir.join("catalog.list");
    let catalog = write_summary(&dat, &output, false)?;
    assert_eq!(2, catalog.len());
    assert!(catalog[0].time < catalog[1].time);

    let reread = read_catalog(&output)?;
    assert_eq!(catalog.len(), reread.len());
    assert_eq!(17.3, reread[1].dep);

    // refuses to replace the list unless forced
    assert!(write_summary(&dat, &output, false).is_err());
    assert_eq!(2, write_summary(&dat, &output, true)?.len());
    Ok(())
}

use lt_core::{
    DetectorSpec, Pitch, RefSensor, RunConfig, SamplePoint, SignalKind, TableKind,
};
use lt_sample::{sample_energy_points, sample_tracking_points};
use lt_sim::{write_result_artifact, ResultArtifact, SqliteResults, WorkingDirs};
use lt_table::{
    generate_table, load_config, load_light_table, MissingReason, TableBuilder, TableRequest,
};
use tempfile::tempdir;

const PMT: &str = "PmtR11410";

fn small_detector() -> DetectorSpec {
    DetectorSpec {
        active_radius: 25.0,
        active_length: 40.0,
        buffer_length: 10.0,
        el_gap: 6.0,
        ref_sensor: RefSensor {
            id: 7,
            x: 25.0,
            y: 25.0,
        },
    }
}

fn request<'a>(detector: &'a DetectorSpec, table: TableKind, signal: SignalKind) -> TableRequest<'a> {
    TableRequest {
        detector_name: "SMALL",
        detector,
        table,
        signal,
        sensor: PMT,
    }
}

fn write_point(dirs: &WorkingDirs, point: &SamplePoint, artifact: &ResultArtifact) {
    let files = dirs.point_files("SMALL", &point.key());
    write_result_artifact(&files.result, artifact).expect("artifact");
}

fn pmt_artifact(photons: u64, charges: &[(u32, f64)]) -> ResultArtifact {
    let mut artifact = ResultArtifact::with_run(1, photons)
        .sensor(1, PMT, 0.0, 0.0)
        .sensor(2, PMT, 10.0, 0.0)
        .sensor(7, PMT, 25.0, 25.0)
        .sensor(1000, "SiPM", 0.0, 0.0)
        .charge(0, 1000, 99.0);
    for (sensor, charge) in charges {
        artifact = artifact.charge(0, *sensor, *charge);
    }
    artifact
}

#[test]
fn energy_rows_are_normalized_and_missing_points_dropped() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S2, &Pitch::new(20.0, 20.0, 20.0)).expect("sample");
    assert_eq!(points.len(), 5);

    for point in &points[..4] {
        write_point(&dirs, point, &pmt_artifact(100, &[(1, 50.0), (2, 10.0)]));
    }

    let builder = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S2),
    );
    let outcome = builder.build(&points).expect("build");

    assert_eq!(outcome.table.index_columns, vec!["x", "y"]);
    assert_eq!(
        outcome.table.value_columns,
        vec!["PmtR11410_1", "PmtR11410_2", "PmtR11410_7", "PmtR11410_total"]
    );
    assert_eq!(outcome.table.len(), 4);
    assert_eq!(outcome.report.total_points, 5);
    assert_eq!(outcome.report.present, 4);
    assert_eq!(outcome.report.missing.len(), 1);
    assert_eq!(outcome.report.missing[0].key, points[4].key());
    assert!(matches!(
        outcome.report.missing[0].reason,
        MissingReason::NoResultFile { .. }
    ));

    let first = &points[0];
    let index = [first.x, first.y];
    assert_eq!(outcome.table.value(&index, "PmtR11410_1"), Some(0.5));
    assert_eq!(outcome.table.value(&index, "PmtR11410_2"), Some(0.1));
    assert_eq!(outcome.table.value(&index, "PmtR11410_7"), Some(0.0));
    assert_eq!(outcome.table.value(&index, "PmtR11410_total"), Some(0.6));
    assert!(outcome.table.row(&[points[4].x, points[4].y]).is_none());
}

#[test]
fn s1_tables_keep_the_depth_index() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S1, &Pitch::new(20.0, 20.0, 25.0)).expect("sample");
    for point in &points {
        write_point(&dirs, point, &pmt_artifact(10, &[(1, 1.0)]));
    }

    let outcome = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S1),
    )
    .build(&points)
    .expect("build");

    assert_eq!(outcome.table.index_columns, vec!["x", "y", "z"]);
    assert_eq!(outcome.table.len(), points.len());
    assert!(outcome.report.missing.is_empty());
    let indices: Vec<_> = outcome.table.rows.iter().map(|row| row.index.clone()).collect();
    let mut sorted = indices.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
    assert_eq!(indices, sorted);
}

#[test]
fn zero_photon_points_are_reported_separately() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S2, &Pitch::new(20.0, 20.0, 20.0)).expect("sample");
    write_point(&dirs, &points[0], &pmt_artifact(100, &[(1, 5.0)]));
    write_point(&dirs, &points[1], &pmt_artifact(0, &[(1, 5.0)]));

    let outcome = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S2),
    )
    .build(&points)
    .expect("build");

    assert_eq!(outcome.table.len(), 1);
    assert_eq!(outcome.report.zero_photon_points(), 1);
    assert_eq!(outcome.report.missing.len(), 4);
}

#[test]
fn missing_baseline_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S2, &Pitch::new(20.0, 20.0, 20.0)).expect("sample");
    write_point(&dirs, &points[1], &pmt_artifact(100, &[(1, 5.0)]));

    let err = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S2),
    )
    .build(&points)
    .unwrap_err();
    assert_eq!(err.info().code, "no-baseline-file");
    assert_eq!(
        err.info().context.get("point").map(String::as_str),
        Some(points[0].key().to_string().as_str())
    );
}

#[test]
fn tracking_grid_is_dense_with_zeroed_gaps() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_tracking_points(&detector, &Pitch::new(2.0, 2.0, 2.0), 4.0).expect("sample");
    assert_eq!(points.len(), 9);

    for point in &points[1..] {
        write_point(&dirs, point, &pmt_artifact(200, &[(7, 20.0), (1, 100.0)]));
    }

    let outcome = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Tracking, SignalKind::S2),
    )
    .build(&points)
    .expect("build");

    let table = &outcome.table;
    assert_eq!(table.index_columns, vec!["dist_xy"]);
    assert_eq!(
        table.value_columns,
        vec!["PmtR11410_1", "PmtR11410_3", "PmtR11410_5"]
    );
    let distances: Vec<f64> = table.rows.iter().map(|row| row.index[0]).collect();
    assert_eq!(distances, vec![0.0, 2.0, 4.0]);

    assert_eq!(table.value(&[0.0], "PmtR11410_1"), Some(0.0));
    assert_eq!(table.value(&[0.0], "PmtR11410_3"), Some(0.1));
    assert_eq!(table.value(&[4.0], "PmtR11410_5"), Some(0.1));
    assert_eq!(outcome.report.missing.len(), 1);
}

#[test]
fn generated_tables_are_reproducible() {
    let dir = tempdir().expect("tempdir");
    let catalog_detector = small_detector();
    let config = RunConfig::from_json_str(&format!(
        r#"{{
            "detector": "SMALL",
            "table_type": "energy",
            "signal_type": "S2",
            "sensor": "{PMT}",
            "pitch": [20.0, 20.0, 20.0],
            "photons_per_point": 100,
            "base_dir": "{}"
        }}"#,
        dir.path().display()
    ))
    .expect("config");
    let dirs = WorkingDirs::under(&config.base_dir, &config.detector);
    let points = sample_energy_points(&catalog_detector, SignalKind::S2, &config.pitch)
        .expect("sample");
    for (position, point) in points.iter().enumerate() {
        write_point(
            &dirs,
            point,
            &pmt_artifact(100, &[(1, position as f64), (2, 3.0)]),
        );
    }

    let first = generate_table(&SqliteResults, &config, &catalog_detector, &dirs, &points)
        .expect("first");
    let stored = load_light_table(&first.path).expect("load");
    assert_eq!(stored, first.outcome.table);
    assert_eq!(stored.fingerprint().expect("hash"), first.table_sha256);

    let second = generate_table(&SqliteResults, &config, &catalog_detector, &dirs, &points)
        .expect("second");
    assert_eq!(second.table_sha256, first.table_sha256);
    assert_eq!(load_light_table(&second.path).expect("reload"), stored);

    let config_table = load_config(&second.path).expect("config table");
    assert_eq!(config_table.get("detector"), Some("SMALL"));
    assert_eq!(config_table.get("table_sha256"), Some(first.table_sha256.as_str()));
    assert_eq!(config_table.get("missing_points"), Some("0"));
    assert_eq!(config_table.get("events_per_point"), Some("1"));
    assert_eq!(config_table.len(), 22);
}

#[test]
fn sensors_listed_twice_are_counted_once() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S2, &Pitch::new(20.0, 20.0, 20.0)).expect("sample");
    let repeated = pmt_artifact(100, &[(1, 50.0), (7, 25.0)])
        .sensor(1, PMT, 0.0, 0.0)
        .sensor(7, PMT, 25.0, 25.0);
    write_point(&dirs, &points[0], &repeated);

    let energy = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S2),
    )
    .build(&points[..1])
    .expect("energy");
    assert_eq!(energy.table.value_columns.len(), 4);
    let index = [points[0].x, points[0].y];
    assert_eq!(energy.table.value(&index, "PmtR11410_1"), Some(0.5));
    assert_eq!(energy.table.value(&index, "PmtR11410_total"), Some(0.75));

    let tracking_points =
        sample_tracking_points(&detector, &Pitch::new(2.0, 2.0, 2.0), 0.0).expect("sample");
    write_point(&dirs, &tracking_points[0], &repeated);
    let tracking = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Tracking, SignalKind::S2),
    )
    .build(&tracking_points[..1])
    .expect("tracking");
    assert_eq!(tracking.table.value(&[0.0], "PmtR11410_1"), Some(0.25));
}

#[test]
fn present_points_without_reference_charge_give_zero_cells() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_tracking_points(&detector, &Pitch::new(2.0, 2.0, 2.0), 2.0).expect("sample");
    assert_eq!(points.len(), 6);
    for point in &points {
        write_point(&dirs, point, &pmt_artifact(200, &[(7, 20.0)]));
    }
    write_point(&dirs, &points[4], &pmt_artifact(200, &[(1, 80.0), (2, 40.0)]));

    let outcome = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Tracking, SignalKind::S2),
    )
    .build(&points)
    .expect("build");

    assert_eq!(outcome.report.present, 6);
    assert!(outcome.report.missing.is_empty());
    assert_eq!(outcome.table.value(&[2.0], "PmtR11410_3"), Some(0.0));
    assert_eq!(outcome.table.value(&[2.0], "PmtR11410_1"), Some(0.1));
    assert_eq!(outcome.table.value(&[0.0], "PmtR11410_3"), Some(0.1));
}

#[test]
fn corrupt_artifacts_are_unreadable_not_empty() {
    let dir = tempdir().expect("tempdir");
    let detector = small_detector();
    let dirs = WorkingDirs::under(dir.path(), "SMALL");
    let points =
        sample_energy_points(&detector, SignalKind::S2, &Pitch::new(20.0, 20.0, 20.0)).expect("sample");
    write_point(&dirs, &points[0], &pmt_artifact(100, &[(1, 5.0)]));

    let corrupt = dirs.point_files("SMALL", &points[1].key()).result;
    std::fs::write(&corrupt, b"truncated simulator output").expect("corrupt");

    let mut no_count = pmt_artifact(100, &[(1, 5.0)]);
    no_count
        .configuration
        .retain(|(key, _)| key != lt_sim::PHOTONS_PER_EVENT_KEY);
    write_point(&dirs, &points[2], &no_count);

    let outcome = TableBuilder::new(
        &SqliteResults,
        &dirs,
        request(&detector, TableKind::Energy, SignalKind::S2),
    )
    .build(&points[..3])
    .expect("build");

    assert_eq!(outcome.report.present, 1);
    assert!(matches!(
        outcome.report.missing[0].reason,
        MissingReason::Unreadable { .. }
    ));
    assert_eq!(outcome.report.missing[0].key, points[1].key());
    assert!(matches!(
        outcome.report.missing[1].reason,
        MissingReason::ZeroPhotons { .. }
    ));
    assert_eq!(outcome.report.zero_photon_points(), 1);
}

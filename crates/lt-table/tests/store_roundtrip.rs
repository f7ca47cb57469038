use std::fs;

use lt_table::{
    append_config, load_config, load_light_table, write_light_table, ConfigTable, LightTable,
    TableRow,
};
use tempfile::tempdir;

fn tracking_table() -> LightTable {
    let mut table = LightTable::new(
        vec!["dist_xy".into()],
        vec!["SiPM_0".into(), "SiPM_2".into(), "SiPM_4".into()],
    );
    for distance in [0.0, 5.0, 10.0] {
        table.rows.push(TableRow {
            index: vec![distance],
            values: vec![1.0e-3 / (distance + 1.0), 0.0, f64::MIN_POSITIVE],
        });
    }
    table
}

#[test]
fn light_table_round_trips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("table").join("NEXT100.tracking.S2.SiPM.LightTable.sqlite");
    let table = tracking_table();
    write_light_table(&path, &table).expect("write");
    assert_eq!(load_light_table(&path).expect("load"), table);
}

#[test]
fn rewriting_replaces_the_table_and_config() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite");
    let mut config = ConfigTable::new();
    config.push("detector", "NEXT100");

    write_light_table(&path, &tracking_table()).expect("write");
    append_config(&path, &config).expect("config");

    let mut smaller = tracking_table();
    smaller.rows.truncate(1);
    write_light_table(&path, &smaller).expect("rewrite");
    assert_eq!(load_light_table(&path).expect("load"), smaller);
    assert!(load_config(&path).expect("config").is_empty());
}

#[test]
fn failed_rewrites_keep_the_previous_store() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite");
    let table = tracking_table();
    write_light_table(&path, &table).expect("write");
    let mut config = ConfigTable::new();
    config.push("detector", "NEXT100");
    append_config(&path, &config).expect("config");

    let mut ragged = tracking_table();
    ragged.rows[1].values.pop();
    let err = write_light_table(&path, &ragged).unwrap_err();
    assert_eq!(err.info().code, "store-write");

    let mut clashing = tracking_table();
    clashing.value_columns[1] = clashing.value_columns[0].clone();
    let err = write_light_table(&path, &clashing).unwrap_err();
    assert_eq!(err.info().code, "store-write");

    assert_eq!(load_light_table(&path).expect("load"), table);
    assert_eq!(load_config(&path).expect("config"), config);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["store.sqlite"]);
}

#[test]
fn config_sections_append() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite");
    write_light_table(&path, &tracking_table()).expect("write");

    let mut first = ConfigTable::new();
    first.push("detector", "NEXT100");
    first.push("pitch_x", format!("{:?}", 2.0));
    let mut second = ConfigTable::new();
    second.push("note", "rerun");
    append_config(&path, &first).expect("first");
    append_config(&path, &second).expect("second");

    let stored = load_config(&path).expect("load");
    assert_eq!(
        stored.entries,
        vec![
            ("detector".to_string(), "NEXT100".to_string()),
            ("pitch_x".to_string(), "2.0".to_string()),
            ("note".to_string(), "rerun".to_string()),
        ]
    );
}

#[test]
fn foreign_files_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("garbage.sqlite");
    fs::write(&path, b"not a database").expect("write");
    let err = load_light_table(&path).unwrap_err();
    assert!(matches!(
        err.info().code.as_str(),
        "store-open" | "store-schema"
    ));
}

#[test]
fn tables_without_index_are_refused() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite");
    let table = LightTable::new(Vec::new(), vec!["SiPM_0".into()]);
    let err = write_light_table(&path, &table).unwrap_err();
    assert_eq!(err.info().code, "store-write");
    assert!(!path.exists());
}

use std::path::PathBuf;

use log::info;
use lt_core::{DetectorSpec, LtError, RunConfig, SamplePoint};
use lt_sim::{ResultReader, WorkingDirs};

use crate::builder::{BuildOutcome, TableBuilder, TableRequest};
use crate::config_table::{ConfigSource, ConfigTable};
use crate::store::{append_config, write_light_table};

/// A light table that has been built and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTable {
    pub outcome: BuildOutcome,
    pub config: ConfigTable,
    pub table_sha256: String,
    pub path: PathBuf,
}

/// Builds the table requested by `config` over `points` and writes it,
/// together with its configuration, into the table directory.
pub fn generate_table<R: ResultReader + ?Sized>(
    reader: &R,
    config: &RunConfig,
    detector: &DetectorSpec,
    dirs: &WorkingDirs,
    points: &[SamplePoint],
) -> Result<GeneratedTable, LtError> {
    let request = TableRequest {
        detector_name: &config.detector,
        detector,
        table: config.table_type,
        signal: config.signal_type,
        sensor: &config.sensor,
    };
    let outcome = TableBuilder::new(reader, dirs, request).build(points)?;
    let table_sha256 = outcome.table.fingerprint()?;
    let path = dirs.table_path(
        &config.detector,
        config.table_type,
        config.signal_type,
        &config.sensor,
    );
    let config_table = ConfigTable::describe(&ConfigSource {
        config,
        detector,
        dirs,
        report: &outcome.report,
        table_sha256: &table_sha256,
        table_path: &path,
    });

    write_light_table(&path, &outcome.table)?;
    append_config(&path, &config_table)?;
    info!("light table {} stored in {}", table_sha256, path.display());
    Ok(GeneratedTable {
        outcome,
        config: config_table,
        table_sha256,
        path,
    })
}

//! Consistency checks over a directory of result artifacts.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use log::{info, warn};
use lt_core::{ErrorInfo, LtError};
use lt_sim::{ResultReader, SqliteResults, PHOTONS_PER_EVENT_KEY, RESULT_EXTENSION};
use serde::Serialize;

/// Findings of [`check_results`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub scanned: usize,
    /// Files listing some sensor more than once.
    pub duplicated_positions: Vec<PathBuf>,
    /// Files without the photons-per-event run parameter.
    pub missing_photons: Vec<PathBuf>,
    /// Files that could not be read at all.
    pub unreadable: Vec<PathBuf>,
    /// Files deleted because they lacked photon metadata.
    pub removed: Vec<PathBuf>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.duplicated_positions.is_empty()
            && self.missing_photons.is_empty()
            && self.unreadable.is_empty()
    }
}

/// Scans every result artifact directly under `dir`. With `remove`, files
/// lacking photon metadata are deleted.
pub fn check_results(dir: &Path, remove: bool) -> Result<CheckReport, LtError> {
    let pattern = dir.join(format!("*.{RESULT_EXTENSION}"));
    let pattern = pattern.to_string_lossy();
    let entries = glob(&pattern).map_err(|err| {
        LtError::Config(
            ErrorInfo::new("invalid-pattern", err.to_string()).with_context("pattern", &*pattern),
        )
    })?;
    let mut files = Vec::new();
    for entry in entries {
        files.push(entry.map_err(|err| LtError::io("results-scan", err.path(), err.error()))?);
    }
    files.sort();

    let reader = SqliteResults;
    let mut report = CheckReport::default();
    for file in files {
        report.scanned += 1;
        let positions = match reader.sensor_positions(&file) {
            Ok(positions) => positions,
            Err(err) => {
                warn!("{}: {err}", file.display());
                report.unreadable.push(file);
                continue;
            }
        };
        let mut seen = BTreeSet::new();
        if !positions.iter().all(|sensor| seen.insert(sensor.sensor_id)) {
            warn!("{}: sensor duplicated positions", file.display());
            report.duplicated_positions.push(file.clone());
        }

        let has_photons = reader
            .run_config(&file)
            .map(|params| params.contains_key(PHOTONS_PER_EVENT_KEY))
            .unwrap_or(false);
        if !has_photons {
            warn!("{}: no photons info", file.display());
            if remove {
                fs::remove_file(&file).map_err(|err| LtError::io("results-remove", &file, err))?;
                info!("removed {}", file.display());
                report.removed.push(file.clone());
            }
            report.missing_photons.push(file);
        }
    }
    Ok(report)
}

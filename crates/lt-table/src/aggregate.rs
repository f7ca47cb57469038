//! Reduction of one result artifact to detection probabilities.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use lt_core::{ErrorInfo, LtError};
use lt_sim::{try_photons_simulated, ResultReader, SensorCharge, MISSING_PARAM};
use serde::{Deserialize, Serialize};

/// Sorted ids of the sensors that become table columns.
///
/// Discovered once from a baseline artifact and then held fixed while the
/// remaining points are filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSchema {
    sensor_ids: Vec<u32>,
}

impl SensorSchema {
    pub fn new(mut sensor_ids: Vec<u32>) -> Self {
        sensor_ids.sort_unstable();
        sensor_ids.dedup();
        Self { sensor_ids }
    }

    /// Reads the sensors of kind `sensor_kind` from the artifact at `path`.
    pub fn discover<R: ResultReader + ?Sized>(
        reader: &R,
        path: &Path,
        sensor_kind: &str,
    ) -> Result<Self, LtError> {
        if !path.is_file() {
            return Err(LtError::Baseline(
                ErrorInfo::new("no-baseline-file", "baseline result does not exist")
                    .with_context("path", path.display().to_string())
                    .with_hint("simulate the first point before building the table"),
            ));
        }
        let types = reader.sensor_types(path).map_err(|err| {
            LtError::Baseline(
                ErrorInfo::new("no-baseline-file", "baseline result is unreadable")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
        let ids: Vec<u32> = types
            .into_iter()
            .filter(|(_, kind)| kind == sensor_kind)
            .map(|(id, _)| id)
            .collect();
        if ids.is_empty() {
            return Err(LtError::Baseline(
                ErrorInfo::new("empty-schema", "baseline result has no sensor of this kind")
                    .with_context("path", path.display().to_string())
                    .with_context("sensor", sensor_kind),
            ));
        }
        Ok(Self::new(ids))
    }

    pub fn sensor_ids(&self) -> &[u32] {
        &self.sensor_ids
    }

    pub fn len(&self) -> usize {
        self.sensor_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor_ids.is_empty()
    }
}

/// What to extract from an artifact.
#[derive(Debug, Clone, Copy)]
pub enum Aggregation<'a> {
    /// Every sensor of the schema, plus their total.
    Energy {
        sensor_kind: &'a str,
        schema: &'a SensorSchema,
    },
    /// The reference sensor only.
    Tracking { sensor_kind: &'a str, ref_sensor: u32 },
}

/// Detection probabilities of one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointResult {
    /// One entry per schema sensor (energy) or a single entry (tracking).
    pub probabilities: Vec<f64>,
    /// Sum over sensors; energy tables only.
    pub total: Option<f64>,
    /// Photons the probabilities were normalized by.
    pub photons: u64,
}

/// Why a point has no [`PointResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissingReason {
    /// The simulation has not produced its artifact (yet).
    NoResultFile { path: PathBuf },
    /// The artifact records no photons, or no photon count at all, so
    /// nothing can be normalized.
    ZeroPhotons { path: PathBuf },
    /// The artifact exists but its sensor data cannot be used.
    Unreadable { path: PathBuf, cause: String },
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::NoResultFile { path } => write!(f, "{} does not exist", path.display()),
            MissingReason::ZeroPhotons { path } => {
                write!(f, "{} records zero photons", path.display())
            }
            MissingReason::Unreadable { path, cause } => {
                write!(f, "{} is unreadable: {cause}", path.display())
            }
        }
    }
}

/// Normalized sensor response of the artifact at `path`.
pub fn aggregate<R: ResultReader + ?Sized>(
    reader: &R,
    path: &Path,
    aggregation: Aggregation<'_>,
) -> Result<PointResult, MissingReason> {
    if !path.is_file() {
        return Err(MissingReason::NoResultFile {
            path: path.to_path_buf(),
        });
    }
    let photons = match try_photons_simulated(reader, path) {
        Ok(photons) => photons,
        Err(err) if err.info().code == MISSING_PARAM => 0,
        Err(err) => return Err(unreadable(path, err.to_string())),
    };
    if photons == 0 {
        return Err(MissingReason::ZeroPhotons {
            path: path.to_path_buf(),
        });
    }
    let sensor_kind = match aggregation {
        Aggregation::Energy { sensor_kind, .. } | Aggregation::Tracking { sensor_kind, .. } => {
            sensor_kind
        }
    };
    let response = reader
        .sensor_response(path, Some(sensor_kind))
        .map_err(|err| unreadable(path, err.to_string()))?;
    let charges = charge_per_sensor(&response).map_err(|cause| unreadable(path, cause))?;
    let norm = photons as f64;

    match aggregation {
        Aggregation::Energy { schema, .. } => {
            let unknown = charges
                .keys()
                .filter(|id| schema.sensor_ids().binary_search(*id).is_err())
                .count();
            if unknown > 0 {
                debug!("{}: ignoring {unknown} sensors outside the schema", path.display());
            }
            let probabilities: Vec<f64> = schema
                .sensor_ids()
                .iter()
                .map(|id| charges.get(id).copied().unwrap_or(0.0) / norm)
                .collect();
            let total = probabilities.iter().sum();
            Ok(PointResult {
                probabilities,
                total: Some(total),
                photons,
            })
        }
        Aggregation::Tracking { ref_sensor, .. } => {
            let charge = charges.get(&ref_sensor).copied().unwrap_or(0.0);
            Ok(PointResult {
                probabilities: vec![charge / norm],
                total: None,
                photons,
            })
        }
    }
}

fn charge_per_sensor(response: &[SensorCharge]) -> Result<BTreeMap<u32, f64>, String> {
    let mut charges = BTreeMap::new();
    for row in response {
        if !(row.charge.is_finite() && row.charge >= 0.0) {
            return Err(format!(
                "sensor {} has charge {} in event {}",
                row.sensor_id, row.charge, row.event_id
            ));
        }
        *charges.entry(row.sensor_id).or_insert(0.0) += row.charge;
    }
    Ok(charges)
}

fn unreadable(path: &Path, cause: String) -> MissingReason {
    MissingReason::Unreadable {
        path: path.to_path_buf(),
        cause,
    }
}

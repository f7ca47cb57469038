//! Run configuration read by the `lighttable` driver.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::budget::PhotonBudget;
use crate::detectors::{DetectorCatalog, DetectorSpec};
use crate::errors::{ErrorInfo, LtError};
use crate::types::{Pitch, SignalKind, TableKind};

/// JSON-configurable parameters of one light table production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Detector name, looked up in the detector catalog.
    pub detector: String,
    pub table_type: TableKind,
    pub signal_type: SignalKind,
    /// Sensor kind the table is built for, e.g. `PmtR11410` or `SiPM`.
    pub sensor: String,
    /// Sampling step in millimetres, `[x, y, z]`.
    pub pitch: Pitch,
    /// Photons to simulate from every point.
    pub photons_per_point: u64,
    /// Largest radial distance sampled by tracking tables, in millimetres.
    #[serde(default = "default_tracking_max_distance")]
    pub tracking_max_distance: f64,
    /// Launch the simulations of every point.
    #[serde(default)]
    pub run_simulations: bool,
    /// Aggregate the available results into a table.
    #[serde(default = "default_true")]
    pub generate_table: bool,
    /// Root of the per-detector working directories.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Optional YAML/JSON catalog replacing the built-in detectors.
    #[serde(default)]
    pub detector_catalog: Option<PathBuf>,
    /// How simulations are launched when `run_simulations` is set.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Simulator launch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Simulator executable.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Record the jobs instead of executing them.
    #[serde(default)]
    pub dry_run: bool,
    /// Seed of the first point; later points use consecutive seeds.
    #[serde(default)]
    pub seed: u64,
    /// Geometry macro block prepended to every per-point config macro.
    #[serde(default)]
    pub geometry_template: Option<PathBuf>,
    /// Init macro template; `{det_name}`, `{init_fname}` and
    /// `{config_fname}` are filled in per point.
    #[serde(default)]
    pub init_template: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            dry_run: false,
            seed: 0,
            geometry_template: None,
            init_template: None,
        }
    }
}

fn default_tracking_max_distance() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_executable() -> PathBuf {
    PathBuf::from("nexus")
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self, LtError> {
        serde_json::from_str(text)
            .map_err(|err| LtError::Config(ErrorInfo::new("config-parse", err.to_string())))
    }

    pub fn load(path: &Path) -> Result<Self, LtError> {
        let text = fs::read_to_string(path).map_err(|err| LtError::io("config-read", path, err))?;
        Self::from_json_str(&text).map_err(|err| match err {
            LtError::Config(info) => {
                LtError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Resolves the detector catalog: the configured resource if any,
    /// otherwise the built-in one.
    pub fn catalog(&self) -> Result<DetectorCatalog, LtError> {
        match &self.detector_catalog {
            Some(path) => DetectorCatalog::load(path),
            None => Ok(DetectorCatalog::builtin().clone()),
        }
    }

    /// Checks every field that can be checked before sampling starts and
    /// returns the selected detector.
    pub fn validate<'a>(&self, catalog: &'a DetectorCatalog) -> Result<&'a DetectorSpec, LtError> {
        let detector = catalog.dimensions(&self.detector)?;
        let pitch = self.pitch.quantize()?;
        if self.sensor.trim().is_empty() {
            return Err(LtError::Config(ErrorInfo::new(
                "invalid-sensor",
                "sensor name must not be empty",
            )));
        }
        if self.photons_per_point == 0 {
            return Err(LtError::Config(ErrorInfo::new(
                "invalid-photons",
                "photons_per_point must be positive",
            )));
        }
        if self.table_type == TableKind::Tracking {
            if pitch.x != pitch.y {
                return Err(LtError::invalid_pitch(
                    "pitch_x must be equal to pitch_y for tracking tables",
                ));
            }
            if pitch.z as f64 > detector.el_gap.trunc() {
                return Err(LtError::invalid_pitch(
                    "pitch_z must be equal or lower than the detector EL gap",
                ));
            }
            if !(self.tracking_max_distance.is_finite() && self.tracking_max_distance >= 0.0) {
                return Err(LtError::Config(
                    ErrorInfo::new("invalid-distance", "tracking_max_distance must be non-negative")
                        .with_context("value", self.tracking_max_distance.to_string()),
                ));
            }
            if self.pitch.z > 2.0 {
                warn!("pitch z of {} mm is unusually big for a tracking table", self.pitch.z);
            }
        }
        Ok(detector)
    }

    pub fn budget(&self) -> PhotonBudget {
        PhotonBudget::split(self.photons_per_point)
    }
}

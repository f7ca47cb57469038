use std::path::Path;

use lt_core::{DetectorSpec, RunConfig};
use lt_sim::WorkingDirs;
use serde::{Deserialize, Serialize};

use crate::builder::BuildReport;

/// Ordered `parameter -> value` pairs stored next to a light table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTable {
    pub entries: Vec<(String, String)>,
}

/// Everything a [`ConfigTable`] records about one table build.
pub struct ConfigSource<'a> {
    pub config: &'a RunConfig,
    pub detector: &'a DetectorSpec,
    pub dirs: &'a WorkingDirs,
    pub report: &'a BuildReport,
    pub table_sha256: &'a str,
    pub table_path: &'a Path,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parameter: impl Into<String>, value: impl ToString) {
        self.entries.push((parameter.into(), value.to_string()));
    }

    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn describe(source: &ConfigSource<'_>) -> Self {
        let config = source.config;
        let detector = source.detector;
        let budget = config.budget();
        let mut table = Self::new();
        table.push("detector", &config.detector);
        table.push("ACTIVE_rad", float(detector.active_radius));
        table.push("ACTIVE_length", float(detector.active_length));
        table.push("BUFFER_length", float(detector.buffer_length));
        table.push("EL_GAP", float(detector.el_gap));
        table.push("reference_sensor_id", detector.ref_sensor.id);
        table.push("table_type", config.table_type);
        table.push("signal_type", config.signal_type);
        table.push("sensor", &config.sensor);
        table.push("pitch_x", float(config.pitch.x));
        table.push("pitch_y", float(config.pitch.y));
        table.push("pitch_z", float(config.pitch.z));
        table.push("photons_per_point", budget.photons_per_point);
        table.push("photons_per_event", budget.photons_per_event);
        table.push("events_per_point", budget.events_per_point);
        table.push("total_points", source.report.total_points);
        table.push("missing_points", source.report.missing.len());
        table.push("table_sha256", source.table_sha256);
        table.push("table_path", source.table_path.display());
        table.push("dst_path", source.dirs.dst.display());
        table.push("config_path", source.dirs.config.display());
        table.push("log_path", source.dirs.log.display());
        table
    }
}

fn float(value: f64) -> String {
    format!("{value:?}")
}

//! Static detector dimensions used to lay out sample points.
//!
//! The built-in catalog mirrors the geometries the simulator ships with.
//! Other catalogs can be loaded from a YAML or JSON resource with the same
//! shape, which is how new geometries (or a database export) are plugged in
//! without touching the sampling code.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, LtError};

/// Sensor used as the origin of tracking-table radial sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefSensor {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

/// Dimensions of a detector, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub active_radius: f64,
    pub active_length: f64,
    pub buffer_length: f64,
    pub el_gap: f64,
    pub ref_sensor: RefSensor,
}

impl DetectorSpec {
    /// Active plus buffer length, the depth range S1 light is sampled over.
    pub fn drift_length(&self) -> f64 {
        self.active_length + self.buffer_length
    }

    fn validate(&self, name: &str) -> Result<(), LtError> {
        let dims = [
            ("active_radius", self.active_radius),
            ("active_length", self.active_length),
            ("buffer_length", self.buffer_length),
            ("el_gap", self.el_gap),
        ];
        for (field, value) in dims {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LtError::Config(
                    ErrorInfo::new("invalid-detector", "detector dimensions must be non-negative")
                        .with_context("detector", name)
                        .with_context("field", field)
                        .with_context("value", value.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Read-only mapping from detector name to dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorCatalog {
    entries: BTreeMap<String, DetectorSpec>,
}

impl DetectorCatalog {
    /// Builds a catalog from explicit entries.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, DetectorSpec)>,
    ) -> Result<Self, LtError> {
        let entries: BTreeMap<_, _> = entries.into_iter().collect();
        for (name, spec) in &entries {
            spec.validate(name)?;
        }
        Ok(Self { entries })
    }

    /// The geometries known to the simulator.
    pub fn builtin() -> &'static DetectorCatalog {
        static BUILTIN: OnceLock<DetectorCatalog> = OnceLock::new();
        BUILTIN.get_or_init(builtin_catalog)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, LtError> {
        let entries: BTreeMap<String, DetectorSpec> = serde_yaml::from_str(text)
            .map_err(|err| LtError::Config(ErrorInfo::new("catalog-parse", err.to_string())))?;
        Self::from_entries(entries)
    }

    pub fn from_json_str(text: &str) -> Result<Self, LtError> {
        let entries: BTreeMap<String, DetectorSpec> = serde_json::from_str(text)
            .map_err(|err| LtError::Config(ErrorInfo::new("catalog-parse", err.to_string())))?;
        Self::from_entries(entries)
    }

    /// Loads a catalog resource; `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn load(path: &Path) -> Result<Self, LtError> {
        let text = fs::read_to_string(path).map_err(|err| LtError::io("catalog-read", path, err))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// Looks up the dimensions of `name`.
    pub fn dimensions(&self, name: &str) -> Result<&DetectorSpec, LtError> {
        self.entries
            .get(name)
            .ok_or_else(|| LtError::unknown_detector(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Looks up `name` in the built-in catalog.
pub fn dimensions(name: &str) -> Result<&'static DetectorSpec, LtError> {
    DetectorCatalog::builtin().dimensions(name)
}

fn builtin_catalog() -> DetectorCatalog {
    const NEW: (f64, f64, f64) = (208.0, 532.0, 129.9);
    const HUNDRED: (f64, f64, f64) = (492.0, 1204.95, 254.6);

    fn spec(dims: (f64, f64, f64), el_gap: f64, sensor: (u32, f64, f64)) -> DetectorSpec {
        DetectorSpec {
            active_radius: dims.0,
            active_length: dims.1,
            buffer_length: dims.2,
            el_gap,
            ref_sensor: RefSensor {
                id: sensor.0,
                x: sensor.1,
                y: sensor.2,
            },
        }
    }

    let flex = spec(HUNDRED, 10.0, (2546, 0.0, 0.0));
    let entries = [
        ("NEXT_NEW", spec(NEW, 6.0, (17018, 25.0, 25.0))),
        ("NEXT100", spec(HUNDRED, 10.0, (33000, 7.83, 7.83))),
        ("FLEX100", flex),
        ("FLEX100_M10", flex),
        ("FLEX100_M12", flex),
        ("FLEX100_M6_O6", flex),
        ("FLEX100_7_3", spec(HUNDRED, 7.0, (2546, 0.0, 0.0))),
        ("FLEX_NEW", spec(NEW, 6.0, (1656, 0.0, 0.0))),
        ("TEST", flex),
    ];
    DetectorCatalog {
        entries: entries
            .into_iter()
            .map(|(name, spec)| (name.to_string(), spec))
            .collect(),
    }
}

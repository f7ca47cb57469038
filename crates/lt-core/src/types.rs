use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LtError;

/// Layout of the table being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Cartesian table over the energy plane (one column per sensor).
    Energy,
    /// Radial table around the reference sensor of the tracking plane.
    Tracking,
}

impl TableKind {
    /// Lower-case name used in file names and provenance records.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Energy => "energy",
            TableKind::Tracking => "tracking",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = LtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "energy" => Ok(TableKind::Energy),
            "tracking" => Ok(TableKind::Tracking),
            other => Err(LtError::invalid_kind("table_type", other)),
        }
    }
}

/// Light emission process the table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Primary scintillation, produced along the whole drift length.
    S1,
    /// Electroluminescence, produced inside the EL gap.
    S2,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::S1 => "S1",
            SignalKind::S2 => "S2",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = LtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1" => Ok(SignalKind::S1),
            "S2" => Ok(SignalKind::S2),
            other => Err(LtError::invalid_kind("signal_type", other)),
        }
    }
}

/// Sampling step along each axis, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Pitch {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pitch {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Truncates every component to whole millimetres.
    ///
    /// Components that truncate to zero or below cannot drive a sampling
    /// loop and are rejected.
    pub fn quantize(&self) -> Result<QuantizedPitch, LtError> {
        let quantized = QuantizedPitch {
            x: self.x.trunc() as i64,
            y: self.y.trunc() as i64,
            z: self.z.trunc() as i64,
        };
        if quantized.x < 1 || quantized.y < 1 || quantized.z < 1 || !self.is_finite() {
            return Err(LtError::invalid_pitch(format!(
                "pitch components must be at least 1 mm, got ({}, {}, {})",
                self.x, self.y, self.z
            )));
        }
        Ok(quantized)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Pitch {
    fn from(raw: [f64; 3]) -> Self {
        Self::new(raw[0], raw[1], raw[2])
    }
}

impl From<Pitch> for [f64; 3] {
    fn from(pitch: Pitch) -> Self {
        [pitch.x, pitch.y, pitch.z]
    }
}

/// Pitch in whole millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedPitch {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// A position to simulate, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SamplePoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Content-addressed identifier for this point.
    pub fn key(&self) -> PointKey {
        PointKey::from_point(self)
    }
}

/// Stable identifier of a sample point, independent of any file layout.
///
/// Coordinates are stored in whole micrometres so that two points that
/// print the same in millimetres always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointKey {
    x_um: i64,
    y_um: i64,
    z_um: i64,
}

impl PointKey {
    pub fn from_point(point: &SamplePoint) -> Self {
        Self {
            x_um: to_micrometres(point.x),
            y_um: to_micrometres(point.y),
            z_um: to_micrometres(point.z),
        }
    }

    /// Returns the point this key identifies.
    pub fn point(&self) -> SamplePoint {
        SamplePoint::new(
            self.x_um as f64 / 1000.0,
            self.y_um as f64 / 1000.0,
            self.z_um as f64 / 1000.0,
        )
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x_{}.y_{}.z_{}",
            format_mm(self.x_um),
            format_mm(self.y_um),
            format_mm(self.z_um)
        )
    }
}

fn to_micrometres(mm: f64) -> i64 {
    (mm * 1000.0).round() as i64
}

fn format_mm(um: i64) -> String {
    if um % 1000 == 0 {
        format!("{}", um / 1000)
    } else {
        format!("{}", um as f64 / 1000.0)
    }
}

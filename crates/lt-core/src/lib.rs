#![doc = "Core types, detector catalog and run configuration for light table generation."]

pub mod budget;
pub mod config;
pub mod detectors;
pub mod errors;
pub mod hash;
mod types;

pub use budget::{PhotonBudget, MAX_PHOTONS_PER_EVENT};
pub use config::{RunConfig, SimulatorConfig};
pub use detectors::{dimensions, DetectorCatalog, DetectorSpec, RefSensor};
pub use errors::{ErrorInfo, LtError};
pub use hash::{stable_hash_string, to_canonical_json_bytes};
pub use types::{PointKey, Pitch, QuantizedPitch, SamplePoint, SignalKind, TableKind};

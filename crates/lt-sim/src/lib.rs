//! Simulation side of light table production: result artifacts, photon
//! reconciliation, file layout and job launching.

pub mod jobs;
pub mod launch;
pub mod macros;
pub mod paths;
pub mod reconcile;
pub mod results;

pub use jobs::{JobRunner, LocalRunner, RecordingRunner, SimJob};
pub use launch::{launch_points, LaunchSummary, Production};
pub use macros::{geometry_tag, init_detector_name, write_point_macros, MacroSettings};
pub use paths::{table_file_name, PointFiles, WorkingDirs, RESULT_EXTENSION};
pub use reconcile::{
    photons_simulated, plan_simulation, try_photons_simulated, SimDecision, MISSING_PARAM,
};
pub use results::{
    write_result_artifact, ResultArtifact, ResultReader, SensorCharge, SensorPosition,
    SqliteResults, NUM_EVENTS_KEY, PHOTONS_PER_EVENT_KEY,
};

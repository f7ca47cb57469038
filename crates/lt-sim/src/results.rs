//! Access to the artifacts the simulator writes for every point.
//!
//! An artifact is a SQLite file with three tables:
//!
//! * `configuration(param_key, param_value)`: run parameters, including the
//!   number of events and the photons generated per event;
//! * `sns_positions(sensor_id, sensor_name, x, y, z)`: every sensor of the
//!   geometry;
//! * `sns_response(event_id, sensor_id, charge)`: detected charge per event
//!   and sensor.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lt_core::{ErrorInfo, LtError};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

/// Run parameter holding the number of simulated events.
pub const NUM_EVENTS_KEY: &str = "num_events";
/// Run parameter holding the photons generated per event.
pub const PHOTONS_PER_EVENT_KEY: &str = "/Generator/ScintGenerator/nphotons";

/// Charge detected by one sensor in one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorCharge {
    pub event_id: i64,
    pub sensor_id: u32,
    pub charge: f64,
}

/// A sensor of the simulated geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPosition {
    pub sensor_id: u32,
    pub sensor_name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Readers of simulation result artifacts.
pub trait ResultReader {
    /// Sensor id to sensor kind for every sensor in the geometry.
    fn sensor_types(&self, path: &Path) -> Result<BTreeMap<u32, String>, LtError>;

    /// Per-event sensor charges, optionally restricted to one sensor kind.
    fn sensor_response(
        &self,
        path: &Path,
        sensor_kind: Option<&str>,
    ) -> Result<Vec<SensorCharge>, LtError>;

    /// Run parameters recorded by the simulator.
    fn run_config(&self, path: &Path) -> Result<BTreeMap<String, String>, LtError>;
}

/// Reader for SQLite result artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteResults;

impl SqliteResults {
    fn open(path: &Path) -> Result<Connection, LtError> {
        Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|err| {
            LtError::Results(
                ErrorInfo::new("results-open", "failed to open result artifact")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })
    }

    /// All sensor rows, in storage order.
    pub fn sensor_positions(&self, path: &Path) -> Result<Vec<SensorPosition>, LtError> {
        let conn = Self::open(path)?;
        let mut stmt = conn
            .prepare("SELECT sensor_id, sensor_name, x, y, z FROM sns_positions ORDER BY rowid")
            .map_err(|err| query_error(path, err))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SensorPosition {
                    sensor_id: row.get(0)?,
                    sensor_name: row.get(1)?,
                    x: row.get(2)?,
                    y: row.get(3)?,
                    z: row.get(4)?,
                })
            })
            .map_err(|err| query_error(path, err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| query_error(path, err))
    }
}

impl ResultReader for SqliteResults {
    fn sensor_types(&self, path: &Path) -> Result<BTreeMap<u32, String>, LtError> {
        Ok(self
            .sensor_positions(path)?
            .into_iter()
            .map(|sensor| (sensor.sensor_id, sensor.sensor_name))
            .collect())
    }

    fn sensor_response(
        &self,
        path: &Path,
        sensor_kind: Option<&str>,
    ) -> Result<Vec<SensorCharge>, LtError> {
        let conn = Self::open(path)?;
        match sensor_kind {
            Some(kind) => query_charges(
                &conn,
                path,
                "SELECT event_id, sensor_id, charge FROM sns_response
                 WHERE sensor_id IN (SELECT sensor_id FROM sns_positions WHERE sensor_name = ?1)
                 ORDER BY event_id, sensor_id, rowid",
                params![kind],
            ),
            None => query_charges(
                &conn,
                path,
                "SELECT event_id, sensor_id, charge FROM sns_response
                 ORDER BY event_id, sensor_id, rowid",
                params![],
            ),
        }
    }

    fn run_config(&self, path: &Path) -> Result<BTreeMap<String, String>, LtError> {
        let conn = Self::open(path)?;
        let mut stmt = conn
            .prepare("SELECT param_key, param_value FROM configuration")
            .map_err(|err| query_error(path, err))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|err| query_error(path, err))?;
        rows.collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|err| query_error(path, err))
    }
}

fn query_charges<P: rusqlite::Params>(
    conn: &Connection,
    path: &Path,
    sql: &str,
    params: P,
) -> Result<Vec<SensorCharge>, LtError> {
    let mut stmt = conn.prepare(sql).map_err(|err| query_error(path, err))?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(SensorCharge {
                event_id: row.get(0)?,
                sensor_id: row.get(1)?,
                charge: row.get(2)?,
            })
        })
        .map_err(|err| query_error(path, err))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|err| query_error(path, err))
}

fn query_error(path: &Path, err: rusqlite::Error) -> LtError {
    LtError::Results(
        ErrorInfo::new("results-query", "failed to read result artifact")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// In-memory content of a result artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultArtifact {
    pub configuration: Vec<(String, String)>,
    pub sensors: Vec<SensorPosition>,
    pub responses: Vec<SensorCharge>,
}

impl ResultArtifact {
    /// An artifact recording a run of `events` events of `photons_per_event`
    /// photons each.
    pub fn with_run(events: u64, photons_per_event: u64) -> Self {
        Self {
            configuration: vec![
                (NUM_EVENTS_KEY.to_string(), events.to_string()),
                (PHOTONS_PER_EVENT_KEY.to_string(), photons_per_event.to_string()),
            ],
            ..Self::default()
        }
    }

    pub fn sensor(mut self, sensor_id: u32, sensor_name: &str, x: f64, y: f64) -> Self {
        self.sensors.push(SensorPosition {
            sensor_id,
            sensor_name: sensor_name.to_string(),
            x,
            y,
            z: 0.0,
        });
        self
    }

    pub fn charge(mut self, event_id: i64, sensor_id: u32, charge: f64) -> Self {
        self.responses.push(SensorCharge {
            event_id,
            sensor_id,
            charge,
        });
        self
    }
}

/// Writes `artifact` to `path`, replacing any previous file.
pub fn write_result_artifact(path: &Path, artifact: &ResultArtifact) -> Result<(), LtError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| LtError::io("results-dir", parent, err))?;
    }
    if path.exists() {
        fs::remove_file(path).map_err(|err| LtError::io("results-replace", path, err))?;
    }
    let write_error = |err: rusqlite::Error| {
        LtError::Results(
            ErrorInfo::new("results-write", "failed to write result artifact")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    };
    let mut conn = Connection::open(path).map_err(write_error)?;
    conn.execute_batch(
        "CREATE TABLE configuration(param_key TEXT NOT NULL, param_value TEXT NOT NULL);
         CREATE TABLE sns_positions(
            sensor_id INTEGER NOT NULL,
            sensor_name TEXT NOT NULL,
            x REAL NOT NULL,
            y REAL NOT NULL,
            z REAL NOT NULL
         );
         CREATE TABLE sns_response(
            event_id INTEGER NOT NULL,
            sensor_id INTEGER NOT NULL,
            charge REAL NOT NULL
         );",
    )
    .map_err(write_error)?;
    let tx = conn.transaction().map_err(write_error)?;
    for (key, value) in &artifact.configuration {
        tx.execute(
            "INSERT INTO configuration(param_key, param_value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(write_error)?;
    }
    for sensor in &artifact.sensors {
        tx.execute(
            "INSERT INTO sns_positions(sensor_id, sensor_name, x, y, z) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![sensor.sensor_id, sensor.sensor_name, sensor.x, sensor.y, sensor.z],
        )
        .map_err(write_error)?;
    }
    for response in &artifact.responses {
        tx.execute(
            "INSERT INTO sns_response(event_id, sensor_id, charge) VALUES (?1, ?2, ?3)",
            params![response.event_id, response.sensor_id, response.charge],
        )
        .map_err(write_error)?;
    }
    tx.commit().map_err(write_error)
}

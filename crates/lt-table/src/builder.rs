//! Assembly of light tables from per-point results.
//!
//! Energy tables run in two phases: the sensor schema is fixed from the
//! first point's artifact, then every point is filled against it. Tracking
//! tables need no schema; their grid is fully determined by the points.

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};
use lt_core::{DetectorSpec, ErrorInfo, LtError, PointKey, SamplePoint, SignalKind, TableKind};
use lt_sim::{ResultReader, WorkingDirs};
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, Aggregation, MissingReason, SensorSchema};
use crate::table::{LightTable, TableRow};

/// Index column of tracking tables.
pub const TRACKING_INDEX: &str = "dist_xy";
/// Value column holding the sum over sensors in energy tables.
pub const TOTAL_COLUMN: &str = "total";

/// Which table to build.
#[derive(Debug, Clone, Copy)]
pub struct TableRequest<'a> {
    pub detector_name: &'a str,
    pub detector: &'a DetectorSpec,
    pub table: TableKind,
    pub signal: SignalKind,
    pub sensor: &'a str,
}

/// A point that contributed nothing to the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPoint {
    pub key: PointKey,
    pub reason: MissingReason,
}

/// Per-build bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub total_points: usize,
    pub present: usize,
    pub missing: Vec<MissingPoint>,
}

impl BuildReport {
    /// Points skipped because their artifact records no photons.
    pub fn zero_photon_points(&self) -> usize {
        self.missing
            .iter()
            .filter(|point| matches!(point.reason, MissingReason::ZeroPhotons { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub table: LightTable,
    pub report: BuildReport,
}

/// Builds light tables out of the artifacts found in a set of working
/// directories.
pub struct TableBuilder<'a, R: ResultReader + ?Sized> {
    reader: &'a R,
    dirs: &'a WorkingDirs,
    request: TableRequest<'a>,
}

impl<'a, R: ResultReader + ?Sized> TableBuilder<'a, R> {
    pub fn new(reader: &'a R, dirs: &'a WorkingDirs, request: TableRequest<'a>) -> Self {
        Self {
            reader,
            dirs,
            request,
        }
    }

    /// Builds the table for `points`, which must be in sampling order.
    pub fn build(&self, points: &[SamplePoint]) -> Result<BuildOutcome, LtError> {
        let mut outcome = match self.request.table {
            TableKind::Energy => self.build_energy(points)?,
            TableKind::Tracking => self.build_tracking(points),
        };
        outcome.table.prefix_columns(self.request.sensor);
        info!(
            "{} table: {} of {} points present, {} missing",
            self.request.table,
            outcome.report.present,
            outcome.report.total_points,
            outcome.report.missing.len()
        );
        Ok(outcome)
    }

    /// Fixes the energy-table columns from the first point's artifact.
    pub fn discover_schema(&self, points: &[SamplePoint]) -> Result<SensorSchema, LtError> {
        let first = points.first().ok_or_else(|| {
            LtError::Baseline(
                ErrorInfo::new("no-baseline-file", "no sample points to read sensors from")
                    .with_context("detector", self.request.detector_name),
            )
        })?;
        let key = first.key();
        let files = self.dirs.point_files(self.request.detector_name, &key);
        SensorSchema::discover(self.reader, &files.result, self.request.sensor).map_err(|err| {
            match err {
                LtError::Baseline(info) => {
                    LtError::Baseline(info.with_context("point", key.to_string()))
                }
                other => other,
            }
        })
    }

    fn build_energy(&self, points: &[SamplePoint]) -> Result<BuildOutcome, LtError> {
        let schema = self.discover_schema(points)?;
        let aggregation = Aggregation::Energy {
            sensor_kind: self.request.sensor,
            schema: &schema,
        };
        let keep_depth = self.request.signal == SignalKind::S1;

        let mut index_columns = vec!["x".to_string(), "y".to_string()];
        if keep_depth {
            index_columns.push("z".to_string());
        }
        let mut value_columns: Vec<String> =
            schema.sensor_ids().iter().map(|id| id.to_string()).collect();
        value_columns.push(TOTAL_COLUMN.to_string());

        let mut table = LightTable::new(index_columns, value_columns);
        let mut report = new_report(points.len());
        for point in points {
            let key = point.key();
            let files = self.dirs.point_files(self.request.detector_name, &key);
            match aggregate(self.reader, &files.result, aggregation) {
                Ok(result) => {
                    let mut index = vec![point.x, point.y];
                    if keep_depth {
                        index.push(point.z);
                    }
                    let mut values = result.probabilities;
                    values.extend(result.total);
                    table.rows.push(TableRow { index, values });
                    report.present += 1;
                }
                Err(reason) => record_missing(&mut report, key, reason),
            }
        }
        table.sort_index();
        Ok(BuildOutcome { table, report })
    }

    fn build_tracking(&self, points: &[SamplePoint]) -> BuildOutcome {
        let sensor = self.request.detector.ref_sensor;
        let aggregation = Aggregation::Tracking {
            sensor_kind: self.request.sensor,
            ref_sensor: sensor.id,
        };
        let cell = |point: &SamplePoint| {
            let distance = (point.x - sensor.x).round() as i64;
            let slice = (-point.z).floor() as i64;
            (distance, slice)
        };

        let distances: BTreeSet<i64> = points.iter().map(|p| cell(p).0).collect();
        let slices: BTreeSet<i64> = points.iter().map(|p| cell(p).1).collect();
        let columns: BTreeMap<i64, usize> = slices
            .iter()
            .enumerate()
            .map(|(position, slice)| (*slice, position))
            .collect();
        let rows: BTreeMap<i64, usize> = distances
            .iter()
            .enumerate()
            .map(|(position, distance)| (*distance, position))
            .collect();

        let mut table = LightTable::new(
            vec![TRACKING_INDEX.to_string()],
            slices.iter().map(|slice| slice.to_string()).collect(),
        );
        table.rows = distances
            .iter()
            .map(|distance| TableRow {
                index: vec![*distance as f64],
                values: vec![0.0; slices.len()],
            })
            .collect();

        let mut report = new_report(points.len());
        for point in points {
            let key = point.key();
            let files = self.dirs.point_files(self.request.detector_name, &key);
            match aggregate(self.reader, &files.result, aggregation) {
                Ok(result) => {
                    let (distance, slice) = cell(point);
                    table.rows[rows[&distance]].values[columns[&slice]] = result.probabilities[0];
                    report.present += 1;
                }
                Err(reason) => record_missing(&mut report, key, reason),
            }
        }
        BuildOutcome { table, report }
    }
}

fn new_report(total_points: usize) -> BuildReport {
    BuildReport {
        total_points,
        ..BuildReport::default()
    }
}

fn record_missing(report: &mut BuildReport, key: PointKey, reason: MissingReason) {
    match &reason {
        MissingReason::ZeroPhotons { .. } => warn!("point {key}: skipped, {reason}"),
        _ => warn!("point {key}: {reason}"),
    }
    report.missing.push(MissingPoint { key, reason });
}

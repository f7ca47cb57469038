use std::fs;
use std::path::Path;

use log::info;
use lt_core::{LtError, RunConfig, SamplePoint};
use lt_sample::sample_points;
use lt_sim::{
    launch_points, JobRunner, LaunchSummary, LocalRunner, Production, RecordingRunner,
    SqliteResults, WorkingDirs,
};
use lt_table::{generate_table, GeneratedTable};
use serde::Serialize;

/// What one `lighttable` invocation did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub points: usize,
    pub launch: Option<LaunchSummary>,
    /// Jobs recorded instead of executed, for dry runs.
    pub dry_run_jobs: usize,
    pub table_sha256: Option<String>,
    pub table_path: Option<String>,
    pub missing_points: Option<usize>,
}

/// Validates `config`, samples its points, launches the simulations and
/// builds the table, as enabled by the configuration.
pub fn generate(config: &RunConfig) -> Result<RunSummary, LtError> {
    let catalog = config.catalog()?;
    let detector = config.validate(&catalog)?;
    let budget = config.budget();
    let points = sample_points(
        detector,
        config.table_type,
        config.signal_type,
        &config.pitch,
        config.tracking_max_distance,
    )?;
    let dirs = WorkingDirs::under(&config.base_dir, &config.detector);
    dirs.ensure()?;

    info!("detector {}: {:?}", config.detector, detector);
    info!(
        "{} {} table for {} sensors, pitch {:?}",
        config.table_type, config.signal_type, config.sensor, config.pitch
    );
    info!(
        "{} points, {} photons per point in {} events of {} photons",
        points.len(),
        budget.photons_per_point,
        budget.events_per_point,
        budget.photons_per_event
    );

    let mut summary = RunSummary {
        points: points.len(),
        launch: None,
        dry_run_jobs: 0,
        table_sha256: None,
        table_path: None,
        missing_points: None,
    };

    if config.run_simulations {
        let preamble = read_template(config.simulator.geometry_template.as_deref())?;
        let init_template = read_template(config.simulator.init_template.as_deref())?;
        let production = Production {
            detector: &config.detector,
            budget,
            geometry_preamble: &preamble,
            init_template: &init_template,
            seed: config.simulator.seed,
        };
        if config.simulator.dry_run {
            let mut runner = RecordingRunner::default();
            summary.launch = Some(launch(&mut runner, &dirs, &production, &points)?);
            summary.dry_run_jobs = runner.jobs.len();
        } else {
            let mut runner = LocalRunner::new(&config.simulator.executable);
            summary.launch = Some(launch(&mut runner, &dirs, &production, &points)?);
        }
    }

    if config.generate_table {
        let GeneratedTable {
            outcome,
            table_sha256,
            path,
            ..
        } = generate_table(&SqliteResults, config, detector, &dirs, &points)?;
        summary.missing_points = Some(outcome.report.missing.len());
        summary.table_sha256 = Some(table_sha256);
        summary.table_path = Some(path.display().to_string());
    }
    Ok(summary)
}

fn launch<J: JobRunner>(
    runner: &mut J,
    dirs: &WorkingDirs,
    production: &Production<'_>,
    points: &[SamplePoint],
) -> Result<LaunchSummary, LtError> {
    launch_points(runner, &SqliteResults, dirs, production, points)
}

fn read_template(path: Option<&Path>) -> Result<String, LtError> {
    match path {
        Some(path) => {
            fs::read_to_string(path).map_err(|err| LtError::io("template-read", path, err))
        }
        None => Ok(String::new()),
    }
}

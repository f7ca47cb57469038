use log::{debug, info};
use lt_core::{LtError, PhotonBudget, SamplePoint};
use serde::{Deserialize, Serialize};

use crate::jobs::{JobRunner, SimJob};
use crate::macros::{write_point_macros, MacroSettings};
use crate::paths::WorkingDirs;
use crate::reconcile::{plan_simulation, SimDecision};
use crate::results::ResultReader;

/// Counts of what [`launch_points`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSummary {
    pub submitted: usize,
    pub rerun: usize,
    pub skipped: usize,
}

/// Everything point-independent about a simulation production.
#[derive(Debug, Clone, Copy)]
pub struct Production<'a> {
    pub detector: &'a str,
    pub budget: PhotonBudget,
    pub geometry_preamble: &'a str,
    /// Init macro template, see [`MacroSettings::init_template`].
    pub init_template: &'a str,
    /// Seed of the first point; point `i` uses `seed + i`.
    pub seed: u64,
}

/// Writes macros and submits a job for every point that lacks a complete
/// result.
pub fn launch_points<J, R>(
    runner: &mut J,
    reader: &R,
    dirs: &WorkingDirs,
    production: &Production<'_>,
    points: &[SamplePoint],
) -> Result<LaunchSummary, LtError>
where
    J: JobRunner + ?Sized,
    R: ResultReader + ?Sized,
{
    let mut summary = LaunchSummary::default();
    for (position, point) in points.iter().enumerate() {
        let key = point.key();
        let files = dirs.point_files(production.detector, &key);
        match plan_simulation(reader, &files.result, production.budget.photons_per_point) {
            SimDecision::Skip { found } => {
                debug!("point {key}: {found} photons already simulated");
                summary.skipped += 1;
                continue;
            }
            SimDecision::Rerun { found } => {
                info!(
                    "point {key}: only {found} of {} photons, simulating again",
                    production.budget.photons_per_point
                );
                summary.rerun += 1;
            }
            SimDecision::Run => {}
        }
        let settings = MacroSettings {
            detector: production.detector,
            init_template: production.init_template,
            geometry_preamble: production.geometry_preamble,
            photons_per_event: production.budget.photons_per_event,
            seed: production.seed.wrapping_add(position as u64),
        };
        write_point_macros(&files, point, &settings)?;
        runner.submit(&SimJob {
            init: files.init.clone(),
            log: files.log.clone(),
            events: production.budget.events_per_point,
        })?;
        summary.submitted += 1;
    }
    info!(
        "{} jobs submitted ({} reruns), {} points already complete",
        summary.submitted, summary.rerun, summary.skipped
    );
    Ok(summary)
}

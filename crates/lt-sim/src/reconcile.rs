//! How many photons a result artifact actually holds.

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use lt_core::{ErrorInfo, LtError};
use serde::{Deserialize, Serialize};

use crate::results::{ResultReader, NUM_EVENTS_KEY, PHOTONS_PER_EVENT_KEY};

/// Photons simulated in the run stored at `path`: events times photons per
/// event.
///
/// Missing metadata or an unreadable artifact count as zero photons, which
/// makes the point eligible for re-simulation.
pub fn photons_simulated<R: ResultReader + ?Sized>(reader: &R, path: &Path) -> u64 {
    match try_photons_simulated(reader, path) {
        Ok(photons) => photons,
        Err(err) => {
            warn!("{}: photon count unavailable: {err}", path.display());
            0
        }
    }
}

/// Like [`photons_simulated`] but reports why the count is unavailable.
pub fn try_photons_simulated<R: ResultReader + ?Sized>(
    reader: &R,
    path: &Path,
) -> Result<u64, LtError> {
    let config = reader.run_config(path)?;
    let events = run_param(&config, NUM_EVENTS_KEY, path)?;
    let photons_per_event = run_param(&config, PHOTONS_PER_EVENT_KEY, path)?;
    Ok(events.saturating_mul(photons_per_event))
}

/// Error code of a run parameter the artifact does not record.
pub const MISSING_PARAM: &str = "missing-param";

fn run_param(config: &BTreeMap<String, String>, key: &str, path: &Path) -> Result<u64, LtError> {
    let raw = config.get(key).ok_or_else(|| {
        LtError::Results(
            ErrorInfo::new(MISSING_PARAM, "run parameter not recorded")
                .with_context("param", key)
                .with_context("path", path.display().to_string()),
        )
    })?;
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    // Simulators sometimes print counts in scientific notation.
    match raw.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Ok(value as u64)
        }
        _ => Err(LtError::Results(
            ErrorInfo::new("bad-param", "run parameter is not a photon or event count")
                .with_context("param", key)
                .with_context("value", raw)
                .with_context("path", path.display().to_string()),
        )),
    }
}

/// What to do with a point before launching its simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SimDecision {
    /// No result yet.
    Run,
    /// A result exists but holds fewer photons than requested.
    Rerun { found: u64 },
    /// A result with enough photons already exists.
    Skip { found: u64 },
}

/// Decides whether the point whose result lives at `result_path` must be
/// (re-)simulated to reach `photons_per_point`.
pub fn plan_simulation<R: ResultReader + ?Sized>(
    reader: &R,
    result_path: &Path,
    photons_per_point: u64,
) -> SimDecision {
    if !result_path.is_file() {
        return SimDecision::Run;
    }
    let found = photons_simulated(reader, result_path);
    if found < photons_per_point {
        SimDecision::Rerun { found }
    } else {
        SimDecision::Skip { found }
    }
}

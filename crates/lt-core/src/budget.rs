use serde::{Deserialize, Serialize};

/// Largest number of photons a single simulated event may carry.
///
/// Larger budgets are split over several events to bound the simulator's
/// memory footprint.
pub const MAX_PHOTONS_PER_EVENT: u64 = 1_000_000;

/// How the photons requested for one point are spread over events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonBudget {
    pub photons_per_point: u64,
    pub photons_per_event: u64,
    pub events_per_point: u64,
}

impl PhotonBudget {
    /// Splits `photons_per_point` into whole events.
    ///
    /// When a split is needed every event carries [`MAX_PHOTONS_PER_EVENT`],
    /// so the effective per-point budget is rounded up to a multiple of it.
    pub fn split(photons_per_point: u64) -> Self {
        if photons_per_point <= MAX_PHOTONS_PER_EVENT {
            return Self {
                photons_per_point,
                photons_per_event: photons_per_point,
                events_per_point: 1,
            };
        }
        let events_per_point = photons_per_point.div_ceil(MAX_PHOTONS_PER_EVENT);
        Self {
            photons_per_point: events_per_point * MAX_PHOTONS_PER_EVENT,
            photons_per_event: MAX_PHOTONS_PER_EVENT,
            events_per_point,
        }
    }
}

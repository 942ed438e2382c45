//! The per-person health state machine.
//!
//! ```text
//! Healthy ──infect──▶ Infected ──recovery──▶ Recovered
//!                        │
//!                        └──────death──────▶ Dead
//! ```
//!
//! `Recovered` and `Dead` are absorbing. Nothing ever returns to `Healthy`.
use std::fmt::{self, Display};

use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::random::Sampler;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Infected,
    Recovered,
    Dead,
}

impl HealthStatus {
    /// Every status, in tally order. Add new statuses here too.
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Healthy,
        HealthStatus::Infected,
        HealthStatus::Recovered,
        HealthStatus::Dead,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, HealthStatus::Recovered | HealthStatus::Dead)
    }

    /// Whether moving from `self` to `next` is a legal transition. Staying put is legal.
    pub fn can_transition_to(self, next: HealthStatus) -> bool {
        use HealthStatus::{Dead, Healthy, Infected, Recovered};
        self == next
            || matches!(
                (self, next),
                (Healthy, Infected) | (Infected, Recovered) | (Infected, Dead)
            )
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Infected => "INFECTED",
            HealthStatus::Recovered => "RECOVERED",
            HealthStatus::Dead => "DEAD",
        };
        f.write_str(name)
    }
}

/// Per-cycle hazards applied to infected persons.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiseaseHazards {
    pub recovery_prob: f64,
    pub death_prob: f64,
}

impl DiseaseHazards {
    /// Draws the end-of-cycle outcome for a person currently in `status`. Only `Infected`
    /// persons are affected: recovery is tried first, and death only if recovery did not fire.
    pub fn progress<R: Rng>(&self, status: HealthStatus, sampler: &mut Sampler<R>) -> HealthStatus {
        if status != HealthStatus::Infected {
            return status;
        }
        if sampler.bernoulli(self.recovery_prob) {
            HealthStatus::Recovered
        } else if sampler.bernoulli(self.death_prob) {
            HealthStatus::Dead
        } else {
            HealthStatus::Infected
        }
    }
}

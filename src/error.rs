use std::fmt::{self, Display};
use std::io;

use crate::health::HealthStatus;
use crate::person::PersonId;
use crate::venue::VenueId;

/// Provides `ContagionError` and maps other errors to
/// convert to a `ContagionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ContagionError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A person's current record does not belong to the cycle the clock is on.
    CycleMismatch {
        person: PersonId,
        record_cycle: u32,
        clock_cycle: u32,
    },
    IllegalTransition {
        person: PersonId,
        from: HealthStatus,
        to: HealthStatus,
    },
    /// A staged infection was still pending when the health hazards were applied.
    UncommittedInfection(PersonId),
    PersonNotLive(PersonId),
    EmptyCandidateSet(String),
    InvalidProbability {
        name: &'static str,
        value: f64,
    },
    InvalidParameter(String),
    UnknownVenue(VenueId),
    UnknownPerson(PersonId),
    EmptyVenue(VenueId),
    ReportError(String),
    /// An earlier cycle failed, leaving the country half-advanced. Holds the original error.
    StepFailed(String),
    ContagionError(String),
}

impl From<io::Error> for ContagionError {
    fn from(error: io::Error) -> Self {
        ContagionError::IoError(error)
    }
}

impl From<serde_json::Error> for ContagionError {
    fn from(error: serde_json::Error) -> Self {
        ContagionError::JsonError(error)
    }
}

impl From<csv::Error> for ContagionError {
    fn from(error: csv::Error) -> Self {
        ContagionError::CSVError(error)
    }
}

impl From<String> for ContagionError {
    fn from(error: String) -> Self {
        ContagionError::ContagionError(error)
    }
}

impl From<&str> for ContagionError {
    fn from(error: &str) -> Self {
        ContagionError::ContagionError(error.to_string())
    }
}

impl std::error::Error for ContagionError {}

impl Display for ContagionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}

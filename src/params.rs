//! Run configuration.
//!
//! `Parameters` are read once, validated before a `Country` is built, and never change during a
//! run. They can be loaded from JSON; any field left out takes its default value:
//!
//! ```json
//! {
//!     "infection_prob": 0.3,
//!     "disease_duration": 20.0,
//!     "death_rate": 0.05,
//!     "max_cycles": 365,
//!     "visit_probabilities": { "workplace": 0.714, "community_center": 0.1 },
//!     "seed": 123
//! }
//! ```
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::clock::Cycle;
use crate::error::ContagionError;
use crate::health::DiseaseHazards;
use crate::random::DEFAULT_BATCH_SIZE;
use crate::venue::{VenueKind, HOUSEHOLD_VISIT_PROB};

/// Rejects values outside `[0, 1]`, NaN included.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ContagionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ContagionError::InvalidProbability { name, value })
    }
}

/// Rejects values outside `[0, 1)`. Only households are visited with certainty.
pub(crate) fn check_visit_probability(
    name: &'static str,
    value: f64,
) -> Result<(), ContagionError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ContagionError::InvalidProbability { name, value })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VisitProbabilities {
    pub workplace: f64,
    pub community_center: f64,
    pub transit: f64,
}

impl Default for VisitProbabilities {
    fn default() -> Self {
        VisitProbabilities {
            workplace: 5.0 / 7.0,
            community_center: 1.0 / 10.0,
            transit: 3.0 / 10.0,
        }
    }
}

impl VisitProbabilities {
    pub fn for_kind(&self, kind: VenueKind) -> f64 {
        match kind {
            VenueKind::Household => HOUSEHOLD_VISIT_PROB,
            VenueKind::Workplace => self.workplace,
            VenueKind::CommunityCenter => self.community_center,
            VenueKind::Transit => self.transit,
        }
    }

    fn validate(&self) -> Result<(), ContagionError> {
        check_visit_probability("visit_probabilities.workplace", self.workplace)?;
        check_visit_probability("visit_probabilities.community_center", self.community_center)?;
        check_visit_probability("visit_probabilities.transit", self.transit)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Scales the per-venue transmission probability.
    pub infection_prob: f64,
    /// Expected number of cycles a person stays infected.
    pub disease_duration: f64,
    /// Overall fraction of infections that end in death.
    pub death_rate: f64,
    /// Per-cycle recovery probability, replacing the one derived from `disease_duration`.
    pub recovery_prob_override: Option<f64>,
    /// Per-cycle death probability, replacing the one derived from `death_rate`.
    pub death_prob_override: Option<f64>,
    pub max_cycles: Cycle,
    pub visit_probabilities: VisitProbabilities,
    pub sampler_batch_size: usize,
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            infection_prob: 1.0,
            disease_duration: 20.0,
            death_rate: 0.05,
            recovery_prob_override: None,
            death_prob_override: None,
            max_cycles: 365,
            visit_probabilities: VisitProbabilities::default(),
            sampler_batch_size: DEFAULT_BATCH_SIZE,
            seed: 0,
        }
    }
}

impl Parameters {
    /// `1 / disease_duration` unless overridden.
    pub fn recovery_prob(&self) -> f64 {
        self.recovery_prob_override
            .unwrap_or(1.0 / self.disease_duration)
    }

    /// The per-cycle hazard that turns `death_rate` into a case fatality rate over an expected
    /// `disease_duration`: `1 - (1 - death_rate)^(1 / disease_duration)`, unless overridden.
    pub fn death_prob(&self) -> f64 {
        self.death_prob_override
            .unwrap_or_else(|| 1.0 - (1.0 - self.death_rate).powf(1.0 / self.disease_duration))
    }

    pub fn hazards(&self) -> DiseaseHazards {
        DiseaseHazards {
            recovery_prob: self.recovery_prob(),
            death_prob: self.death_prob(),
        }
    }

    /// Checks every probability, given or derived, and the remaining numeric settings.
    ///
    /// # Errors
    ///
    /// `InvalidProbability` for a probability outside its range and `InvalidParameter` for a
    /// non-positive disease duration or a zero batch size.
    pub fn validate(&self) -> Result<(), ContagionError> {
        check_probability("infection_prob", self.infection_prob)?;
        if !(self.disease_duration.is_finite() && self.disease_duration > 0.0) {
            return Err(ContagionError::InvalidParameter(format!(
                "disease_duration must be positive, got {}",
                self.disease_duration
            )));
        }
        check_probability("death_rate", self.death_rate)?;
        check_probability("recovery_prob", self.recovery_prob())?;
        check_probability("death_prob", self.death_prob())?;
        self.visit_probabilities.validate()?;
        if self.sampler_batch_size == 0 {
            return Err(ContagionError::InvalidParameter(
                "sampler_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates parameters from a JSON string.
    ///
    /// # Errors
    ///
    /// `JsonError` if the input does not parse, otherwise whatever `validate` reports.
    pub fn from_json_str(json: &str) -> Result<Self, ContagionError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Reads and validates parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// `IoError` if the file cannot be opened, `JsonError` if it does not parse, otherwise
    /// whatever `validate` reports.
    pub fn from_json_file(path: &Path) -> Result<Self, ContagionError> {
        let reader = BufReader::new(File::open(path)?);
        let parameters: Parameters = serde_json::from_reader(reader)?;
        parameters.validate()?;
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        Parameters::default().validate().unwrap();
    }

    #[test]
    fn derived_hazards() {
        let parameters = Parameters::default();
        assert_relative_eq!(parameters.recovery_prob(), 0.05);
        let expected = 1.0 - 0.95_f64.powf(1.0 / 20.0);
        assert_relative_eq!(parameters.death_prob(), expected);
        // Surviving every cycle of an average-length infection matches the death rate.
        assert_relative_eq!(
            1.0 - (1.0 - parameters.death_prob()).powf(20.0),
            0.05,
            max_relative = 1e-12
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let parameters = Parameters {
            recovery_prob_override: Some(1.0),
            death_prob_override: Some(0.0),
            ..Parameters::default()
        };
        let hazards = parameters.hazards();
        assert_eq!(hazards.recovery_prob, 1.0);
        assert_eq!(hazards.death_prob, 0.0);
    }

    #[test]
    fn infection_prob_above_one_is_rejected() {
        let parameters = Parameters {
            infection_prob: 1.5,
            ..Parameters::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(ContagionError::InvalidProbability {
                name: "infection_prob",
                ..
            })
        ));
    }

    #[test]
    fn nan_probability_is_rejected() {
        let parameters = Parameters {
            death_prob_override: Some(f64::NAN),
            ..Parameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn short_disease_makes_recovery_prob_invalid() {
        let parameters = Parameters {
            disease_duration: 0.5,
            ..Parameters::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(ContagionError::InvalidProbability {
                name: "recovery_prob",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let parameters = Parameters {
            disease_duration: 0.0,
            ..Parameters::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(ContagionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn certain_workplace_visits_are_rejected() {
        let parameters = Parameters {
            visit_probabilities: VisitProbabilities {
                workplace: 1.0,
                ..VisitProbabilities::default()
            },
            ..Parameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let parameters = Parameters {
            sampler_batch_size: 0,
            ..Parameters::default()
        };
        assert!(matches!(
            parameters.validate(),
            Err(ContagionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn households_are_always_visited() {
        let visit_probabilities = VisitProbabilities::default();
        assert_eq!(visit_probabilities.for_kind(VenueKind::Household), 1.0);
        assert_relative_eq!(
            visit_probabilities.for_kind(VenueKind::Workplace),
            5.0 / 7.0
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let parameters = Parameters::from_json_str(
            r#"{ "infection_prob": 0.3, "max_cycles": 10, "visit_probabilities": { "transit": 0.2 } }"#,
        )
        .unwrap();
        assert_eq!(parameters.infection_prob, 0.3);
        assert_eq!(parameters.max_cycles, 10);
        assert_eq!(parameters.visit_probabilities.transit, 0.2);
        assert_relative_eq!(parameters.visit_probabilities.workplace, 5.0 / 7.0);
        assert_eq!(parameters.disease_duration, 20.0);
    }

    #[test]
    fn unknown_json_fields_are_rejected() {
        let result = Parameters::from_json_str(r#"{ "infection_probability": 0.3 }"#);
        assert!(matches!(result, Err(ContagionError::JsonError(_))));
    }

    #[test]
    fn invalid_json_values_are_rejected() {
        let result = Parameters::from_json_str(r#"{ "infection_prob": 2.0 }"#);
        assert!(matches!(
            result,
            Err(ContagionError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "seed": 123, "sampler_batch_size": 64 }}"#).unwrap();
        let parameters = Parameters::from_json_file(file.path()).unwrap();
        assert_eq!(parameters.seed, 123);
        assert_eq!(parameters.sampler_batch_size, 64);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Parameters::from_json_file(Path::new("/nonexistent/parameters.json"));
        assert!(matches!(result, Err(ContagionError::IoError(_))));
    }
}

pub use crate::clock::{Cycle, SimulationClock};
pub use crate::country::{Country, CountryBuilder, HealthTally, Membership, SimulationStatus};
pub use crate::error::ContagionError;
pub use crate::execution_stats::RunStatistics;
pub use crate::generation::{generate_country, GenerationParameters};
pub use crate::health::{DiseaseHazards, HealthStatus};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::params::{Parameters, VisitProbabilities};
pub use crate::person::{Person, PersonId, PersonStateRecord};
pub use crate::random::Sampler;
pub use crate::report::{write_membership_report, write_tally_report};
pub use crate::venue::{Venue, VenueId, VenueKind};

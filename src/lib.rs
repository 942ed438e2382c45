//! A cycle-driven epidemic simulation over a synthetic population.
//!
//! A [`Country`] holds persons and the venues they may visit: households, workplaces,
//! community centers and public transit. Time advances in discrete cycles. In every cycle each
//! live person randomly visits some of their venues, the disease spreads among the visitors of
//! each venue, and infected persons may recover or die. The run ends when nobody is infected any
//! more or a maximum number of cycles is reached.
//!
//! Every random draw comes from a [`Sampler`] owned by the country, so a run is reproducible
//! from its seed alone. A typical run:
//!
//! ```rust
//! use contagion::prelude::*;
//!
//! let parameters = Parameters {
//!     infection_prob: 0.3,
//!     seed: 42,
//!     ..Parameters::default()
//! };
//! let generation = GenerationParameters {
//!     scale: 0.5,
//!     ..GenerationParameters::default()
//! };
//! let mut country = generate_country(&parameters, &generation).unwrap();
//! country.run().unwrap();
//! let last = country.tallies().last().unwrap();
//! assert_eq!(last.total(), country.persons().len());
//! ```
//!
//! Countries can also be assembled by hand with a [`CountryBuilder`].
pub mod clock;
pub mod country;
pub mod error;
pub mod execution_stats;
pub mod generation;
pub mod hashing;
pub mod health;
pub mod log;
pub mod params;
pub mod person;
pub mod prelude;
pub mod random;
pub mod report;
pub mod venue;

pub use crate::clock::{Cycle, SimulationClock};
pub use crate::country::{Country, CountryBuilder, HealthTally, Membership, SimulationStatus};
pub use crate::error::ContagionError;
pub use crate::generation::{generate_country, GenerationParameters};
pub use crate::health::HealthStatus;
pub use crate::params::Parameters;
pub use crate::person::{PersonId, PersonStateRecord};
pub use crate::random::Sampler;
pub use crate::venue::{VenueId, VenueKind};

// Re-exported so that custom samplers can name the generator types they wrap.
pub use rand;

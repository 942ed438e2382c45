//! Venues are the places where persons meet and the disease spreads.
//!
//! Each venue kind carries a visit probability. Households are always visited; the other kinds
//! are visited with a configured probability below one. A venue only remembers who visited it
//! during the current cycle, and the visitor set is cleared at the end of every cycle.
//!
//! Transmission within a venue treats the visitors as fully mixed: with `n` visitors of whom `k`
//! are infected, each healthy visitor is infected independently with probability
//! `k / (n - 1) * infection_prob`, the `n - 1` being everyone except the susceptible person
//! themselves.
use std::fmt::{self, Display};

use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::clock::SimulationClock;
use crate::country::HealthTally;
use crate::error::ContagionError;
use crate::hashing::IndexSet;
use crate::health::HealthStatus;
use crate::person::{Person, PersonId};
use crate::random::Sampler;

/// Visit probability of every household.
pub const HOUSEHOLD_VISIT_PROB: f64 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VenueId(pub(crate) usize);

impl VenueId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "venue {}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VenueKind {
    Household,
    Workplace,
    CommunityCenter,
    Transit,
}

impl VenueKind {
    pub const ALL: [VenueKind; 4] = [
        VenueKind::Household,
        VenueKind::Workplace,
        VenueKind::CommunityCenter,
        VenueKind::Transit,
    ];

    /// Short tag used in logs and exports.
    pub fn tag(self) -> &'static str {
        match self {
            VenueKind::Household => "HH",
            VenueKind::Workplace => "WP",
            VenueKind::CommunityCenter => "CC",
            VenueKind::Transit => "PT",
        }
    }
}

/// Probability that each healthy visitor of a venue is infected this cycle, or `None` when no
/// transmission can happen (no infected visitors, or no healthy ones).
#[allow(clippy::cast_precision_loss)]
pub fn transmission_probability(infected: usize, visitors: usize, infection_prob: f64) -> Option<f64> {
    if infected == 0 || infected >= visitors {
        return None;
    }
    // 0 < infected < visitors, so visitors >= 2 and the ratio is at most 1.
    Some(infected as f64 / (visitors - 1) as f64 * infection_prob)
}

#[derive(Clone, Debug)]
pub struct Venue {
    id: VenueId,
    kind: VenueKind,
    visit_prob: f64,
    visitors: IndexSet<PersonId>,
}

impl Venue {
    pub(crate) fn new(id: VenueId, kind: VenueKind, visit_prob: f64) -> Self {
        Venue {
            id,
            kind,
            visit_prob,
            visitors: IndexSet::default(),
        }
    }

    pub fn id(&self) -> VenueId {
        self.id
    }

    pub fn kind(&self) -> VenueKind {
        self.kind
    }

    pub fn visit_prob(&self) -> f64 {
        self.visit_prob
    }

    pub fn visitors(&self) -> impl ExactSizeIterator<Item = PersonId> + '_ {
        self.visitors.iter().copied()
    }

    pub fn visitor_count(&self) -> usize {
        self.visitors.len()
    }

    /// Adds `person` to this cycle's visitors. Returns `false` if they were already here.
    pub fn visit(&mut self, person: PersonId) -> bool {
        self.visitors.insert(person)
    }

    fn visitor<'a>(&self, persons: &'a [Person], id: PersonId) -> Result<&'a Person, ContagionError> {
        persons
            .get(id.index())
            .ok_or(ContagionError::UnknownPerson(id))
    }

    /// Number of current visitors whose committed health is `Infected`.
    ///
    /// # Errors
    ///
    /// `UnknownPerson` if a visitor is not in `persons`.
    pub fn infected_visitor_count(&self, persons: &[Person]) -> Result<usize, ContagionError> {
        let mut infected = 0;
        for &id in &self.visitors {
            if self.visitor(persons, id)?.health() == HealthStatus::Infected {
                infected += 1;
            }
        }
        Ok(infected)
    }

    /// Health summary of the current visitors, by committed health, stamped with the clock's
    /// cycle.
    ///
    /// # Errors
    ///
    /// `UnknownPerson` if a visitor is not in `persons`.
    pub fn visitor_tally(
        &self,
        persons: &[Person],
        clock: &SimulationClock,
    ) -> Result<HealthTally, ContagionError> {
        let mut tally = HealthTally {
            cycle: clock.current(),
            ..HealthTally::default()
        };
        for &id in &self.visitors {
            *tally.count_mut(self.visitor(persons, id)?.health()) += 1;
        }
        Ok(tally)
    }

    /// Runs the transmission model over the current visitors and stages the resulting
    /// infections. Only committed health is read, so infections staged by venues evaluated
    /// earlier in the same cycle have no effect here. Returns the number of infections staged.
    ///
    /// # Errors
    ///
    /// `UnknownPerson` if a visitor is not in `persons`, and whatever `Person::infect` reports.
    pub fn update_visitors_health<R: Rng>(
        &self,
        persons: &mut [Person],
        sampler: &mut Sampler<R>,
        infection_prob: f64,
        clock: &SimulationClock,
    ) -> Result<usize, ContagionError> {
        let infected = self.infected_visitor_count(persons)?;
        let Some(probability) =
            transmission_probability(infected, self.visitors.len(), infection_prob)
        else {
            return Ok(0);
        };
        debug_assert!((0.0..=1.0).contains(&probability));

        let mut staged = 0;
        for &id in &self.visitors {
            let person = persons
                .get_mut(id.index())
                .ok_or(ContagionError::UnknownPerson(id))?;
            if person.health() == HealthStatus::Healthy && sampler.bernoulli(probability) {
                person.infect(clock)?;
                staged += 1;
            }
        }
        Ok(staged)
    }

    pub fn clear_visitors(&mut self) {
        self.visitors.clear();
    }
}

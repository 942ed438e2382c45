//! Persons and their health history.
//!
//! A person owns an append-only sequence of [`PersonStateRecord`]s, one per cycle it has been
//! alive, with the last record being its current state. Once a record is written its health
//! never changes.
//!
//! Infections computed by venues during a cycle are *staged* in a pending slot. Committing them
//! in [`Person::advance_health_state`] and drawing recovery or death in
//! [`Person::update_current_health`] only changes the person's *next* health, which lands in the
//! record appended for the following cycle. Every venue, and every tally, therefore sees the
//! health the person had when the cycle began.
//!
//! All operations that touch the cycle take the [`SimulationClock`] and refuse to work on a
//! record that does not belong to the current cycle.
use std::fmt::{self, Display};

use rand::Rng;
use serde_derive::Serialize;

use crate::clock::{Cycle, SimulationClock};
use crate::error::ContagionError;
use crate::health::{DiseaseHazards, HealthStatus};
use crate::random::Sampler;
use crate::venue::{Venue, VenueId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PersonId(pub(crate) usize);

impl PersonId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "person {}", self.0)
    }
}

/// A snapshot of one person during one cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonStateRecord {
    pub cycle: Cycle,
    /// The person's home venue, `None` for a person without venues.
    pub location: Option<VenueId>,
    pub health: HealthStatus,
}

#[derive(Clone, Debug)]
pub struct Person {
    id: PersonId,
    /// Venues this person may visit. The first one is home.
    locations: Vec<VenueId>,
    history: Vec<PersonStateRecord>,
    /// Health decided during the transmission phase, committed by `advance_health_state`.
    pending_health: Option<HealthStatus>,
    /// Health for the record of the next cycle, once this cycle's advancement has begun.
    next_health: Option<HealthStatus>,
}

impl Person {
    pub(crate) fn new(id: PersonId, locations: Vec<VenueId>, cycle: Cycle) -> Self {
        let location = locations.first().copied();
        Person {
            id,
            locations,
            history: vec![PersonStateRecord {
                cycle,
                location,
                health: HealthStatus::Healthy,
            }],
            pending_health: None,
            next_health: None,
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn locations(&self) -> &[VenueId] {
        &self.locations
    }

    pub fn history(&self) -> &[PersonStateRecord] {
        &self.history
    }

    pub fn current_record(&self) -> &PersonStateRecord {
        // `history` is created non-empty and only ever grows.
        &self.history[self.history.len() - 1]
    }

    /// The committed health of the current record. Staged infections are not visible here.
    pub fn health(&self) -> HealthStatus {
        self.current_record().health
    }

    pub fn pending_health(&self) -> Option<HealthStatus> {
        self.pending_health
    }

    /// The health the next cycle's record will start with, if this cycle has advanced it.
    pub fn next_health(&self) -> Option<HealthStatus> {
        self.next_health
    }

    fn working_health(&self) -> HealthStatus {
        self.next_health.unwrap_or_else(|| self.health())
    }

    /// Returns the current record if it belongs to the clock's cycle.
    fn record_for(&mut self, clock: &SimulationClock) -> Result<&mut PersonStateRecord, ContagionError> {
        let id = self.id;
        let last = self.history.len() - 1;
        let record = &mut self.history[last];
        if record.cycle != clock.current() {
            return Err(ContagionError::CycleMismatch {
                person: id,
                record_cycle: record.cycle,
                clock_cycle: clock.current(),
            });
        }
        Ok(record)
    }

    fn check_transition(&self, from: HealthStatus, to: HealthStatus) -> Result<(), ContagionError> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(ContagionError::IllegalTransition {
                person: self.id,
                from,
                to,
            })
        }
    }

    /// Overwrites the current health immediately, bypassing staging. Used for seeding, before
    /// the current record has been tallied.
    ///
    /// # Errors
    ///
    /// `CycleMismatch` if the current record is not for the clock's cycle and
    /// `IllegalTransition` if `status` cannot follow the current health.
    pub fn set_health(
        &mut self,
        status: HealthStatus,
        clock: &SimulationClock,
    ) -> Result<(), ContagionError> {
        self.check_transition(self.health(), status)?;
        self.record_for(clock)?.health = status;
        Ok(())
    }

    /// Stages an infection to be committed by the next `advance_health_state`. Staging twice in
    /// the same cycle is the same as staging once.
    ///
    /// # Errors
    ///
    /// `CycleMismatch` if the current record is not for the clock's cycle and
    /// `IllegalTransition` if the person is not healthy.
    pub fn infect(&mut self, clock: &SimulationClock) -> Result<(), ContagionError> {
        self.record_for(clock)?;
        self.check_transition(self.health(), HealthStatus::Infected)?;
        self.pending_health = Some(HealthStatus::Infected);
        Ok(())
    }

    /// Independently decides whether to visit each of this person's venues.
    ///
    /// # Errors
    ///
    /// `UnknownVenue` if a location is not in `venues`.
    pub fn visit_locations<R: Rng>(
        &self,
        venues: &mut [Venue],
        sampler: &mut Sampler<R>,
    ) -> Result<(), ContagionError> {
        for &venue_id in &self.locations {
            let venue = venues
                .get_mut(venue_id.index())
                .ok_or(ContagionError::UnknownVenue(venue_id))?;
            if sampler.bernoulli(venue.visit_prob()) {
                venue.visit(self.id);
            }
        }
        Ok(())
    }

    /// Commits a staged infection, if any, to the next health and clears the pending slot. The
    /// current record is left as it is.
    ///
    /// # Errors
    ///
    /// `CycleMismatch` if the current record is not for the clock's cycle and
    /// `IllegalTransition` if the staged status cannot follow the current one.
    pub fn advance_health_state(&mut self, clock: &SimulationClock) -> Result<(), ContagionError> {
        self.record_for(clock)?;
        if let Some(status) = self.pending_health {
            self.check_transition(self.working_health(), status)?;
            self.pending_health = None;
            self.next_health = Some(status);
        }
        Ok(())
    }

    /// Applies the recovery and death hazards to an infected person, including one whose
    /// infection was committed this cycle. The outcome becomes the next health.
    ///
    /// # Errors
    ///
    /// `CycleMismatch` if the current record is not for the clock's cycle and
    /// `UncommittedInfection` if `advance_health_state` has not run yet.
    pub fn update_current_health<R: Rng>(
        &mut self,
        hazards: &DiseaseHazards,
        sampler: &mut Sampler<R>,
        clock: &SimulationClock,
    ) -> Result<(), ContagionError> {
        if self.pending_health.is_some() {
            return Err(ContagionError::UncommittedInfection(self.id));
        }
        self.record_for(clock)?;
        self.next_health = Some(hazards.progress(self.working_health(), sampler));
        Ok(())
    }

    /// Appends a record for the clock's cycle carrying the next health, or the current health
    /// if nothing advanced it. The clock must be exactly one cycle ahead of the current record.
    ///
    /// # Errors
    ///
    /// `UncommittedInfection` if a staged infection was never committed and `CycleMismatch` if
    /// the clock is not exactly one cycle past the current record.
    pub fn make_new_history_record(&mut self, clock: &SimulationClock) -> Result<(), ContagionError> {
        if self.pending_health.is_some() {
            return Err(ContagionError::UncommittedInfection(self.id));
        }
        let current = *self.current_record();
        if current.cycle + 1 != clock.current() {
            return Err(ContagionError::CycleMismatch {
                person: self.id,
                record_cycle: current.cycle,
                clock_cycle: clock.current(),
            });
        }
        self.history.push(PersonStateRecord {
            cycle: clock.current(),
            health: self.next_health.take().unwrap_or(current.health),
            ..current
        });
        Ok(())
    }
}

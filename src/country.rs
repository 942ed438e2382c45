//! The population, its venues, and the cycle loop that ties them together.
//!
//! A [`Country`] owns every [`Person`] and [`Venue`] in arenas indexed by [`PersonId`] and
//! [`VenueId`]. Persons refer to venues (and venues to their current visitors) only by id. Each
//! call to [`Country::step`] runs one cycle of the pipeline, strictly in this order:
//!
//! 1. every live person decides which of their venues to visit;
//! 2. every venue runs transmission over its visitors, staging new infections;
//! 3. every live person commits staged infections, then draws recovery or death;
//! 4. the clock advances;
//! 5. every live person appends a history record and every venue forgets its visitors;
//! 6. the newly dead move from the live population to the morgue;
//! 7. the health tally for the new cycle is recorded.
//!
//! Each step finishes for the whole population before the next one begins. Health decided in
//! step 3 is only written into the records appended in step 5, so the record of every cycle
//! agrees with that cycle's tally. The loop in [`Country::run`] stops once nobody is infected or
//! the clock reaches `max_cycles`.
use std::fmt::{self, Display};

use log::{debug, error, info, trace};
use serde_derive::Serialize;

use crate::clock::{Cycle, SimulationClock};
use crate::error::ContagionError;
use crate::execution_stats::{log_run_statistics, RunStatistics, RunTimer};
use crate::hashing::IndexSet;
use crate::health::{DiseaseHazards, HealthStatus};
use crate::params::{check_probability, check_visit_probability, Parameters};
use crate::person::{Person, PersonId};
use crate::random::{sample_multiple_from_known_length, Sampler};
use crate::venue::{Venue, VenueId, VenueKind, HOUSEHOLD_VISIT_PROB};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
    Running,
    Finished,
}

/// Health counts for one cycle. `dead` is the size of the morgue; the other counts are over
/// the live population.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HealthTally {
    pub cycle: Cycle,
    pub healthy: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl HealthTally {
    pub fn count(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Infected => self.infected,
            HealthStatus::Recovered => self.recovered,
            HealthStatus::Dead => self.dead,
        }
    }

    pub(crate) fn count_mut(&mut self, status: HealthStatus) -> &mut usize {
        match status {
            HealthStatus::Healthy => &mut self.healthy,
            HealthStatus::Infected => &mut self.infected,
            HealthStatus::Recovered => &mut self.recovered,
            HealthStatus::Dead => &mut self.dead,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (HealthStatus, usize)> + '_ {
        HealthStatus::ALL
            .into_iter()
            .map(|status| (status, self.count(status)))
    }

    pub fn total(&self) -> usize {
        self.healthy + self.infected + self.recovered + self.dead
    }
}

impl Display for HealthTally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cycle {}:", self.cycle)?;
        for (status, count) in self.iter() {
            write!(f, " {status}={count}")?;
        }
        Ok(())
    }
}

/// One edge of the person-venue membership graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub person: PersonId,
    pub venue: VenueId,
    pub kind: VenueKind,
}

/// Assembles the persons and venues of a [`Country`].
pub struct CountryBuilder {
    parameters: Parameters,
    persons: Vec<Person>,
    venues: Vec<Venue>,
}

impl CountryBuilder {
    pub fn new(parameters: Parameters) -> Self {
        CountryBuilder {
            parameters,
            persons: Vec::new(),
            venues: Vec::new(),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    /// Adds a venue visited with its kind's configured probability.
    pub fn add_venue(&mut self, kind: VenueKind) -> VenueId {
        let visit_prob = self.parameters.visit_probabilities.for_kind(kind);
        self.push_venue(kind, visit_prob)
    }

    /// Adds a venue with its own visit probability.
    ///
    /// # Errors
    ///
    /// `InvalidProbability` if a household is given anything other than 1, or another kind is
    /// given a value outside `[0, 1)`.
    pub fn add_venue_with_prob(
        &mut self,
        kind: VenueKind,
        visit_prob: f64,
    ) -> Result<VenueId, ContagionError> {
        if kind == VenueKind::Household {
            check_probability("visit_prob", visit_prob)?;
            if visit_prob < HOUSEHOLD_VISIT_PROB {
                return Err(ContagionError::InvalidProbability {
                    name: "visit_prob",
                    value: visit_prob,
                });
            }
        } else {
            check_visit_probability("visit_prob", visit_prob)?;
        }
        Ok(self.push_venue(kind, visit_prob))
    }

    fn push_venue(&mut self, kind: VenueKind, visit_prob: f64) -> VenueId {
        let id = VenueId(self.venues.len());
        self.venues.push(Venue::new(id, kind, visit_prob));
        id
    }

    /// Adds a healthy person who may visit `locations`. The first location is their home.
    /// Repeated locations are kept once.
    ///
    /// # Errors
    ///
    /// `UnknownVenue` if a location has not been added.
    pub fn add_person(&mut self, locations: &[VenueId]) -> Result<PersonId, ContagionError> {
        let mut unique: Vec<VenueId> = Vec::with_capacity(locations.len());
        for &venue in locations {
            if venue.index() >= self.venues.len() {
                return Err(ContagionError::UnknownVenue(venue));
            }
            if !unique.contains(&venue) {
                unique.push(venue);
            }
        }
        let id = PersonId(self.persons.len());
        self.persons.push(Person::new(id, unique, 0));
        Ok(id)
    }

    /// Builds with the main sampler stream described by the parameters' `seed` and
    /// `sampler_batch_size`.
    ///
    /// # Errors
    ///
    /// Same as [`CountryBuilder::build`].
    pub fn build_from_parameters(self) -> Result<Country, ContagionError> {
        self.parameters.validate()?;
        let sampler = Sampler::from_parameters(&self.parameters)?;
        self.build(sampler)
    }

    /// Validates the parameters and the venue membership and hands everything to a new
    /// [`Country`] at cycle 0. The given sampler is used as is; `seed` and
    /// `sampler_batch_size` in the parameters are not consulted.
    ///
    /// # Errors
    ///
    /// Whatever `Parameters::validate` reports, or `EmptyVenue` for a venue nobody belongs to.
    pub fn build(self, sampler: Sampler) -> Result<Country, ContagionError> {
        self.parameters.validate()?;

        let mut members = vec![0usize; self.venues.len()];
        for person in &self.persons {
            for venue in person.locations() {
                members[venue.index()] += 1;
            }
        }
        if let Some(empty) = members.iter().position(|&count| count == 0) {
            return Err(ContagionError::EmptyVenue(VenueId(empty)));
        }

        info!(
            "built country with {} persons and {} venues",
            self.persons.len(),
            self.venues.len()
        );
        let population = self.persons.iter().map(Person::id).collect();
        Ok(Country {
            hazards: self.parameters.hazards(),
            parameters: self.parameters,
            clock: SimulationClock::new(),
            sampler,
            persons: self.persons,
            venues: self.venues,
            population,
            morgue: Vec::new(),
            tallies: Vec::new(),
            failure: None,
        })
    }
}

pub struct Country {
    parameters: Parameters,
    hazards: DiseaseHazards,
    clock: SimulationClock,
    sampler: Sampler,
    persons: Vec<Person>,
    venues: Vec<Venue>,
    population: IndexSet<PersonId>,
    /// Persons removed from the live population upon death, in order of death.
    morgue: Vec<PersonId>,
    /// One tally per completed cycle, starting with the seeded state at cycle 0. Empty until
    /// the simulation starts.
    tallies: Vec<HealthTally>,
    /// Message of the error that abandoned a cycle. Once set, the country cannot advance.
    failure: Option<String>,
}

impl Country {
    pub fn builder(parameters: Parameters) -> CountryBuilder {
        CountryBuilder::new(parameters)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn cycle(&self) -> Cycle {
        self.clock.current()
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(id.index())
    }

    /// Every person ever created, live or dead.
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn venue(&self, id: VenueId) -> Option<&Venue> {
        self.venues.get(id.index())
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn live_population(&self) -> impl ExactSizeIterator<Item = PersonId> + '_ {
        self.population.iter().copied()
    }

    pub fn population_size(&self) -> usize {
        self.population.len()
    }

    pub fn is_live(&self, id: PersonId) -> bool {
        self.population.contains(&id)
    }

    pub fn morgue(&self) -> &[PersonId] {
        &self.morgue
    }

    /// The error that abandoned a cycle, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Whether the first cycle's tally has been recorded. Seeding is closed from then on.
    pub fn has_started(&self) -> bool {
        !self.tallies.is_empty()
    }

    /// Counts the current health of the live population, with the morgue as the dead.
    pub fn current_tally(&self) -> HealthTally {
        let mut tally = HealthTally {
            cycle: self.clock.current(),
            ..HealthTally::default()
        };
        for id in &self.population {
            *tally.count_mut(self.persons[id.index()].health()) += 1;
        }
        tally.dead += self.morgue.len();
        tally
    }

    /// The tally of every cycle so far, indexed by cycle.
    pub fn tallies(&self) -> &[HealthTally] {
        &self.tallies
    }

    pub fn status(&self) -> SimulationStatus {
        let infected = self
            .tallies
            .last()
            .map_or_else(|| self.current_tally().infected, |tally| tally.infected);
        if infected == 0 || self.clock.current() >= self.parameters.max_cycles {
            SimulationStatus::Finished
        } else {
            SimulationStatus::Running
        }
    }

    /// Every (person, venue) pair of the social graph, for all persons ever created.
    pub fn membership(&self) -> Vec<Membership> {
        self.persons
            .iter()
            .flat_map(|person| {
                person.locations().iter().map(move |&venue| Membership {
                    person: person.id(),
                    venue,
                    kind: self.venues[venue.index()].kind(),
                })
            })
            .collect()
    }

    fn check_not_started(&self) -> Result<(), ContagionError> {
        if self.has_started() {
            return Err(ContagionError::ContagionError(
                "persons can only be seeded before the simulation starts".to_string(),
            ));
        }
        Ok(())
    }

    fn check_seedable(&self, id: PersonId) -> Result<(), ContagionError> {
        self.check_not_started()?;
        if id.index() >= self.persons.len() {
            return Err(ContagionError::UnknownPerson(id));
        }
        if !self.population.contains(&id) {
            return Err(ContagionError::PersonNotLive(id));
        }
        Ok(())
    }

    /// Sets a live person's health immediately. Only allowed before the simulation starts.
    /// A person set to `Dead` goes straight to the morgue.
    ///
    /// # Errors
    ///
    /// `UnknownPerson`, `PersonNotLive`, or an error from `Person::set_health`; also fails once
    /// the simulation has started.
    pub fn set_health(&mut self, id: PersonId, status: HealthStatus) -> Result<(), ContagionError> {
        self.check_seedable(id)?;
        self.persons[id.index()].set_health(status, &self.clock)?;
        if status == HealthStatus::Dead {
            self.population.shift_remove(&id);
            self.morgue.push(id);
        }
        Ok(())
    }

    /// Infects `count` distinct healthy live persons chosen uniformly at random and returns
    /// them.
    ///
    /// # Errors
    ///
    /// `EmptyCandidateSet` if fewer than `count` healthy persons are alive; also fails once the
    /// simulation has started.
    pub fn seed_infections(&mut self, count: usize) -> Result<Vec<PersonId>, ContagionError> {
        self.check_not_started()?;
        let candidates: Vec<PersonId> = self
            .population
            .iter()
            .copied()
            .filter(|id| self.persons[id.index()].health() == HealthStatus::Healthy)
            .collect();
        let chosen = sample_multiple_from_known_length(&mut self.sampler, candidates.into_iter(), count)?;
        for &id in &chosen {
            self.set_health(id, HealthStatus::Infected)?;
        }
        debug!("seeded {} infections", chosen.len());
        Ok(chosen)
    }

    fn ensure_started(&mut self) {
        if self.tallies.is_empty() {
            let tally = self.current_tally();
            debug!("{tally}");
            self.tallies.push(tally);
        }
    }

    /// Runs one cycle of the pipeline. Does nothing once the simulation has finished.
    ///
    /// # Errors
    ///
    /// Any invariant violation reported by a person or venue. The cycle is abandoned at the
    /// failing step, and every later call returns `StepFailed` with the original message.
    pub fn step(&mut self) -> Result<SimulationStatus, ContagionError> {
        if let Some(failure) = &self.failure {
            return Err(ContagionError::StepFailed(failure.clone()));
        }
        self.run_cycle().inspect_err(|e| {
            error!("cycle {} abandoned: {e}", self.clock.current());
            self.failure = Some(e.to_string());
        })
    }

    fn run_cycle(&mut self) -> Result<SimulationStatus, ContagionError> {
        self.ensure_started();
        if self.status() == SimulationStatus::Finished {
            return Ok(SimulationStatus::Finished);
        }

        let Country {
            parameters,
            hazards,
            clock,
            sampler,
            persons,
            venues,
            population,
            ..
        } = self;

        trace!("cycle {}: visiting", clock.current());
        for id in population.iter() {
            persons[id.index()].visit_locations(venues, sampler)?;
        }

        trace!("cycle {}: transmission", clock.current());
        let mut staged = 0;
        for venue in venues.iter() {
            staged += venue.update_visitors_health(persons, sampler, parameters.infection_prob, clock)?;
        }

        trace!("cycle {}: health advancement ({staged} new infections)", clock.current());
        for id in population.iter() {
            let person = &mut persons[id.index()];
            person.advance_health_state(clock)?;
            person.update_current_health(hazards, sampler, clock)?;
        }

        clock.advance();

        for id in population.iter() {
            persons[id.index()].make_new_history_record(clock)?;
        }
        for venue in venues.iter_mut() {
            venue.clear_visitors();
        }

        self.bury_the_dead();

        let tally = self.current_tally();
        debug!("{tally}");
        self.tallies.push(tally);
        Ok(self.status())
    }

    /// Moves every live person whose health is `Dead` to the morgue.
    fn bury_the_dead(&mut self) {
        let persons = &self.persons;
        let dead: Vec<PersonId> = self
            .population
            .iter()
            .copied()
            .filter(|id| persons[id.index()].health() == HealthStatus::Dead)
            .collect();
        if dead.is_empty() {
            return;
        }
        self.population
            .retain(|id| persons[id.index()].health() != HealthStatus::Dead);
        for id in &dead {
            trace!("{id} moved to the morgue at cycle {}", self.clock.current());
        }
        self.morgue.extend(dead);
    }

    /// Steps until nobody is infected or `max_cycles` is reached.
    ///
    /// # Errors
    ///
    /// The first error returned by `step`; the run stops there.
    pub fn run(&mut self) -> Result<RunStatistics, ContagionError> {
        if let Some(failure) = &self.failure {
            return Err(ContagionError::StepFailed(failure.clone()));
        }
        self.ensure_started();
        info!(
            "starting simulation at cycle {} with {} persons and {} venues",
            self.clock.current(),
            self.population.len(),
            self.venues.len()
        );
        let start_cycle = self.clock.current();
        let mut timer = RunTimer::new();
        while self.status() == SimulationStatus::Running {
            timer.record_cycle(self.population.len());
            self.step()?;
        }
        let statistics = timer.finish(self.clock.current() - start_cycle);
        info!("final state {}", self.current_tally());
        log_run_statistics(&statistics);
        Ok(statistics)
    }
}

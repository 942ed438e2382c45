//! Random synthetic countries.
//!
//! A country is a set of workplaces shared by everyone plus a number of communities. Each
//! community has its own community centers and is filled with households until its population
//! is reached. Every household shares a few of its community's centers, and some of its
//! residents work at a random workplace. All counts are drawn uniformly from ranges that grow
//! with `scale`.
//!
//! Generation draws from its own named stream, so the country that comes out is fixed by the
//! seed alone and the simulation stream starts untouched.
use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use crate::country::{Country, CountryBuilder};
use crate::error::ContagionError;
use crate::params::Parameters;
use crate::random::Sampler;
use crate::venue::{VenueId, VenueKind};

/// Name of the sampler stream used while generating.
pub const GENERATION_STREAM: &str = "generation";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationParameters {
    /// Multiplies every per-scale range below.
    pub scale: f64,
    /// `[min, max]` workplaces per unit of scale.
    pub workplaces: [u32; 2],
    /// `[min, max]` communities per unit of scale.
    pub communities: [u32; 2],
    /// `[min, max]` residents of a community per unit of scale.
    pub community_population: [u32; 2],
    /// `[min, max]` community centers of a community per unit of scale.
    pub community_centers: [u32; 2],
    pub avg_household_size: f64,
    /// Average number of community centers a household picks.
    pub avg_household_centers: f64,
    pub avg_household_workers: f64,
    pub initial_infected: usize,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        GenerationParameters {
            scale: 1.0,
            workplaces: [2, 8],
            communities: [3, 10],
            community_population: [100, 300],
            community_centers: [3, 7],
            avg_household_size: 6.0,
            avg_household_centers: 2.0,
            avg_household_workers: 1.7,
            initial_infected: 10,
        }
    }
}

fn check_range(name: &str, [min, max]: [u32; 2]) -> Result<(), ContagionError> {
    if min > max {
        return Err(ContagionError::InvalidParameter(format!(
            "{name} range is empty: [{min}, {max}]"
        )));
    }
    Ok(())
}

fn check_average(name: &str, value: f64) -> Result<(), ContagionError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ContagionError::InvalidParameter(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

// Averages are turned into the range [avg / 2, avg * 1.5], truncated to whole counts.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn around(sampler: &mut Sampler, average: f64) -> usize {
    sampler.range_inclusive((average / 2.0) as usize, (average * 1.5) as usize)
}

impl GenerationParameters {
    /// # Errors
    ///
    /// `InvalidParameter` for a non-positive scale, an empty range, or a negative average.
    pub fn validate(&self) -> Result<(), ContagionError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ContagionError::InvalidParameter(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        check_range("workplaces", self.workplaces)?;
        check_range("communities", self.communities)?;
        check_range("community_population", self.community_population)?;
        check_range("community_centers", self.community_centers)?;
        check_average("avg_household_size", self.avg_household_size)?;
        check_average("avg_household_centers", self.avg_household_centers)?;
        check_average("avg_household_workers", self.avg_household_workers)
    }

    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    fn draw_scaled(&self, [min, max]: [u32; 2], sampler: &mut Sampler) -> usize {
        let low = (f64::from(min) * self.scale) as usize;
        let high = (f64::from(max) * self.scale) as usize;
        sampler.range_inclusive(low, high)
    }
}

/// A household before any venue exists. Indices are local to the draft.
struct HouseholdDraft {
    /// Indices into the community's centers, without repeats.
    centers: Vec<usize>,
    /// Workplace indices of each resident.
    residents: Vec<Vec<usize>>,
}

struct CommunityDraft {
    center_count: usize,
    households: Vec<HouseholdDraft>,
}

fn draft_community(
    generation: &GenerationParameters,
    population: usize,
    center_count: usize,
    workplace_count: usize,
    sampler: &mut Sampler,
) -> Result<CommunityDraft, ContagionError> {
    let mut households = Vec::new();
    let mut placed = 0;
    while placed < population {
        let mut centers = Vec::new();
        let picks = around(sampler, generation.avg_household_centers);
        if center_count > 0 {
            for _ in 0..picks {
                let center = sampler.choose_index(center_count)?;
                if !centers.contains(&center) {
                    centers.push(center);
                }
            }
        }

        let size = around(sampler, generation.avg_household_size)
            .min(population - placed)
            .max(1);
        let mut residents = vec![Vec::new(); size];
        if workplace_count > 0 {
            let workers = around(sampler, generation.avg_household_workers);
            for _ in 0..workers {
                let resident = sampler.choose_index(size)?;
                let workplace = sampler.choose_index(workplace_count)?;
                if !residents[resident].contains(&workplace) {
                    residents[resident].push(workplace);
                }
            }
        }

        placed += size;
        households.push(HouseholdDraft { centers, residents });
    }
    Ok(CommunityDraft {
        center_count,
        households,
    })
}

/// Generates a random country and seeds `initial_infected` infections. Venues that end up with
/// no members are never created.
///
/// # Errors
///
/// Whatever `Parameters::validate` or `GenerationParameters::validate` report, an error from
/// building the country, or `EmptyCandidateSet` if fewer than `initial_infected` persons were
/// generated.
pub fn generate_country(
    parameters: &Parameters,
    generation: &GenerationParameters,
) -> Result<Country, ContagionError> {
    parameters.validate()?;
    generation.validate()?;
    let mut sampler = Sampler::from_stream(
        parameters.seed,
        GENERATION_STREAM,
        parameters.sampler_batch_size,
    )?;

    let workplace_count = generation.draw_scaled(generation.workplaces, &mut sampler);
    let community_count = generation.draw_scaled(generation.communities, &mut sampler);
    debug!("{workplace_count} workplaces, {community_count} communities");

    let mut communities = Vec::with_capacity(community_count);
    for index in 0..community_count {
        let population = generation.draw_scaled(generation.community_population, &mut sampler);
        let center_count = generation.draw_scaled(generation.community_centers, &mut sampler);
        debug!("community {index}: population {population}, {center_count} community centers");
        communities.push(draft_community(
            generation,
            population,
            center_count,
            workplace_count,
            &mut sampler,
        )?);
    }

    let mut builder = CountryBuilder::new(parameters.clone());

    let mut workplace_used = vec![false; workplace_count];
    for household in communities.iter().flat_map(|c| &c.households) {
        for &workplace in household.residents.iter().flatten() {
            workplace_used[workplace] = true;
        }
    }
    let workplace_ids: Vec<Option<VenueId>> = workplace_used
        .into_iter()
        .map(|used| used.then(|| builder.add_venue(VenueKind::Workplace)))
        .collect();

    for community in &communities {
        let mut center_ids: Vec<Option<VenueId>> = vec![None; community.center_count];
        for household in &community.households {
            for &center in &household.centers {
                if center_ids[center].is_none() {
                    center_ids[center] = Some(builder.add_venue(VenueKind::CommunityCenter));
                }
            }
        }

        for household in &community.households {
            let home = builder.add_venue(VenueKind::Household);
            let mut shared = vec![home];
            shared.extend(household.centers.iter().filter_map(|&c| center_ids[c]));
            for workplaces in &household.residents {
                let mut locations = shared.clone();
                locations.extend(workplaces.iter().filter_map(|&w| workplace_ids[w]));
                builder.add_person(&locations)?;
            }
        }
    }

    info!(
        "generated {} persons in {} venues",
        builder.person_count(),
        builder.venue_count()
    );
    let mut country = builder.build_from_parameters()?;
    country.seed_infections(generation.initial_infected)?;
    Ok(country)
}

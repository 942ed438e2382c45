use contagion::prelude::*;
use contagion::report::write_tally_report;
use tempfile::tempdir;

fn generated(seed: u64, batch_size: usize) -> Country {
    let parameters = Parameters {
        infection_prob: 0.3,
        seed,
        sampler_batch_size: batch_size,
        ..Parameters::default()
    };
    let generation = GenerationParameters {
        scale: 0.4,
        ..GenerationParameters::default()
    };
    generate_country(&parameters, &generation).unwrap()
}

#[test]
fn population_is_partitioned_every_cycle() {
    let mut country = generated(17, 4096);
    let total = country.persons().len();
    loop {
        let status = country.step().unwrap();
        assert_eq!(country.population_size() + country.morgue().len(), total);
        assert!(country.morgue().iter().all(|&id| !country.is_live(id)));
        assert!(country
            .live_population()
            .all(|id| country.person(id).unwrap().health() != HealthStatus::Dead));
        if status == SimulationStatus::Finished {
            break;
        }
    }
}

#[test]
fn histories_are_gapless_and_monotone() {
    let mut country = generated(23, 4096);
    country.run().unwrap();
    let final_cycle = country.cycle();

    for person in country.persons() {
        let history = person.history();
        for (index, record) in history.iter().enumerate() {
            assert_eq!(record.cycle as usize, index);
            assert_eq!(record.location, person.locations().first().copied());
        }
        for pair in history.windows(2) {
            assert!(
                pair[0].health.can_transition_to(pair[1].health),
                "{} went from {} to {}",
                person.id(),
                pair[0].health,
                pair[1].health
            );
        }
        let last = person.current_record();
        if country.is_live(person.id()) {
            assert_eq!(last.cycle, final_cycle);
        } else {
            // The record of the death cycle is the last one.
            assert_eq!(last.health, HealthStatus::Dead);
            assert!(history[..history.len() - 1]
                .iter()
                .all(|record| record.health != HealthStatus::Dead));
        }
    }
}

#[test]
fn every_record_agrees_with_its_tally() {
    let mut country = generated(43, 4096);
    country.run().unwrap();
    for tally in country.tallies() {
        let mut counts = [0usize; 4];
        for person in country.persons() {
            let status = person
                .history()
                .get(tally.cycle as usize)
                .map_or(HealthStatus::Dead, |record| record.health);
            counts[status as usize] += 1;
        }
        let expected = HealthStatus::ALL.map(|status| tally.count(status));
        assert_eq!(counts, expected, "cycle {}", tally.cycle);
    }
}

#[test]
fn tallies_conserve_the_population() {
    let mut country = generated(29, 4096);
    let total = country.persons().len();
    country.run().unwrap();
    for (index, tally) in country.tallies().iter().enumerate() {
        assert_eq!(tally.cycle as usize, index);
        assert_eq!(tally.total(), total);
    }
    for pair in country.tallies().windows(2) {
        assert!(pair[1].dead >= pair[0].dead);
        assert!(pair[1].recovered + pair[1].dead >= pair[0].recovered + pair[0].dead);
        assert!(pair[1].healthy <= pair[0].healthy);
    }
    let last = country.tallies().last().unwrap();
    assert!(last.infected == 0 || last.cycle == country.parameters().max_cycles);
}

#[test]
fn same_seed_same_run() {
    let mut first = generated(31, 4096);
    let mut second = generated(31, 4096);
    first.run().unwrap();
    second.run().unwrap();
    assert_eq!(first.tallies(), second.tallies());
    assert_eq!(first.morgue(), second.morgue());
}

#[test]
fn batch_size_does_not_change_the_run() {
    let mut small = generated(37, 1);
    let mut large = generated(37, 4096);
    small.run().unwrap();
    large.run().unwrap();
    assert_eq!(small.membership(), large.membership());
    assert_eq!(small.tallies(), large.tallies());
}

#[test]
fn tallies_can_be_written() {
    let mut country = generated(41, 4096);
    country.run().unwrap();
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("tallies.csv");
    write_tally_report(&path, country.tallies()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), country.tallies().len());
}

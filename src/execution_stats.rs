// Loss of precision is allowable in this module's use cases.
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use humantime::format_duration;
use log::info;
use serde_derive::Serialize;

use crate::clock::Cycle;

/// Throughput of a completed run. If no cycles ran, the rates are zero, as they are
/// meaningless.
#[derive(Clone, Debug, Serialize)]
pub struct RunStatistics {
    pub cycles: Cycle,
    pub wall_time: Duration,
    pub cycles_per_second: f64,
    /// Live persons processed per second, summed over cycles.
    pub person_cycles_per_second: f64,
}

pub(crate) struct RunTimer {
    /// Run start time, used to compute elapsed wall time
    start_time: Instant,
    /// Sum of the live population size at the start of each cycle
    person_cycles: u64,
}

impl RunTimer {
    pub(crate) fn new() -> RunTimer {
        RunTimer {
            start_time: Instant::now(),
            person_cycles: 0,
        }
    }

    pub(crate) fn record_cycle(&mut self, live_population: usize) {
        self.person_cycles += live_population as u64;
    }

    pub(crate) fn finish(&self, cycles: Cycle) -> RunStatistics {
        let wall_time = self.start_time.elapsed();
        let seconds = wall_time.as_secs_f64();
        let (cycles_per_second, person_cycles_per_second) = if cycles > 0 && seconds > 0.0 {
            (
                f64::from(cycles) / seconds,
                self.person_cycles as f64 / seconds,
            )
        } else {
            (0.0, 0.0)
        };
        RunStatistics {
            cycles,
            wall_time,
            cycles_per_second,
            person_cycles_per_second,
        }
    }
}

/// Logs the run statistics at `info`.
pub fn log_run_statistics(statistics: &RunStatistics) {
    info!("cycles run: {}", statistics.cycles);
    // Truncate to whole milliseconds so `humantime` doesn't print down to the nanosecond.
    let wall_time = Duration::from_millis(statistics.wall_time.as_millis() as u64);
    info!("wall time: {}", format_duration(wall_time));
    info!("cycles per second: {:.1}", statistics.cycles_per_second);
    info!(
        "persons per second: {:.1}",
        statistics.person_cycles_per_second
    );
}

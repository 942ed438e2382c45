use serde_derive::Serialize;

/// A discrete simulation time step.
pub type Cycle = u32;

/// The global ordering token of a run. Every component compares its own cycle
/// against this one before mutating state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimulationClock {
    cycle: Cycle,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Cycle {
        self.cycle
    }

    /// Moves the clock to the next cycle and returns it.
    pub fn advance(&mut self) -> Cycle {
        self.cycle += 1;
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_advances_by_one() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.current(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.current(), 2);
    }
}

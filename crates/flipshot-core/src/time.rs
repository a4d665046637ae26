/// Accumulates variable frame time into whole fixed physics ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedClock {
    step: f32,
    max_frame: f32,
    accumulator: f32,
    ticks: u64,
}

impl FixedClock {
    /// `step` is the fixed tick length; frame deltas are clamped to `max_frame`
    /// so a long stall cannot queue an unbounded number of ticks.
    pub fn new(step: f32, max_frame: f32) -> Self {
        Self {
            step: step.max(f32::EPSILON),
            max_frame: max_frame.max(step),
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Add a frame delta and return how many fixed ticks are now due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, self.max_frame);
        let mut due = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            due += 1;
        }
        self.ticks += u64::from(due);
        due
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Total ticks produced since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

//! Output timing
//!
//! Counts chip output samples and engine ticks since the last reset.

/// Sample and tick counter of one dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounter {
    samples: u64,
    ticks: u64,
}

impl CycleCounter {
    /// Create a zeroed counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one engine tick
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    /// Count `n` generated samples
    pub fn advance(&mut self, n: u64) {
        self.samples += n;
    }

    /// Samples generated since reset
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Ticks processed since reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Playback time at `rate` Hz
    pub fn elapsed_secs(&self, rate: u32) -> f64 {
        if rate == 0 {
            return 0.0;
        }
        self.samples as f64 / rate as f64
    }

    /// Zero both counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_counter() {
        let mut counter = CycleCounter::new();
        assert_eq!(counter.samples(), 0);

        counter.advance(96_000);
        counter.tick();
        assert_eq!(counter.samples(), 96_000);
        assert_eq!(counter.ticks(), 1);
        approx::assert_relative_eq!(counter.elapsed_secs(192_000), 0.5);

        counter.reset();
        assert_eq!(counter, CycleCounter::new());
    }
}

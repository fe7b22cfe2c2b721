//! Test RNG — deterministic `DeterministicRng` implementations for tests.

use skirmish_core::rng::DeterministicRng;

/// An RNG whose `uniform` always returns the same value. `0.0` makes every
/// chance roll succeed; `0.999` makes every roll with chance below that fail.
/// Raw `next_u64` values come from a counter so ids stay distinct.
#[derive(Debug)]
pub struct FixedRng {
    value: f64,
    counter: u64,
}

impl FixedRng {
    /// Create an RNG that always rolls `value`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value, counter: 0 }
    }

    /// Every roll succeeds against any positive chance.
    #[must_use]
    pub fn always() -> Self {
        Self::new(0.0)
    }

    /// Every roll fails against any chance below one.
    #[must_use]
    pub fn never() -> Self {
        Self::new(0.999_999)
    }
}

impl DeterministicRng for FixedRng {
    fn next_u64(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn uniform(&mut self) -> f64 {
        self.value
    }
}

/// An RNG that returns `uniform` values from a predetermined sequence.
/// Panics if the sequence is exhausted. Used in tests that need specific,
/// repeatable roll outcomes (e.g., evade-then-fail-dodge).
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<f64>,
    index: usize,
    counter: u64,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given roll values.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            index: 0,
            counter: 0,
        }
    }

    /// Number of rolls consumed so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u64(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn uniform(&mut self) -> f64 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }
}

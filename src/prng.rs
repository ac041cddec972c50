//! PCG32 pseudorandom number generator (PCG-XSH-RR).
//!
//! Every scenario owns one generator seeded from its scenario seed, so a
//! scenario's content depends only on the seed and the build parameters,
//! never on which worker thread ran it.

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;

#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    pub fn new(seed: u64, seq: u64) -> Self {
        let inc = (seq << 1) | 1;
        let mut rng = Pcg32 { state: 0, inc };
        rng.advance();
        rng.state = rng.state.wrapping_add(seed);
        rng.advance();
        rng
    }

    /// Generator for one scenario. Stream 0 is reserved for scenario builds.
    pub fn for_scenario(seed: u64) -> Self {
        Self::new(seed, 0)
    }

    fn advance(&mut self) {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(self.inc);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.advance();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        (xorshifted >> rot) | (xorshifted << (rot.wrapping_neg() & 31))
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform integer in `[0, bound)` without modulo bias.
    ///
    /// Draws are rejected below `2^32 mod bound`, so the number of values
    /// consumed varies; callers rely only on it being a pure function of the
    /// generator state. `bound` must be non-zero.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "next_below called with zero bound");
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u32();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.next_below(items.len() as u32) as usize;
        items.get(idx)
    }
}

/// Small deterministic PRNG (xorshift64*) used to break exact positional ties.
#[derive(Debug, Clone)]
pub(crate) struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D_u64)
    }

    /// Uniform sample in `[-1, 1)` with 53 bits of precision.
    pub(crate) fn next_f64_signed(&mut self) -> f64 {
        let u = self.next_u64() >> 11;
        let v = (u as f64) / ((1u64 << 53) as f64);
        (v * 2.0) - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::XorShift64Star;

    #[test]
    fn zero_seed_is_not_a_fixed_point() {
        let mut rng = XorShift64Star::new(0);
        let a = rng.next_u64();
        let b = rng.next_u64();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn signed_samples_stay_in_range() {
        let mut rng = XorShift64Star::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64_signed();
            assert!((-1.0..1.0).contains(&v), "out of range: {v}");
        }
    }
}

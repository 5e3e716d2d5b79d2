use rand::{Rng as _, SeedableRng};
use rand_pcg::Pcg32;

/// Seeded generator shared by maze generation and the simulation so a game is
/// fully determined by its seed.
#[derive(Clone, Debug)]
pub struct Rng {
    inner: Pcg32,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Inclusive on both ends; returns `min` for an empty range.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.int(-5, 5), b.int(-5, 5));
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_in_inclusive_range() {
        let mut rng = Rng::new(7);
        for _ in 0..1_000 {
            let value = rng.int(1, 3);
            assert!((1..=3).contains(&value));
        }
        assert_eq!(rng.int(4, 4), 4);
        assert_eq!(rng.int(9, 2), 9);
    }

    #[test]
    fn pick_index_handles_tiny_lengths() {
        let mut rng = Rng::new(3);
        assert_eq!(rng.pick_index(0), 0);
        assert_eq!(rng.pick_index(1), 0);
        for _ in 0..200 {
            assert!(rng.pick_index(4) < 4);
        }
    }

    #[test]
    fn bool_respects_extremes() {
        let mut rng = Rng::new(11);
        for _ in 0..200 {
            assert!(!rng.bool(0.0));
            assert!(rng.bool(1.0));
        }
    }
}

//! Source of the optional canned remark appended to every insight set.
//!
//! Production code draws from the thread RNG; tests pass [`NoFiller`],
//! [`FixedFiller`] or a seeded [`RandomFiller`] so output is reproducible.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Decides whether a canned remark is appended, and which one.
pub trait FillerSource {
    /// Index into a list of `choices` remarks, or `None` for no remark.
    fn pick(&mut self, choices: usize) -> Option<usize>;
}

/// Never appends a remark.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFiller;

impl FillerSource for NoFiller {
    fn pick(&mut self, _choices: usize) -> Option<usize> {
        None
    }
}

/// Always appends the remark at the given index (wrapped into range).
#[derive(Debug, Clone, Copy)]
pub struct FixedFiller(pub usize);

impl FillerSource for FixedFiller {
    fn pick(&mut self, choices: usize) -> Option<usize> {
        (choices > 0).then(|| self.0 % choices)
    }
}

/// Coin flip, then a uniform choice.
#[derive(Debug)]
pub struct RandomFiller<R> {
    rng: R,
}

impl RandomFiller<ThreadRng> {
    pub fn from_thread_rng() -> Self {
        Self { rng: rand::rng() }
    }
}

impl RandomFiller<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Thread-RNG filler when `enabled`, otherwise none.
pub fn from_setting(enabled: bool) -> Box<dyn FillerSource> {
    if enabled {
        Box::new(RandomFiller::from_thread_rng())
    } else {
        Box::new(NoFiller)
    }
}

impl<R: Rng> FillerSource for RandomFiller<R> {
    fn pick(&mut self, choices: usize) -> Option<usize> {
        if choices == 0 || !self.rng.random_bool(0.5) {
            return None;
        }
        Some(self.rng.random_range(0..choices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_filler_is_reproducible() {
        let mut a = RandomFiller::seeded(7);
        let mut b = RandomFiller::seeded(7);
        let left: Vec<_> = (0..32).map(|_| a.pick(5)).collect();
        let right: Vec<_> = (0..32).map(|_| b.pick(5)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn random_filler_stays_in_range_and_sometimes_skips() {
        let mut filler = RandomFiller::seeded(42);
        let picks: Vec<_> = (0..200).map(|_| filler.pick(5)).collect();
        assert!(picks.iter().flatten().all(|&i| i < 5));
        assert!(picks.iter().any(Option::is_none));
        assert!(picks.iter().any(Option::is_some));
    }

    #[test]
    fn disabled_setting_never_picks() {
        let mut filler = from_setting(false);
        assert!((0..20).all(|_| filler.pick(5).is_none()));
    }

    #[test]
    fn zero_choices_never_picks() {
        assert_eq!(RandomFiller::seeded(1).pick(0), None);
        assert_eq!(FixedFiller(3).pick(0), None);
        assert_eq!(FixedFiller(7).pick(5), Some(2));
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Same base, same sequence.
pub fn derive_seeds(base: i64, count: usize) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(base as u64);
    (0..count).map(|_| next_seed(&mut rng)).collect()
}

fn next_seed<R: Rng>(rng: &mut R) -> i64 {
    rng.gen_range(0..=i64::MAX)
}

pub struct SeedSource {
    rng: Mutex<StdRng>,
}

impl SeedSource {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub(crate) fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn random_seed(&self) -> i64 {
        // Generator state is valid even if a holder panicked
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        next_seed(&mut *rng)
    }

    pub fn random_seeds(&self, count: usize) -> Vec<i64> {
        (0..count).map(|_| self.random_seed()).collect()
    }

    // Zero counts as unset
    pub fn seeds_for(&self, base: Option<i64>, count: usize) -> Vec<i64> {
        match base {
            Some(base) if base != 0 => derive_seeds(base, count),
            _ => self.random_seeds(count),
        }
    }
}

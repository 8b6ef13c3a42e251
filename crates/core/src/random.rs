//! Injected randomness for greetings and appointment ids

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of random choices.
///
/// The engine and booking service take this as a trait object so tests can
/// swap in a seeded generator.
pub trait Randomness: Send + Sync {
    /// Uniform index in `0..len`; `len` must be non-zero
    fn choose_index(&self, len: usize) -> usize;

    /// Uniform number in `1000..=9999`
    fn four_digits(&self) -> u16;
}

/// Thread-local OS-seeded generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn choose_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn four_digits(&self) -> u16 {
        rand::thread_rng().gen_range(1000..=9999)
    }
}

/// Deterministic generator for tests and reproducible runs
#[derive(Debug)]
pub struct SeededRandomness {
    rng: Mutex<StdRng>,
}

impl SeededRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}

impl Randomness for SeededRandomness {
    fn choose_index(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.gen_range(0..len))
    }

    fn four_digits(&self) -> u16 {
        self.with_rng(|rng| rng.gen_range(1000..=9999))
    }
}

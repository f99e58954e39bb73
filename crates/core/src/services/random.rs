//! Random source for tie-breaks and appointments.
//!
//! Advancers never call `rand` directly. They draw through a
//! [`RandomSource`] so a deployment can pin a seed and tests can script
//! the exact sequence of picks.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Uniform index generator.
pub trait RandomSource: Send + Sync {
    /// Return an index in `0..len`. Returns 0 when `len` is 0 or 1.
    fn index(&self, len: usize) -> usize;

    /// A uniform permutation of `0..len`.
    ///
    /// The default is a Fisher-Yates pass over [`RandomSource::index`];
    /// sources backed by a real RNG hand it to `SliceRandom` instead.
    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        for i in (1..len).rev() {
            let j = self.index(i + 1);
            order.swap(i, j);
        }
        order
    }
}

/// Shared random source handle.
pub type RandomService = Arc<dyn RandomSource>;

/// Thread-local OS-seeded RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }

    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rand::thread_rng());
        order
    }
}

/// Deterministic RNG seeded once at startup.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a seeded source.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        // A panic while holding the lock cannot leave the RNG in a bad state
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..len)
    }

    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        order.shuffle(&mut *rng);
        order
    }
}

/// Replays a fixed list of picks, cycling when exhausted.
///
/// Each scripted value is reduced modulo `len`.
#[cfg(test)]
#[derive(Debug)]
pub struct ScriptedRandom {
    picks: Vec<usize>,
    cursor: AtomicUsize,
}

#[cfg(test)]
impl ScriptedRandom {
    /// Create a source that returns `picks` in order.
    #[must_use]
    pub fn new(picks: Vec<usize>) -> Self {
        Self {
            picks,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn index(&self, len: usize) -> usize {
        if len <= 1 || self.picks.is_empty() {
            return 0;
        }
        let at = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.picks[at % self.picks.len()] % len
    }
}

/// Build the source a deployment asked for.
#[must_use]
pub fn from_seed(seed: Option<u64>) -> RandomService {
    match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

/// Reorder `items` by one [`RandomSource::permutation`].
pub fn shuffle<T>(random: &dyn RandomSource, items: &mut Vec<T>) {
    let order = random.permutation(items.len());
    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    items.extend(order.into_iter().filter_map(|i| slots.get_mut(i).and_then(Option::take)));
}

/// Pick one element uniformly, or `None` from an empty slice.
pub fn pick<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(random.index(items.len()))
}

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::domain::ApplicationNumber;
use super::repository::{ApplicationStore, RepositoryError};

/// Draws application numbers from the positive 63-bit range and skips any already in use.
///
/// One generator is shared by all callers. The result is only a candidate: the store
/// checks uniqueness again when the publishing write commits.
pub struct NumberAllocator {
    rng: Mutex<StdRng>,
}

impl NumberAllocator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn candidate(&self) -> ApplicationNumber {
        ApplicationNumber(self.rng.lock().gen_range(1..=i64::MAX))
    }

    /// Return a number no application in `store` currently holds.
    ///
    /// This loops until a free number turns up. With 2^63 values and realistic
    /// populations a second draw is already unlikely, but a nearly exhausted space
    /// would make the loop spin.
    pub fn allocate<S>(&self, store: &S) -> Result<ApplicationNumber, RepositoryError>
    where
        S: ApplicationStore + ?Sized,
    {
        loop {
            let candidate = self.candidate();
            match store.find_by_number(candidate)? {
                None => return Ok(candidate),
                Some(owner) => {
                    debug!(%candidate, owner = %owner.id, "application number collision, redrawing");
                }
            }
        }
    }
}

impl Default for NumberAllocator {
    fn default() -> Self {
        Self::new()
    }
}

//! Rayon worker pool for batch simulation.

use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use skirmish_core::error::DomainError;

/// How many threads a batch runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPool {
    /// Worker threads; zero uses the global Rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    /// Uses exactly `n` worker threads.
    #[must_use]
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Runs `f` on this pool.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a dedicated pool cannot be built.
    pub fn install<F, R>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(f());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| DomainError::Validation(format!("worker pool: {e}")))?;
        Ok(pool.install(f))
    }
}

//! Chaotic store wrapper for fault injection testing
//!
//! Wraps another store and randomly fails operations, optionally after an
//! injected delay. Used by chaos and timeout tests to check that the
//! receiver never mistakes a failing store for a consumed drop.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use super::{AtomicTake, DropStore, SealedDrop, StoreError, StoredDrop};
use crate::drop_id::DropId;

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails each operation with the
/// configured probability. Failures happen before delegation, so a failed
/// operation never reaches the inner store. Clones share RNG state and the
/// operation counter.
#[derive(Clone)]
pub struct ChaoticStore<S: DropStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// Delay applied before every operation
    latency: Option<Duration>,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<AtomicUsize>,
}

/// Simple deterministic RNG for chaos injection
///
/// Linear congruential generator, so chaos runs are reproducible from a
/// seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: DropStore> ChaoticStore<S> {
    /// Create a new chaotic wrapper with the default seed
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            latency: None,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every operation by `latency` before it runs.
    ///
    /// Combined with a short store timeout this simulates an unresponsive
    /// backend.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store operations attempted, including failed ones.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    async fn inject(&self, operation: &'static str) -> Result<(), StoreError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.should_fail()? {
            return Err(StoreError::Io(format!("chaotic failure injection ({operation})")));
        }

        Ok(())
    }

    fn should_fail(&self) -> Result<bool, StoreError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| StoreError::Unavailable("chaotic rng mutex poisoned".to_string()))?;
        Ok(rng.should_fail(self.failure_rate))
    }
}

impl<S: DropStore> DropStore for ChaoticStore<S> {
    async fn insert(&self, record: &SealedDrop) -> Result<DropId, StoreError> {
        self.inject("insert").await?;
        self.inner.insert(record).await
    }

    async fn fetch(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        self.inject("fetch").await?;
        self.inner.fetch(id).await
    }

    async fn delete(&self, id: &DropId) -> Result<(), StoreError> {
        self.inject("delete").await?;
        self.inner.delete(id).await
    }
}

impl<S: AtomicTake> AtomicTake for ChaoticStore<S> {
    async fn take(&self, id: &DropId) -> Result<Option<StoredDrop>, StoreError> {
        self.inject("take").await?;
        self.inner.take(id).await
    }
}

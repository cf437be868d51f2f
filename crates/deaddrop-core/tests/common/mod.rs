//! Shared test environment.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use deaddrop_core::{DeadDrop, DropConfig, DropStore, Environment};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Seeded RNG and a settable clock.
#[derive(Clone)]
pub struct TestEnv {
    rng: Arc<Mutex<StdRng>>,
    clock: Arc<AtomicU64>,
}

impl TestEnv {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            clock: Arc::new(AtomicU64::new(1_700_000_000)),
        }
    }

    pub fn set_clock(&self, secs: u64) {
        self.clock.store(secs, Ordering::SeqCst);
    }
}

impl Environment for TestEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap().fill_bytes(buffer);
    }

    fn wall_clock_secs(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }
}

pub fn dead_drop<S: DropStore>(store: S) -> DeadDrop<TestEnv, S> {
    DeadDrop::new(TestEnv::new(42), store, DropConfig::default())
}

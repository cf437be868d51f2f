//! Environment abstraction for deterministic testing.
//!
//! Decouples drop logic from system resources (wall clock, randomness).
//! Enables deterministic tests with seeded or fixed bytes and production use
//! with the OS RNG.

/// Abstract environment providing randomness and wall-clock time.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `random_bytes()` never falls back to a weaker source; if the secure
///   source is unavailable the implementation aborts instead
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// Keys and nonces are drawn from here, so every call in production must
    /// produce fresh, unpredictable output.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Seconds since the Unix epoch.
    ///
    /// Used to stamp `created_at` on sealed drops. Not used for any
    /// protocol decision on the receiver side.
    fn wall_clock_secs(&self) -> u64;
}

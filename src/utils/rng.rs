//! Deterministic seeding helpers.
//!
//! Every environment owns one `RngStream` (ChaCha8). Seeded streams are
//! reproducible across platforms; unseeded ones draw from OS entropy.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Type alias for the default RNG stream used across the crate.
pub type RngStream = ChaCha8Rng;

/// Create a new RNG stream from a root seed.
pub fn rng_from_seed(seed: u64) -> RngStream {
    RngStream::seed_from_u64(seed)
}

/// Create a stream from an optional seed, falling back to OS entropy.
pub fn rng_from_optional_seed(seed: Option<u64>) -> RngStream {
    match seed {
        Some(s) => rng_from_seed(s),
        None => RngStream::from_entropy(),
    }
}

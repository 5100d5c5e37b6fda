//! Local random streams.
//!
//! These only drive client-side sampling (random actions for demos and smoke
//! tests). The simulator's own randomness is seeded on the server.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Default RNG stream used across the crate.
pub type RngStream = ChaCha8Rng;

/// Reproducible stream from a fixed seed, or an OS-seeded one for `None`.
pub fn rng_from_seed(seed: Option<u64>) -> RngStream {
    match seed {
        Some(s) => RngStream::seed_from_u64(s),
        None => RngStream::from_entropy(),
    }
}

#[macro_use]
mod helpers;
pub mod reed_solomon;
pub mod secp256k1;
pub mod vss;

/// Upper bound on the size of a point and scalar in bytes, which are useful
/// for estimating size of serialized data. We have tests that (indirectly)
/// check that these are correct.
pub const MAX_POINT_SIZE: usize = 33;
pub const MAX_SCALAR_SIZE: usize = 32;

// Ideally, we want to use a concrete implementation (like ChaCha20) instead of StdRng
// to prevent it from potentially changing from under us
pub type Rng = rand::rngs::StdRng;

//! Multi-party computation building blocks for threshold ECDSA
pub use crypto::{
	reed_solomon,
	secp256k1::{Point, Scalar},
	vss, Rng, MAX_POINT_SIZE, MAX_SCALAR_SIZE,
};

pub use protocols::{brng, opener, rkpg, rng, table, Parameters};

/// Provides cryptographic primitives used by the protocol state machines
mod crypto;
/// Per-party protocol state machines
pub mod protocols;
/// Byte-exact message encoding for everything that crosses the wire
pub mod wire;
